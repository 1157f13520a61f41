// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod cli;
mod config;
mod map;
mod table;

use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use farm_client::status::user_message;
use farm_client::{
    FetchOutcome, HttpFarmApi, MarkerSync, Operation, Poller, SyncEvent, UploadFile,
};
use log::{debug, info, warn};
use tokio::sync::broadcast::error::RecvError;

use crate::cli::{Cli, Command, ConfigAction};
use crate::config::AppConfig;
use crate::map::MapLinks;

type AppResult<T = ()> = Result<T, Box<dyn Error>>;
type SharedSync = Arc<MarkerSync<HttpFarmApi>>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins over the verbosity flag.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();
}

fn run(cli: &Cli) -> AppResult {
    let stored = AppConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {e}");
        AppConfig::default()
    });
    let config = cli.effective_config(&stored);
    debug!("Effective config: {config:?}");

    if let Command::Config { action } = &cli.command {
        return run_config(action, stored, &config);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(dispatch(&cli.command, &config))
}

async fn dispatch(command: &Command, config: &AppConfig) -> AppResult {
    let api = Arc::new(HttpFarmApi::new(config.api_config())?);
    let sync = Arc::new(MarkerSync::new(api, config.sync_config()));

    match command {
        Command::Watch { open } => watch(&sync, config, *open).await,
        Command::List { json } => list(&sync, *json).await,
        Command::Show { id, open } => show(&sync, *id, *open).await,
        Command::Delete { id } => delete(&sync, *id).await,
        Command::Upload { path } => upload(&sync, path).await,
        Command::Config { action } => run_config(action, config.clone(), config),
    }
}

/// `show` prints the effective config; `set-*` edits and saves only the
/// stored file values.
fn run_config(action: &ConfigAction, mut config: AppConfig, effective: &AppConfig) -> AppResult {
    match action {
        ConfigAction::Path => {
            println!("{}", AppConfig::get_config_path()?.display());
            return Ok(());
        }
        ConfigAction::Show => {
            println!("{effective:#?}");
            return Ok(());
        }
        ConfigAction::SetUrl { url } => config.api_base_url.clone_from(url),
        ConfigAction::SetPollInterval { ms } => config.poll_interval_ms = Some(*ms),
        ConfigAction::SetMapKey { key } => config.map_api_key = Some(key.clone()),
    }
    config.save()?;
    info!("Saved config to {}", AppConfig::get_config_path()?.display());
    Ok(())
}

/// Fetch once, turning a failure into the message a user should see.
async fn fetch(sync: &SharedSync) -> AppResult {
    match sync.fetch_markers().await {
        Ok(FetchOutcome::Applied { count }) => {
            debug!("Fetched {count} markers");
            Ok(())
        }
        Ok(FetchOutcome::Superseded) => Ok(()),
        Err(e) => Err(user_message(Operation::Fetch, &e).into()),
    }
}

fn render(sync: &SharedSync) {
    let markers = sync.markers();
    print!("{}", table::render_markers(&markers));
    println!("{}", table::render_viewport(&sync.viewport()));
}

async fn list(sync: &SharedSync, json: bool) -> AppResult {
    fetch(sync).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&sync.markers())?);
    } else {
        render(sync);
    }
    Ok(())
}

async fn show(sync: &SharedSync, id: farm_client::RecordId, open: bool) -> AppResult {
    fetch(sync).await?;
    let Some(marker) = sync.select_marker(id) else {
        return Err(format!("No farmer record with id {id}").into());
    };

    print!("{}", table::render_detail(&marker));
    let url = MapLinks::marker_url(&marker);
    println!("  Map:          {url}");
    if open {
        open_browser(&url);
    }
    Ok(())
}

async fn delete(sync: &SharedSync, id: farm_client::RecordId) -> AppResult {
    if let Err(e) = fetch(sync).await {
        warn!("Could not load markers before delete: {e}");
    }
    sync.delete_record(id)
        .await
        .map_err(|e| user_message(Operation::Delete, &e))?;
    println!(
        "Deleted farmer record {id}. {} markers remain.",
        sync.marker_count()
    );
    Ok(())
}

async fn upload(sync: &SharedSync, path: &std::path::Path) -> AppResult {
    let file = UploadFile::from_path(path)
        .map_err(|e| format!("Cannot read {}: {e}", path.display()))?;
    let record = sync
        .upload_image(&file)
        .await
        .map_err(|e| user_message(Operation::Upload, &e))?;
    print!("{}", table::render_upload(&record));
    Ok(())
}

async fn watch(sync: &SharedSync, config: &AppConfig, open: bool) -> AppResult {
    let links = MapLinks::new(config.resolve_map_api_key());
    let interval = config.poll_interval();
    let mut events = sync.subscribe();
    let poller = Poller::spawn(Arc::clone(sync), interval);
    let mut opened = false;

    let base_url = &sync.api().config().base_url;
    match interval {
        Some(period) => info!("Polling {base_url} every {period:?}"),
        None => info!("Polling disabled, fetching {base_url} once"),
    }
    if open && !links.has_api_key() {
        info!("No map API key configured, opening the interactive map");
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Interrupted, stopping");
                break;
            }
            event = events.recv() => match event {
                Ok(SyncEvent::MarkersReplaced { .. }) => {
                    render(sync);
                    if open && !opened {
                        open_browser(&links.overview_url(&sync.viewport(), &sync.markers()));
                        opened = true;
                    }
                    if interval.is_none() {
                        break;
                    }
                }
                Ok(SyncEvent::FetchFailed(message)) => {
                    eprintln!("{message}");
                    if interval.is_none() {
                        break;
                    }
                }
                Ok(event) => debug!("Ignoring {event:?}"),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Missed {skipped} sync events, re-rendering");
                    render(sync);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    poller.cancel();
    Ok(())
}

fn open_browser(url: &str) {
    if let Err(e) = webbrowser::open(url) {
        warn!("Failed to open browser: {e}");
    }
}
