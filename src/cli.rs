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

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use farm_client::RecordId;

use crate::config::AppConfig;

/// Dashboard for geotagged farm image records.
#[derive(Debug, Parser)]
#[command(name = "farm-map", version, about)]
pub struct Cli {
    /// Override the API base URL from the config file
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Override the poll interval in milliseconds (0 disables polling)
    #[arg(long, global = true, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll for markers and re-render on every change until Ctrl-C
    Watch {
        /// Open the map in a browser after the first load
        #[arg(long)]
        open: bool,
    },
    /// Fetch markers once and print them
    List {
        /// Print markers as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show every detail of one marker
    Show {
        id: RecordId,
        /// Open the marker location in a browser
        #[arg(long)]
        open: bool,
    },
    /// Delete a record on the server
    Delete { id: RecordId },
    /// Upload a geotagged JPEG or PNG image
    Upload { path: PathBuf },
    /// Inspect or change the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the config file location
    Path,
    /// Print the effective configuration
    Show,
    /// Set the API base URL
    SetUrl { url: String },
    /// Set the poll interval in milliseconds (0 disables polling)
    SetPollInterval { ms: u64 },
    /// Set the map API key
    SetMapKey { key: String },
}

impl Cli {
    /// Copy of `stored` with command line overrides applied.
    #[must_use]
    pub fn effective_config(&self, stored: &AppConfig) -> AppConfig {
        let mut config = stored.clone();
        self.apply_overrides(&mut config);
        config
    }

    /// Apply command line overrides on top of the loaded config.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(url) = &self.api_url {
            config.api_base_url.clone_from(url);
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval_ms = Some(ms);
        }
    }
}
