//! CLI runner - executes commands

use crate::cli::commands::{parse_stream_list, Cli, Commands, OutputFormat};
use crate::config::SourceConfig;
use crate::connector::{BrellaSource, Message, Source};
use crate::error::{Error, Result, ResultExt};
use crate::state::StateManager;
use crate::streams;
use crate::types::LogLevel;
use futures::StreamExt;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// CLI runner
pub struct Runner {
    cli: Cli,
    source: BrellaSource,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            source: BrellaSource::new(),
        }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Spec => self.spec(),
            Commands::Check => self.check().await,
            Commands::Discover => self.discover().await,
            Commands::Read { streams } => self.read(streams.as_deref()).await,
        }
    }

    /// Load configuration
    fn load_config(&self) -> Result<SourceConfig> {
        // Inline config takes precedence
        if let Some(json_str) = &self.cli.config_json {
            return SourceConfig::from_json(json_str);
        }

        if let Some(path) = &self.cli.config {
            return SourceConfig::from_file(path);
        }

        Err(Error::config(
            "Configuration not specified (use --config or --config-json)",
        ))
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Show spec
    fn spec(&self) -> Result<()> {
        self.output_message(&json!({
            "type": "SPEC",
            "spec": self.source.spec()
        }));
        Ok(())
    }

    /// Check connection
    async fn check(&self) -> Result<()> {
        let config = self.load_config()?;

        self.output_message(&Message::info("Checking connection to Brella Integration API").to_json());

        let result = self.source.check(&config).await?;
        let status = if result.success {
            json!({
                "status": "SUCCEEDED",
                "message": "Configuration is valid"
            })
        } else {
            json!({
                "status": "FAILED",
                "message": format!(
                    "Connection failed: {}",
                    result.message.unwrap_or_default()
                )
            })
        };

        self.output_message(&json!({
            "type": "CONNECTION_STATUS",
            "connectionStatus": status
        }));
        Ok(())
    }

    /// Discover streams
    async fn discover(&self) -> Result<()> {
        let config = self.load_config()?;
        let catalog = self.source.discover(&config).await?;

        self.output_message(&json!({
            "type": "CATALOG",
            "catalog": catalog
        }));
        Ok(())
    }

    /// Read data
    async fn read(&self, streams: Option<&str>) -> Result<()> {
        let sync_start = Instant::now();
        let config = self.load_config()?;
        let state = self.load_state()?;
        let selection = parse_stream_list(streams);

        let snapshot = state.snapshot().await;
        let mut messages = self
            .source
            .read(&config, &selection, Some(&snapshot))
            .await?;

        let mut record_counts: HashMap<String, usize> = HashMap::new();
        let mut completed: HashSet<String> = HashSet::new();
        let mut errors: Vec<String> = Vec::new();

        while let Some(msg) = messages.next().await {
            match &msg {
                Message::Record { stream, .. } => {
                    *record_counts.entry(stream.clone()).or_default() += 1;
                }
                Message::State { stream, data } => {
                    if let Value::Object(stream_state) = data {
                        state.set_stream_state(stream, stream_state.clone()).await;
                    }
                    completed.insert(stream.clone());
                }
                Message::Log {
                    level: LogLevel::Error,
                    message,
                } => {
                    errors.push(message.clone());
                }
                Message::Log { .. } => {}
            }
            self.output_message(&msg.to_json());
        }

        let state_file_path = if let Some(path) = &self.cli.state {
            state
                .save_to_file(path)
                .await
                .with_context(|| format!("Failed to save state to {}", path.display()))?;
            Some(path.to_string_lossy().to_string())
        } else {
            None
        };

        // Selection was validated by the source; report in catalog order
        let stream_results: Vec<Value> = streams::catalog(&config)
            .iter()
            .map(|s| s.name().to_string())
            .filter(|name| selection.is_empty() || selection.contains(name))
            .map(|name| {
                json!({
                    "stream": name,
                    "status": if completed.contains(&name) { "SUCCESS" } else { "FAILED" },
                    "records_synced": record_counts.get(&name).copied().unwrap_or(0)
                })
            })
            .collect();

        let total_records: usize = record_counts.values().sum();
        let successful_streams = stream_results
            .iter()
            .filter(|r| r["status"] == "SUCCESS")
            .count();
        let failed_streams = stream_results.len() - successful_streams;
        let total_duration_ms = sync_start.elapsed().as_millis() as u64;

        self.output_message(&json!({
            "type": "SYNC_SUMMARY",
            "summary": {
                "status": if failed_streams == 0 { "SUCCEEDED" } else if successful_streams == 0 { "FAILED" } else { "PARTIAL" },
                "connector": crate::NAME,
                "total_records": total_records,
                "total_streams": stream_results.len(),
                "successful_streams": successful_streams,
                "failed_streams": failed_streams,
                "duration_ms": total_duration_ms,
                "state_file": state_file_path,
                "errors": errors,
                "streams": stream_results
            }
        }));

        Ok(())
    }

    /// Output a JSON message to stdout
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}
