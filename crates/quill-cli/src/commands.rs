//! Subcommands for driving the evolution engine from a terminal.
//!
//! The CLI is an external driver: it loads documents from the flat-file
//! store, feeds them to the engine, polls the result channel, and saves
//! evolved documents back. The engine itself knows nothing about it.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

use quill_core::{apply_suggestion, DenylistValidator, EvolutionDirection};
use quill_engine::providers::GeminiClient;
use quill_engine::{
    DocumentStore, EngineEvent, EvolutionEngine, EvolutionEngineBuilder, FsDocumentStore,
    HistoryLog, JsonlHistoryLog,
};

/// How often the driver polls the engine's result channel.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "quill", version, about = "Evolve documents through an AI rewrite pipeline")]
pub struct Cli {
    /// Directory holding the document files
    #[arg(long, default_value = "documents")]
    pub store_dir: String,

    /// Path of the JSON-lines evolution history log
    #[arg(long, default_value = "evolution_history.jsonl")]
    pub history_file: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List stored document ids
    List,

    /// Print a document
    Show { id: String },

    /// Apply a suggestion you already have; no generation call is made
    Rewrite { id: String, suggestion: String },

    /// Evolve one document with the Gemini backend
    Evolve {
        id: String,

        /// Free-form direction for the rewrite, e.g. "more technical"
        #[arg(long, default_value = "")]
        direction: String,

        /// Style hints as key=value, e.g. --hint tone=friendly
        #[arg(long = "hint", value_parser = parse_hint)]
        hints: Vec<(String, String)>,
    },

    /// Evolve every stored document, one at a time
    EvolveAll {
        #[arg(long, default_value = "")]
        direction: String,

        #[arg(long = "hint", value_parser = parse_hint)]
        hints: Vec<(String, String)>,
    },

    /// Print the evolution history
    History {
        /// Show only the most recent N records
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn parse_hint(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

fn direction_from(comment: &str, hints: &[(String, String)]) -> EvolutionDirection {
    let mut direction = EvolutionDirection::from_comment(comment);
    for (key, value) in hints {
        direction = direction.with_hint(key, value);
    }
    direction
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let store = FsDocumentStore::new(&self.store_dir);

        match self.command {
            Commands::List => {
                for id in store.list()? {
                    println!("{id}");
                }
                Ok(())
            }

            Commands::Show { id } => {
                let document = store.load(&id)?;
                println!("{}", document.to_text());
                Ok(())
            }

            Commands::Rewrite { id, suggestion } => {
                let document = store.load(&id)?;
                let validator = DenylistValidator::default();
                let (evolved, record) = match apply_suggestion(&document, &suggestion, &validator)
                {
                    Ok(result) => result,
                    Err(reason) => bail!("suggestion rejected: {reason}"),
                };

                if let Err(e) = JsonlHistoryLog::new(&self.history_file).append(&record) {
                    tracing::warn!(error = %e, "rewrite applied but history append failed");
                }
                store.save(&evolved)?;
                report_evolution(&evolved.id, &record.unified_diff, record.changed_lines.len());
                Ok(())
            }

            Commands::Evolve {
                ref id,
                ref direction,
                ref hints,
            } => {
                let document = store.load(&id)?;
                let engine = self.build_engine()?;
                engine.configure(direction_from(&direction, &hints))?;
                engine.submit(document)?;

                loop {
                    match engine.drain() {
                        Some(EngineEvent::Evolved {
                            document,
                            record,
                            history_warning,
                        }) => {
                            if let Some(warning) = history_warning {
                                tracing::warn!(%warning, "history append failed");
                            }
                            store.save(&document)?;
                            report_evolution(
                                &document.id,
                                &record.unified_diff,
                                record.changed_lines.len(),
                            );
                            return Ok(());
                        }
                        Some(EngineEvent::Failed { document_id, error }) => {
                            bail!("evolution of {document_id} failed: {error}")
                        }
                        Some(EngineEvent::BatchComplete { .. }) => continue,
                        None => tokio::time::sleep(POLL_INTERVAL).await,
                    }
                }
            }

            Commands::EvolveAll { ref direction, ref hints } => {
                let mut documents = Vec::new();
                for id in store.list()? {
                    documents.push(store.load(&id)?);
                }
                if documents.is_empty() {
                    println!("no documents to evolve");
                    return Ok(());
                }

                let engine = self.build_engine()?;
                engine.configure(direction_from(&direction, &hints))?;
                engine.submit_batch(documents)?;

                let mut evolved = 0usize;
                let mut failed = 0usize;
                loop {
                    match engine.drain() {
                        Some(EngineEvent::Evolved {
                            document,
                            record,
                            history_warning,
                        }) => {
                            if let Some(warning) = history_warning {
                                tracing::warn!(%warning, "history append failed");
                            }
                            store.save(&document)?;
                            report_evolution(
                                &document.id,
                                &record.unified_diff,
                                record.changed_lines.len(),
                            );
                            evolved += 1;
                        }
                        Some(EngineEvent::Failed { document_id, error }) => {
                            tracing::error!(%document_id, error = %error, "document failed");
                            failed += 1;
                        }
                        Some(EngineEvent::BatchComplete { cancelled }) => {
                            println!(
                                "batch finished: {evolved} evolved, {failed} failed{}",
                                if cancelled { " (cancelled)" } else { "" }
                            );
                            return Ok(());
                        }
                        None => tokio::time::sleep(POLL_INTERVAL).await,
                    }
                }
            }

            Commands::History { limit } => {
                let records = JsonlHistoryLog::load(&self.history_file)?;
                let skip = limit.map_or(0, |n| records.len().saturating_sub(n));
                for record in &records[skip..] {
                    println!(
                        "{}  {}  lines {:?}  {}",
                        record.timestamp.to_rfc3339(),
                        record.document_id,
                        record.changed_line_numbers(),
                        record.suggestion
                    );
                }
                Ok(())
            }
        }
    }

    fn build_engine(&self) -> Result<EvolutionEngine> {
        let service = Arc::new(GeminiClient::from_env()?);
        let history = Arc::new(JsonlHistoryLog::new(&self.history_file));
        let engine = EvolutionEngineBuilder::new()
            .service(service)
            .history(history)
            .build()?;
        Ok(engine)
    }
}

fn report_evolution(id: &str, unified_diff: &[String], changed: usize) {
    if changed == 0 {
        println!("{id}: no title/paragraph pair found, document unchanged");
        return;
    }
    println!("{id}: {changed} line(s) changed");
    for line in unified_diff {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hint() {
        assert_eq!(
            parse_hint("tone=friendly"),
            Ok(("tone".to_string(), "friendly".to_string()))
        );
        assert_eq!(
            parse_hint("style=very=nested"),
            Ok(("style".to_string(), "very=nested".to_string()))
        );
        assert!(parse_hint("no-separator").is_err());
        assert!(parse_hint("=value").is_err());
    }

    #[test]
    fn test_direction_from_hints() {
        let direction = direction_from(
            "more technical",
            &[("tone".to_string(), "serious".to_string())],
        );
        assert_eq!(direction.comment, "more technical");
        assert_eq!(direction.hints.get("tone").map(String::as_str), Some("serious"));
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
