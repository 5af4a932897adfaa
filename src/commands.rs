use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use serde_json::{json, Value};

use crate::{matching::MatcherConfig, CardLearner};

const DATA_DIR_ENV: &str = "CARDLEARN_DATA_DIR";
const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser)]
#[command(name = "cardlearn")]
#[command(about = "Resolve OCR text from card scans and learn from the outcome", long_about = None)]
pub struct Cli {
    /// Directory holding the learning database and settings
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve OCR text to the most likely card name
    Resolve { text: String },
    /// List ranked fuzzy candidates for OCR text
    Suggest { text: String },
    /// Cache a card name after a successful lookup
    Cache {
        name: String,
        /// Card metadata as JSON
        #[arg(short, long)]
        meta: Option<String>,
    },
    /// Report whether a candidate was accepted
    #[command(group(ArgGroup::new("verdict").required(true).args(["accepted", "rejected"])))]
    Feedback {
        text: String,
        /// Name that was tried
        name: String,
        /// The candidate was used successfully
        #[arg(long)]
        accepted: bool,
        /// The candidate was wrong
        #[arg(long)]
        rejected: bool,
    },
    /// Store an explicit correction
    Correct { text: String, name: String },
    /// Record a manually typed lookup
    Manual {
        name: String,
        #[arg(long)]
        failed: bool,
    },
    /// Show learning statistics
    Stats,
    /// Remove every cached card (learned data is kept)
    ClearCache,
    /// Show or change matcher thresholds
    Config {
        #[arg(long)]
        fuzzy_threshold: Option<f64>,
        #[arg(long)]
        word_bonus: Option<f64>,
        #[arg(long)]
        high_confidence: Option<f64>,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}

fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

pub async fn dispatch(cli: Cli) -> Result<()> {
    let data_dir = resolve_data_dir(cli.data_dir);
    let mut learner = CardLearner::open(&data_dir)
        .await
        .with_context(|| format!("failed to open learning data in {}", data_dir.display()))?;

    match cli.command {
        Commands::Resolve { text } => {
            let resolution = learner.resolve(&text).await;
            match resolution.candidate() {
                Some(name) => println!(
                    "{name}\t{:.3}\t{}",
                    resolution.confidence(),
                    resolution.method().as_str()
                ),
                None => println!("no match"),
            }
        }
        Commands::Suggest { text } => {
            for candidate in learner.suggestions(&text).await {
                println!("{:.3}\t{}", candidate.score, candidate.name);
            }
        }
        Commands::Cache { name, meta } => {
            let metadata: Value = match meta {
                Some(raw) => serde_json::from_str(&raw).context("--meta is not valid JSON")?,
                None => json!({ "name": name }),
            };
            if learner.cache_card(&name, metadata).await? {
                println!("cached {name}");
            } else {
                println!("skipped {name}: empty name or metadata");
            }
        }
        Commands::Feedback {
            text,
            name,
            accepted,
            ..
        } => {
            let pattern = learner.record_outcome(&text, Some(&name), accepted).await?;
            if let Some(pattern) = pattern {
                println!(
                    "{} -> {} ({}/{}, {:.2})",
                    pattern.ocr_text,
                    pattern.resolved_name,
                    pattern.success_count,
                    pattern.total_count,
                    pattern.confidence
                );
            }
        }
        Commands::Correct { text, name } => {
            match learner.record_correction(&text, &name).await? {
                Some(correction) => {
                    println!("{} -> {}", correction.ocr_text, correction.resolved_name)
                }
                None => println!("nothing to correct"),
            }
        }
        Commands::Manual { name, failed } => {
            learner.record_manual_lookup(&name, !failed).await?;
        }
        Commands::Stats => {
            print!("{}", learner.export_report().await?);
        }
        Commands::ClearCache => {
            let removed = learner.clear_cache().await?;
            println!("removed {removed} cached cards");
        }
        Commands::Config {
            fuzzy_threshold,
            word_bonus,
            high_confidence,
        } => {
            let current = learner.config();
            let updated = MatcherConfig {
                fuzzy_threshold: fuzzy_threshold.unwrap_or(current.fuzzy_threshold),
                word_overlap_bonus: word_bonus.unwrap_or(current.word_overlap_bonus),
                high_confidence_threshold: high_confidence
                    .unwrap_or(current.high_confidence_threshold),
                ..current.clone()
            };
            if updated != current {
                learner.update_config(updated.clone())?;
            }
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_feedback_verdict() {
        let cli = Cli::try_parse_from(["cardlearn", "feedback", "Pikachv", "Pikachu", "--rejected"])
            .unwrap();
        match cli.command {
            Commands::Feedback {
                text,
                name,
                accepted,
                rejected,
            } => {
                assert_eq!(text, "Pikachv");
                assert_eq!(name, "Pikachu");
                assert!(!accepted);
                assert!(rejected);
            }
            _ => panic!("expected feedback command"),
        }
    }

    #[test]
    fn feedback_needs_exactly_one_verdict() {
        assert!(Cli::try_parse_from(["cardlearn", "feedback", "Pikachv", "Pikachu"]).is_err());
        assert!(Cli::try_parse_from([
            "cardlearn", "feedback", "Pikachv", "Pikachu", "--accepted", "--rejected",
        ])
        .is_err());
        assert!(
            Cli::try_parse_from(["cardlearn", "feedback", "Pikachv", "Pikachu", "--accepted"])
                .is_ok()
        );
    }

    #[test]
    fn data_dir_flag_wins() {
        let dir = resolve_data_dir(Some(PathBuf::from("/tmp/cards")));
        assert_eq!(dir, PathBuf::from("/tmp/cards"));
    }
}
