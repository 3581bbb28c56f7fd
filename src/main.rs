//! reverter - transactional checkpoint/rollback facility for configuration
//! files mutated by an automated certificate-provisioning agent.

use std::io::{self, Write as _};

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reverter::cli::{Cli, Commands, OutputFormat};
use reverter::{ask_enhancement, CheckpointSummary, Enhancement, EnhancementPrompt, Reverter, ReverterConfig};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(EnvFilter::from_default_env().add_directive("reverter=info".parse()?))
        .init();

    let cli = Cli::parse();
    let reverter = build_reverter(&cli);

    match &cli.command {
        Commands::AddTemp(args) => {
            reverter.add_to_temp_checkpoint(&args.paths, &args.note)?;
            println!("{} captured {} file(s) into temp checkpoint", "✓".green(), args.paths.len());
        }
        Commands::Add(args) => {
            reverter.add_to_checkpoint(&args.paths, &args.note)?;
            println!("{} captured {} file(s) into in-progress checkpoint", "✓".green(), args.paths.len());
        }
        Commands::RegisterNew(args) => {
            reverter.register_file_creation(args.temp, &args.paths)?;
            println!("{} registered {} file(s) for creation", "✓".green(), args.paths.len());
        }
        Commands::Finalize(args) => {
            reverter.finalize_checkpoint(&args.title)?;
            println!("{} finalized checkpoint: {}", "✓".green(), args.title);
        }
        Commands::RevertTemp => {
            reverter.revert_temporary_config()?;
            println!("{} temporary checkpoint reverted", "✓".green());
        }
        Commands::Rollback(args) => {
            reverter.rollback_checkpoints(args.count.as_str())?;
            println!("{} rolled back {} checkpoint(s)", "✓".green(), args.count);
        }
        Commands::Recover => {
            reverter.recovery_routine()?;
            println!("{} recovery routine complete", "✓".green());
        }
        Commands::View => {
            let summaries = reverter.view_config_changes()?;
            print_view(&summaries, cli.format)?;
        }
        Commands::AskEnhancement(args) => {
            let enhancement: Enhancement = args.enhancement.parse()?;
            let prompt = CliPrompt {
                assume_yes: args.assume_yes,
            };
            let accepted = ask_enhancement(enhancement, &prompt)?;
            println!(
                "{} {}",
                if accepted { "yes".green() } else { "no".yellow() },
                enhancement
            );
        }
    }

    Ok(())
}

fn build_reverter(cli: &Cli) -> Reverter {
    let mut config = ReverterConfig::load();
    if let Some(backup) = &cli.backup {
        config.backup = backup.clone();
    }
    if let Some(temp) = &cli.temp {
        config.temp = temp.clone();
    }
    if let Some(progress) = &cli.progress {
        config.progress = progress.clone();
    }
    Reverter::new(&config)
}

fn print_view(summaries: &[CheckpointSummary], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let as_json: Vec<_> = summaries
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "id": s.id,
                        "modified": humantime_like(s.modified),
                        "notes": s.notes,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&as_json)?);
        }
        OutputFormat::Human => {
            if summaries.is_empty() {
                println!("No finalized checkpoints.");
            }
            for summary in summaries {
                println!(
                    "{} {}  {}",
                    format!("#{:010}", summary.id).bright_cyan(),
                    humantime_like(summary.modified),
                    summary.notes.lines().next().unwrap_or("")
                );
            }
        }
    }
    Ok(())
}

fn humantime_like(time: std::time::SystemTime) -> String {
    let datetime: chrono::DateTime<chrono::Local> = time.into();
    datetime.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Terminal-backed [`EnhancementPrompt`]: answers immediately if
/// `--assume-yes` was given, otherwise reads a y/n line from stdin.
struct CliPrompt {
    assume_yes: bool,
}

impl EnhancementPrompt for CliPrompt {
    fn ask_redirect(&self) -> bool {
        if self.assume_yes {
            return true;
        }
        print!("Redirect all HTTP traffic to HTTPS? [y/N] ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        if io::stdin().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
    }
}
