//! CLI module - command line interface definitions and handlers for the
//! reverter binary. Mirrors the teacher's `Cli`/`Commands` shape but drives
//! the reverter's eight public operations directly rather than a disk-scan
//! pipeline.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Crash-safe checkpoint/rollback journal for configuration files.
#[derive(Parser, Debug)]
#[command(name = "reverter")]
#[command(author = "Ryan Cashmoney <tunclon@proton.me>")]
#[command(version)]
#[command(about = "Transactional checkpoint/rollback facility for configuration files", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Override the backup root directory.
    #[arg(long, global = true)]
    pub backup: Option<PathBuf>,

    /// Override the temporary checkpoint directory.
    #[arg(long, global = true)]
    pub temp: Option<PathBuf>,

    /// Override the in-progress permanent checkpoint directory.
    #[arg(long, global = true)]
    pub progress: Option<PathBuf>,

    /// Output format for machine parsing.
    #[arg(long, value_enum, global = true, default_value = "human")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capture files into the scratch checkpoint, discarded at run end.
    AddTemp(AddArgs),

    /// Capture files into the in-progress permanent checkpoint.
    Add(AddArgs),

    /// Register files the caller is about to create.
    RegisterNew(RegisterNewArgs),

    /// Promote the in-progress permanent checkpoint to a numbered one.
    Finalize(FinalizeArgs),

    /// Undo and remove the temporary checkpoint.
    RevertTemp,

    /// Roll back the N most-recent finalized checkpoints.
    Rollback(RollbackArgs),

    /// Clean up any checkpoint left in progress by a crashed run.
    Recover,

    /// List finalized checkpoints with their notes.
    View,

    /// Ask the operator about an enhancement (e.g. HTTPS redirect).
    AskEnhancement(AskEnhancementArgs),
}

#[derive(Debug, Clone, Parser)]
pub struct AddArgs {
    /// Absolute paths of existing files to capture.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Human-readable note appended to CHANGES_SINCE.
    #[arg(long, default_value = "")]
    pub note: String,
}

#[derive(Debug, Clone, Parser)]
pub struct RegisterNewArgs {
    /// Register in the temporary checkpoint instead of the in-progress one.
    #[arg(long)]
    pub temp: bool,

    /// Absolute paths the caller is about to create.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Parser)]
pub struct FinalizeArgs {
    /// Title recorded as the first line of CHANGES_SINCE.
    pub title: String,
}

#[derive(Debug, Clone, Parser)]
pub struct RollbackArgs {
    /// Number of finalized checkpoints to roll back.
    pub count: String,
}

#[derive(Debug, Clone, Parser)]
pub struct AskEnhancementArgs {
    /// Enhancement name (currently only "redirect").
    pub enhancement: String,

    /// Answer to give the prompt, for non-interactive use.
    #[arg(long)]
    pub assume_yes: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human readable (default)
    Human,
    /// JSON output
    Json,
}
