use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// cilpatch - publicize and bootstrap-patch compact managed module images
#[derive(Debug, Parser)]
#[command(name = "cilpatch", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Widen every non-public type, field, method, and property accessor.
    Publicize {
        /// Path to the module image.
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Output path; defaults to the input with a `_publicized` suffix.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Apply, inspect, or reverse the bootstrap patch.
    Patch {
        /// Path to the module image.
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Output path; defaults to replacing the input in place.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Patch mode: patch, forcepatch, repatch, unpatch, or info.
        #[arg(short, long, default_value = "patch")]
        mode: String,
    },
}
