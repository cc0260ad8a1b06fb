// src/cli.rs
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "scribe", version, about = "Fill in structured data from a schema document")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Open the interactive form and print the result as JSON (`{}` on cancel)
    Run {
        /// Schema document (JSON)
        schema: PathBuf,
        /// Record to start from instead of the document's root
        #[arg(long)]
        root: Option<String>,
        /// Dialog title
        #[arg(long)]
        title: Option<String>,
    },
    /// Build the form without a terminal and print the untouched result
    Check {
        schema: PathBuf,
        #[arg(long)]
        root: Option<String>,
    },
}
