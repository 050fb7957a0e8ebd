//! Control Path Native CLI
//!
//! Copyright 2025 Release Workshop Ltd
//! Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
//! See the LICENSE file in the project root for details.

mod commands;
mod error;
mod generator;
mod ops;
mod repository;
mod utils;

#[cfg(test)]
mod test_helpers;

use clap::{CommandFactory, Parser, Subcommand};
use commands::{compile, completion, eval, init, pull, rewrite, serve, sync, validate, watch};
use tracing_subscriber::EnvFilter;

/// Binary name, used for completions
pub const BIN_NAME: &str = "controlpath-native";

/// Environment variable holding the log filter
const LOG_ENV: &str = "CONTROLPATH_LOG";

/// Control Path Native - Compile config functions into typed rule trees
#[derive(Parser)]
#[command(name = "controlpath-native")]
#[command(about = "Control Path Native - Compile config functions into typed rule trees", long_about = None)]
#[command(version = env!("CONTROLPATH_VERSION"))]
struct Cli {
    /// Log compile, sync and evaluation steps to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project with an example namespace
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
    /// Compile namespace sources and write them to the config repository
    Sync {
        /// Directory of namespace source files
        #[arg(long)]
        dir: Option<String>,
        /// Config repository root
        #[arg(long)]
        repo: Option<String>,
        /// Check that persisted configs regenerate to the same source
        #[arg(long)]
        verify: bool,
    },
    /// Compile all namespaces into a MessagePack bundle
    Compile {
        /// Directory of namespace source files
        #[arg(long)]
        dir: Option<String>,
        /// Output path for the bundle
        #[arg(long)]
        output: Option<String>,
    },
    /// Evaluate a persisted config against a context
    Eval {
        #[arg(long)]
        namespace: String,
        #[arg(long)]
        key: String,
        /// Context as a JSON object
        #[arg(long)]
        context: Option<String>,
        /// Config repository root
        #[arg(long)]
        repo: Option<String>,
    },
    /// Validate persisted config files
    Validate {
        /// Config repository root
        #[arg(long)]
        repo: Option<String>,
    },
    /// Regenerate namespace sources from the config repository
    Pull {
        /// Config repository root
        #[arg(long)]
        repo: Option<String>,
        /// Output directory (defaults to the source directory)
        #[arg(long)]
        out: Option<String>,
    },
    /// Rewrite a namespace file to read configs through the runtime client
    Rewrite {
        /// Namespace source file
        #[arg(long)]
        file: String,
        /// Namespace name (defaults to the file stem)
        #[arg(long)]
        namespace: Option<String>,
        /// Output path (prints to stdout when omitted)
        #[arg(long)]
        out: Option<String>,
    },
    /// Serve config evaluation over HTTP
    Serve {
        /// Config repository root
        #[arg(long)]
        repo: Option<String>,
        /// Port for web server (default: 8080)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Watch namespace sources and re-sync on change
    Watch {
        /// Directory of namespace source files
        #[arg(long)]
        dir: Option<String>,
        /// Config repository root
        #[arg(long)]
        repo: Option<String>,
        /// Check that persisted configs regenerate to the same source
        #[arg(long)]
        verify: bool,
    },
    /// Generate shell completion scripts
    Completion {
        /// Shell type (bash, zsh, fish)
        shell: String,
    },
}

/// Get the CLI command structure for completion generation
pub fn get_cli_command() -> clap::Command {
    Cli::command()
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match cli.command {
        Commands::Init { force } => init::run(&init::Options { force }),
        Commands::Sync { dir, repo, verify } => sync::run(&sync::Options { dir, repo, verify }),
        Commands::Compile { dir, output } => compile::run(&compile::Options { dir, output }),
        Commands::Eval {
            namespace,
            key,
            context,
            repo,
        } => eval::run(&eval::Options {
            namespace,
            key,
            context,
            repo,
        }),
        Commands::Validate { repo } => validate::run(&validate::Options { repo }),
        Commands::Pull { repo, out } => pull::run(&pull::Options { repo, out }),
        Commands::Rewrite {
            file,
            namespace,
            out,
        } => rewrite::run(&rewrite::Options {
            file,
            namespace,
            out,
        }),
        Commands::Serve { repo, port } => serve::run(&serve::Options { repo, port }),
        Commands::Watch { dir, repo, verify } => watch::run(&watch::Options { dir, repo, verify }),
        Commands::Completion { shell } => completion::run(&completion::Options { shell }),
    };

    std::process::exit(exit_code);
}
