//! proxy-tools - release and operations CLI for the proxy.
//!
//! Usage:
//!   proxy-tools release                 Tag and build the docker image
//!   proxy-tools deploy [VERSION]        Roll a version out node by node
//!   proxy-tools install-scripts         Print one-time node setup commands
//!   proxy-tools setup-nodes             Copy deploy script, docker login
//!   proxy-tools smoke [BASE_URL]        Smoke test a running proxy

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;
mod config;
mod domain;
mod executor;
mod services;

use cli::{Cli, Commands};
use config::Config;
use services::output::print_error;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_env("PROXY_TOOLS_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout is reserved for command output and `--json` documents.
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(env_filter)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    match &cli.command {
        Commands::Release { .. } | Commands::Run { .. } => {
            commands::handle_release_commands(cli, &config)
        }
        _ => commands::handle_ops_commands(cli, &config),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    if let Err(err) = run(&cli) {
        tracing::debug!(error = ?err, "command failed");
        print_error(cli.json, &err);
        std::process::exit(1);
    }
}
