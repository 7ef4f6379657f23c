use crate::config::DEFAULT_EXECUTOR_NAME;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "proxy-tools",
    version,
    about = "Release and operations tooling for the proxy"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        long,
        global = true,
        help = "Config file (default: ~/.config/proxy-tools/config.toml)"
    )]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Tag the release and build the docker image
    Release {
        #[arg(long, help = "Print the steps without running them")]
        dry_run: bool,
    },
    /// Run an ad-hoc executor made of the given steps
    Run {
        #[arg(long, default_value = DEFAULT_EXECUTOR_NAME)]
        name: String,
        #[arg(required = true, help = "Command lines, run in order")]
        steps: Vec<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Deploy a version to every node, one at a time
    Deploy {
        version: Option<String>,
        nodes_file: Option<PathBuf>,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long, help = "Healthcheck timeout in seconds")]
        timeout: Option<u64>,
        #[arg(long, help = "Seconds between healthcheck attempts")]
        interval: Option<u64>,
    },
    /// Print one-time setup commands for the nodes
    InstallScripts { nodes_file: Option<PathBuf> },
    /// Copy the deploy script to the nodes and log docker in
    SetupNodes { nodes_file: Option<PathBuf> },
    /// Smoke test a running proxy
    Smoke {
        base_url: Option<String>,
        #[arg(long)]
        api_key_file: Option<PathBuf>,
    },
}
