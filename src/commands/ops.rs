use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::executor::SystemRunner;
use crate::services::deploy::{
    latest_tag, resolve_version, run_deploy, DeploySettings, HealthcheckPolicy,
};
use crate::services::nodes::load_nodes;
use crate::services::output::{print_one, print_out, progress};
use crate::services::setup::{current_username, install_instructions, setup_nodes, DockerCredentials};
use crate::services::smoke::{default_api_key_file, run_smoke, SmokeSettings};
use crate::services::storage::{audit, AuditAction};
use std::path::PathBuf;
use std::time::Duration;

fn nodes_path(explicit: &Option<PathBuf>, config: &Config) -> PathBuf {
    explicit
        .clone()
        .unwrap_or_else(|| config.deploy.nodes_file.clone())
}

pub fn handle_ops_commands(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Deploy {
            version,
            nodes_file,
            port,
            timeout,
            interval,
        } => {
            let mut out = progress(cli.json);
            let version = match version.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                Some(v) => v.to_string(),
                None => {
                    let stdin = std::io::stdin();
                    let mut input = stdin.lock();
                    resolve_version(None, latest_tag(), &mut input, &mut *out)?
                }
            };
            let nodes = load_nodes(&nodes_path(nodes_file, config))?;
            let settings = DeploySettings {
                port: port.unwrap_or(config.deploy.port),
                healthcheck_path: config.deploy.healthcheck_path.clone(),
                deploy_script: config.deploy.deploy_script.clone(),
                healthcheck: HealthcheckPolicy {
                    timeout: Duration::from_secs(timeout.unwrap_or(config.deploy.timeout_secs)),
                    interval: Duration::from_secs(
                        interval.unwrap_or(config.deploy.interval_secs),
                    ),
                },
            };

            let mut runner = SystemRunner::new(cli.json);
            let outcome = run_deploy(&nodes, &version, &settings, &mut runner, &mut *out);
            audit(
                AuditAction::Deploy,
                serde_json::json!({"version": version, "nodes": nodes, "ok": outcome.is_ok()}),
            );
            let report = outcome?;
            print_one(cli.json, report, |r| {
                format!(
                    "Proxy version {} deployed successfully. Total duration: {} seconds",
                    r.version, r.duration_secs
                )
            })?;
        }
        Commands::InstallScripts { nodes_file } => {
            let nodes = load_nodes(&nodes_path(nodes_file, config))?;
            let username = current_username();
            let plan = install_instructions(&nodes, &config.deploy.deploy_script, &username);
            print_one(cli.json, plan, |p| {
                let mut lines =
                    vec!["To setup deploy scripts on each node in the proxy cluster:\n".to_string()];
                lines.extend(p.copy_commands.iter().map(|c| format!("  {}", c)));
                lines.push(String::new());
                lines.push("To setup your user permissions:\n".to_string());
                lines.extend(p.permission_commands.iter().map(|c| format!("  {}", c)));
                lines.push(String::new());
                lines.push("Once installed, run proxy-tools deploy".to_string());
                lines.join("\n")
            })?;
        }
        Commands::SetupNodes { nodes_file } => {
            let credentials = DockerCredentials::from_env()?;
            let nodes = load_nodes(&nodes_path(nodes_file, config))?;
            let mut runner = SystemRunner::new(cli.json);
            let reports = setup_nodes(
                &nodes,
                &config.deploy.deploy_script,
                &credentials,
                &mut runner,
            );
            audit(
                AuditAction::SetupNodes,
                serde_json::json!({"nodes": nodes, "count": reports.len()}),
            );
            print_out(cli.json, &reports, |r| {
                let checks: Vec<String> = r
                    .checks
                    .iter()
                    .map(|c| format!("{}={}", c.name, c.status))
                    .collect();
                format!("{}\t{}", r.node, checks.join("\t"))
            })?;
        }
        Commands::Smoke {
            base_url,
            api_key_file,
        } => {
            let smoke = &config.smoke;
            let api_key_file = api_key_file
                .clone()
                .or_else(|| smoke.api_key_file.clone())
                .or_else(|| default_api_key_file(&smoke.parent_organization))
                .ok_or_else(|| anyhow::anyhow!("cannot locate api key file; pass --api-key-file"))?;
            let settings = SmokeSettings {
                base_url: base_url.clone().unwrap_or_else(|| smoke.base_url.clone()),
                parent_organization: smoke.parent_organization.clone(),
                test_org_prefix: smoke.test_org_prefix.clone(),
                api_key_file,
                propagation_wait: Duration::from_secs(smoke.propagation_wait_secs),
                request_timeout: Duration::from_secs(smoke.request_timeout_secs),
            };
            let mut out = progress(cli.json);
            let outcome = run_smoke(&settings, &mut *out);
            audit(
                AuditAction::Smoke,
                serde_json::json!({"base_url": settings.base_url, "ok": outcome.is_ok()}),
            );
            let report = outcome?;
            print_one(cli.json, report, |r| {
                format!("smoke: {} ({} checks)", r.overall, r.checks.len())
            })?;
        }
        Commands::Release { .. } | Commands::Run { .. } => {
            unreachable!("release commands are dispatched to handle_release_commands")
        }
    }

    Ok(())
}
