//! Rolling deploy of a proxy version across the nodes file.
//!
//! Each node is deployed over ssh and must report healthy before the next
//! node is touched. Any failure stops the release.

use crate::domain::errors::DeployError;
use crate::domain::models::{DeployReport, NodeDeployReport};
use crate::executor::{Step, StepRunner};
use std::io::{BufRead, Write};
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

const HEALTHCHECK_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
pub struct HealthcheckPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

#[derive(Debug, Clone)]
pub struct DeploySettings {
    pub port: u16,
    pub healthcheck_path: String,
    pub deploy_script: String,
    pub healthcheck: HealthcheckPolicy,
}

impl DeploySettings {
    pub fn healthcheck_url(&self, node: &str) -> String {
        format!("http://{}:{}{}", node, self.port, self.healthcheck_path)
    }
}

fn say(out: &mut dyn Write, line: &str) {
    let _ = writeln!(out, "{}", line);
    let _ = out.flush();
}

/// Latest tag reported by `sem-info`, if the tool is installed and has one.
pub fn latest_tag() -> Option<String> {
    let output = Command::new("sem-info")
        .args(["tag", "latest"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let tag = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if tag.is_empty() {
        None
    } else {
        Some(tag)
    }
}

/// Uses `explicit` when given, otherwise prompts until a version is entered.
/// A blank answer takes `default`.
pub fn resolve_version(
    explicit: Option<&str>,
    default: Option<String>,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<String, DeployError> {
    if let Some(v) = explicit.map(str::trim).filter(|v| !v.is_empty()) {
        return Ok(v.to_string());
    }

    let default_message = default
        .as_deref()
        .map(|d| format!(" Default[{}]", d))
        .unwrap_or_default();

    loop {
        write!(out, "Specify version to deploy{}: ", default_message)
            .and_then(|_| out.flush())
            .map_err(DeployError::Prompt)?;
        let mut line = String::new();
        let read = input.read_line(&mut line).map_err(DeployError::Prompt)?;
        let entered = line.trim();
        if !entered.is_empty() {
            return Ok(entered.to_string());
        }
        if let Some(d) = &default {
            return Ok(d.clone());
        }
        if read == 0 {
            return Err(DeployError::NoVersion);
        }
        say(out, "\nEnter a valid version\n");
    }
}

pub fn healthcheck_client() -> Result<reqwest::blocking::Client, DeployError> {
    reqwest::blocking::Client::builder()
        .timeout(HEALTHCHECK_REQUEST_TIMEOUT)
        .build()
        .map_err(DeployError::Client)
}

fn is_healthy(client: &reqwest::blocking::Client, url: &str) -> bool {
    match client.get(url).send().and_then(|r| r.text()) {
        Ok(body) => body.trim().contains("healthy"),
        Err(e) => {
            tracing::debug!(url, error = %e, "healthcheck request failed");
            false
        }
    }
}

/// Polls `url` until its body contains `healthy`. Returns the attempt count.
pub fn wait_for_healthcheck(
    client: &reqwest::blocking::Client,
    url: &str,
    policy: HealthcheckPolicy,
    out: &mut dyn Write,
) -> Result<u32, DeployError> {
    let started = Instant::now();
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        say(out, &format!("  - Checking health: {}", url));
        if is_healthy(client, url) {
            say(out, "  - healthy");
            return Ok(attempts);
        }
        if started.elapsed() > policy.timeout {
            tracing::warn!(url, attempts, "healthcheck timed out");
            return Err(DeployError::HealthcheckTimeout {
                url: url.to_string(),
                timeout_secs: policy.timeout.as_secs(),
            });
        }
        say(
            out,
            &format!(
                "  - waiting for healthcheck to succeed. timeout[{} seconds]. sleeping for {} seconds",
                policy.timeout.as_secs(),
                policy.interval.as_secs()
            ),
        );
        thread::sleep(policy.interval);
    }
}

/// Runs the deploy script on `node` over ssh. Returns the command line used.
pub fn deploy_node(
    runner: &mut dyn StepRunner,
    node: &str,
    version: &str,
    script: &str,
) -> Result<String, DeployError> {
    let step = Step::argv(
        "ssh",
        vec![node.to_string(), script.to_string(), version.to_string()],
    );
    runner.announce(&step);
    let exit = runner.run_step(&step).map_err(|source| DeployError::Spawn {
        command: step.command().to_string(),
        source,
    })?;
    if !exit.success {
        return Err(DeployError::RemoteCommand {
            node: node.to_string(),
            command: step.command().to_string(),
            code: exit.code,
        });
    }
    Ok(step.command().to_string())
}

pub fn run_deploy(
    nodes: &[String],
    version: &str,
    settings: &DeploySettings,
    runner: &mut dyn StepRunner,
    out: &mut dyn Write,
) -> Result<DeployReport, DeployError> {
    let client = healthcheck_client()?;
    let started = Instant::now();
    let mut reports = Vec::with_capacity(nodes.len());

    for node in nodes {
        say(out, node);
        say(out, &format!("  - Deploying version {}", version));
        tracing::info!(node = %node, version, "deploying node");
        let command = deploy_node(runner, node, version, &settings.deploy_script)?;

        let url = settings.healthcheck_url(node);
        let attempts = wait_for_healthcheck(&client, &url, settings.healthcheck, out)?;
        say(out, "");

        reports.push(NodeDeployReport {
            node: node.clone(),
            command,
            healthcheck_url: url,
            healthcheck_attempts: attempts,
        });
    }

    Ok(DeployReport {
        version: version.to_string(),
        nodes: reports,
        duration_secs: started.elapsed().as_secs(),
    })
}
