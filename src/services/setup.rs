//! One-time node preparation: install instructions and docker login.

use crate::domain::errors::SetupError;
use crate::domain::models::{CheckItem, InstallInstructions, SetupNodeReport};
use crate::executor::{Step, StepRunner};
use std::process::Command;

#[derive(Clone)]
pub struct DockerCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for DockerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DockerCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl DockerCredentials {
    pub fn from_env() -> Result<Self, SetupError> {
        let username = std::env::var("DOCKER_USERNAME").ok();
        let password = std::env::var("DOCKER_PASSWORD").ok();
        match (username, password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Ok(Self { username, password })
            }
            _ => Err(SetupError::MissingDockerCredentials),
        }
    }
}

/// `$USER`, falling back to `whoami`.
pub fn current_username() -> String {
    if let Ok(user) = std::env::var("USER") {
        if !user.trim().is_empty() {
            return user.trim().to_string();
        }
    }
    Command::new("whoami")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default()
}

pub fn install_instructions(nodes: &[String], script: &str, username: &str) -> InstallInstructions {
    InstallInstructions {
        copy_commands: nodes
            .iter()
            .map(|n| format!("scp {} {}:~/.", script_file_name(script), n))
            .collect(),
        permission_commands: nodes
            .iter()
            .map(|n| format!("ssh {} sudo usermod -a -G docker {}", n, username))
            .collect(),
    }
}

/// `./deploy-proxy.sh` is invoked remotely, but copied by its bare file name.
fn script_file_name(script: &str) -> &str {
    script.trim_start_matches("./")
}

fn record(checks: &mut Vec<CheckItem>, name: &str, runner: &mut dyn StepRunner, step: &Step) {
    runner.announce(step);
    let status = match runner.run_step(step) {
        Ok(exit) if exit.success => "ok".to_string(),
        Ok(exit) => {
            tracing::warn!(command = %step.command(), code = ?exit.code, "setup command failed");
            "failed".to_string()
        }
        Err(e) => {
            tracing::warn!(command = %step.command(), error = %e, "setup command did not start");
            "error".to_string()
        }
    };
    checks.push(CheckItem {
        name: name.to_string(),
        status,
    });
}

/// `ssh <node> docker login --username <user> --password-stdin`, with the
/// password piped over ssh so it never reaches an argv or the remote shell.
fn docker_login(node: &str, credentials: &DockerCredentials) -> Step {
    let remote = format!(
        "docker login --username {} --password-stdin",
        shell_words::quote(&credentials.username)
    );
    Step::argv("ssh", vec![node.to_string(), remote]).with_stdin(credentials.password.clone())
}

/// Copies the deploy script to each node and logs docker in there.
/// Failures are recorded per node and do not stop the remaining nodes.
pub fn setup_nodes(
    nodes: &[String],
    script: &str,
    credentials: &DockerCredentials,
    runner: &mut dyn StepRunner,
) -> Vec<SetupNodeReport> {
    let file = script_file_name(script);
    nodes
        .iter()
        .map(|node| {
            let mut checks = Vec::new();
            let copy = Step::argv("scp", vec![file.to_string(), format!("{}:~/.", node)]);
            record(&mut checks, "copy_deploy_script", runner, &copy);

            record(&mut checks, "docker_login", runner, &docker_login(node, credentials));

            SetupNodeReport {
                node: node.clone(),
                checks,
            }
        })
        .collect()
}
