use crate::domain::models::RunReport;
use std::path::PathBuf;

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {}", c),
        None => "a signal".to_string(),
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ExecutorError {
    #[error("executor[{executor}]: cannot add an empty step")]
    EmptyStep { executor: String },
    #[error("executor[{executor}]: failed to start step '{step}': {source}")]
    Spawn {
        executor: String,
        step: String,
        #[source]
        source: std::io::Error,
    },
    #[error("executor[{executor}]: step '{step}' terminated with {}", exit_label(.code))]
    StepFailed {
        executor: String,
        step: String,
        code: Option<i32>,
        report: Box<RunReport>,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum NodesError {
    #[error("Nodes configuration file[{}] not found", .0.display())]
    NotFound(PathBuf),
    #[error("Nodes configuration file[{}] is empty", .0.display())]
    Empty(PathBuf),
    #[error("failed to read nodes file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum DeployError {
    #[error("no version specified")]
    NoVersion,
    #[error("failed to read version from stdin: {0}")]
    Prompt(#[source] std::io::Error),
    #[error("failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("error running cmd: {command} ({})", exit_label(.code))]
    RemoteCommand {
        node: String,
        command: String,
        code: Option<i32>,
    },
    #[error("Timeout exceeded[{timeout_secs} seconds] waiting for healthcheck: {url}")]
    HealthcheckTimeout { url: String, timeout_secs: u64 },
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum SetupError {
    #[error("DOCKER_USERNAME and DOCKER_PASSWORD must be valid environment variables")]
    MissingDockerCredentials,
}

#[derive(thiserror::Error, Debug)]
pub enum SmokeError {
    #[error("Missing api key file: {}", .0.display())]
    MissingApiKeyFile(PathBuf),
    #[error("failed to read api key file '{}': {source}", .path.display())]
    ApiKeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP {status} for {method} {url}\n{detail}")]
    Server {
        method: String,
        url: String,
        status: u16,
        detail: String,
    },
    #[error("request failed for {method} {url}: {source}")]
    Transport {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("ERROR parsing json: {0}")]
    InvalidJson(String),
    #[error("Cannot unwrap jsonp from: {0}")]
    NotJsonp(String),
    #[error("check '{check}' failed: {source}")]
    Check {
        check: String,
        #[source]
        source: AssertionError,
    },
}

#[derive(thiserror::Error, Debug)]
#[error("{message}")]
pub struct AssertionError {
    pub message: String,
}

impl AssertionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<SmokeError> for AssertionError {
    fn from(err: SmokeError) -> Self {
        AssertionError::new(err.to_string())
    }
}

/// Stable machine-readable code for the `--json` error envelope.
pub fn error_code(err: &anyhow::Error) -> &'static str {
    if let Some(e) = err.downcast_ref::<ExecutorError>() {
        return match e {
            ExecutorError::EmptyStep { .. } => "EMPTY_STEP",
            ExecutorError::Spawn { .. } => "STEP_SPAWN_FAILED",
            ExecutorError::StepFailed { .. } => "STEP_FAILED",
        };
    }
    if let Some(e) = err.downcast_ref::<NodesError>() {
        return match e {
            NodesError::NotFound(_) => "NODES_NOT_FOUND",
            NodesError::Empty(_) => "NODES_EMPTY",
            NodesError::Read { .. } => "NODES_READ_FAILED",
        };
    }
    if let Some(e) = err.downcast_ref::<DeployError>() {
        return match e {
            DeployError::NoVersion | DeployError::Prompt(_) => "NO_VERSION",
            DeployError::Spawn { .. } | DeployError::RemoteCommand { .. } => "DEPLOY_FAILED",
            DeployError::HealthcheckTimeout { .. } => "HEALTHCHECK_TIMEOUT",
            DeployError::Client(_) => "HTTP_CLIENT",
        };
    }
    if err.downcast_ref::<SetupError>().is_some() {
        return "MISSING_DOCKER_CREDENTIALS";
    }
    if let Some(e) = err.downcast_ref::<SmokeError>() {
        return match e {
            SmokeError::MissingApiKeyFile(_) | SmokeError::ApiKeyRead { .. } => "API_KEY_MISSING",
            SmokeError::Check { .. } => "SMOKE_CHECK_FAILED",
            _ => "SMOKE_FAILED",
        };
    }
    if err.downcast_ref::<crate::config::ConfigError>().is_some() {
        return "CONFIG_INVALID";
    }
    "INTERNAL"
}

/// Structured payload attached to the error envelope, when the error carries one.
pub fn error_details(err: &anyhow::Error) -> Option<serde_json::Value> {
    match err.downcast_ref::<ExecutorError>() {
        Some(ExecutorError::StepFailed { report, .. }) => serde_json::to_value(&**report).ok(),
        _ => None,
    }
}
