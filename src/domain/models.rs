use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

#[derive(Serialize)]
pub struct JsonErr {
    pub ok: bool,
    pub error: ErrorBody,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Ok,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub step: String,
    pub status: StepStatus,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

impl StepReport {
    pub fn skipped(step: &str) -> Self {
        Self {
            step: step.to_string(),
            status: StepStatus::Skipped,
            exit_code: None,
            duration_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub executor: String,
    pub overall: String,
    pub steps: Vec<StepReport>,
    pub duration_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct PlanReport {
    pub executor: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NodeDeployReport {
    pub node: String,
    pub command: String,
    pub healthcheck_url: String,
    pub healthcheck_attempts: u32,
}

#[derive(Debug, Serialize)]
pub struct DeployReport {
    pub version: String,
    pub nodes: Vec<NodeDeployReport>,
    pub duration_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct InstallInstructions {
    pub copy_commands: Vec<String>,
    pub permission_commands: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckItem {
    pub name: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct SetupNodeReport {
    pub node: String,
    pub checks: Vec<CheckItem>,
}

#[derive(Debug, Serialize)]
pub struct SmokeReport {
    pub base_url: String,
    pub organization: String,
    pub overall: String,
    pub checks: Vec<CheckItem>,
}
