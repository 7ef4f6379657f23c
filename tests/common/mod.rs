#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use tempfile::TempDir;
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Isolated HOME, working directory and a PATH prefix for fake tools.
pub struct TestEnv {
    _tmp: TempDir,
    pub home: PathBuf,
    pub work: PathBuf,
    pub bin: PathBuf,
    pub calls: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let home = tmp.path().join("home");
        let work = tmp.path().join("work");
        let bin = tmp.path().join("bin");
        for dir in [&home, &work, &bin] {
            fs::create_dir_all(dir).expect("create test dir");
        }
        let calls = tmp.path().join("calls.log");

        Self {
            _tmp: tmp,
            home,
            work,
            bin,
            calls,
        }
    }

    /// Installs `name` on the fake PATH; it logs `name args...` then runs `tail`.
    pub fn fake_tool(&self, name: &str, tail: &str) {
        let path = self.bin.join(name);
        let script = format!(
            "#!/bin/sh\necho \"{} $*\" >> \"{}\"\n{}\n",
            name,
            self.calls.display(),
            tail
        );
        fs::write(&path, script).expect("write fake tool");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod fake tool");
    }

    pub fn recording_tool(&self, name: &str) {
        self.fake_tool(name, "exit 0");
    }

    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(&self.calls)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn write_nodes(&self, nodes: &[&str]) -> PathBuf {
        let path = self.work.join("nodes");
        fs::write(&path, format!("{}\n", nodes.join("\n"))).expect("write nodes file");
        path
    }

    pub fn cmd(&self) -> Command {
        let orig_path = std::env::var("PATH").unwrap_or_default();
        let mut cmd = cargo_bin_cmd!("proxy-tools");
        cmd.current_dir(&self.work)
            .env("HOME", &self.home)
            .env("PATH", format!("{}:{}", self.bin.display(), orig_path))
            .env_remove("DOCKER_USERNAME")
            .env_remove("DOCKER_PASSWORD")
            .env_remove("PROXY_TOOLS_LOG");
        cmd
    }

    pub fn run_json(&self, args: &[&str]) -> Value {
        let out = self
            .cmd()
            .arg("--json")
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }

    /// Runs a command expected to fail and returns its JSON error envelope.
    pub fn run_json_failure(&self, args: &[&str]) -> Value {
        let out = self
            .cmd()
            .arg("--json")
            .args(args)
            .assert()
            .failure()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("error json output")
    }
}

/// wiremock server kept alive for the duration of a test.
pub struct MockHttp {
    pub server: MockServer,
    rt: Runtime,
}

impl MockHttp {
    pub fn start() -> Self {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("test runtime");
        let server = rt.block_on(MockServer::start());
        Self { server, rt }
    }

    pub fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    pub fn port(&self) -> u16 {
        self.server.address().port()
    }

    pub fn received_paths(&self) -> Vec<String> {
        self.rt
            .block_on(self.server.received_requests())
            .unwrap_or_default()
            .iter()
            .map(|r| format!("{} {}", r.method, r.url.path()))
            .collect()
    }
}

/// Healthcheck endpoint answering `status` with `body`.
pub fn serve_healthcheck(status: u16, body: &str) -> MockHttp {
    let http = MockHttp::start();
    http.mount(
        Mock::given(method("GET"))
            .and(path("/_internal_/healthcheck"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body)),
    );
    http
}

pub fn serve_healthy() -> MockHttp {
    serve_healthcheck(200, "healthy")
}
