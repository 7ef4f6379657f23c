//! Request/response helpers for exercising a running proxy.

use crate::domain::errors::SmokeError;
use reqwest::blocking::Client;
use reqwest::Method;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

const JSONP_PREFIX: &str = "/**/";

pub fn format_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub fn parse_json(body: &str) -> Result<Value, SmokeError> {
    serde_json::from_str(body).map_err(|_| {
        if body.trim().is_empty() {
            SmokeError::InvalidJson("body was empty".to_string())
        } else {
            SmokeError::InvalidJson(format!("Invalid JSON\n{}", body))
        }
    })
}

#[derive(Debug, Clone)]
pub struct Response {
    pub request_method: String,
    pub request_uri: String,
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn json(&self) -> Result<Value, SmokeError> {
        parse_json(&self.body)
    }

    fn from_envelope(&self, envelope: &Value) -> Result<Response, SmokeError> {
        let status = match envelope.get("status").and_then(Value::as_u64) {
            Some(n) => u16::try_from(n).map_err(|_| {
                SmokeError::InvalidJson(format!("envelope status out of range: {}", n))
            })?,
            None => 0,
        };
        let body = envelope.get("body").cloned().unwrap_or(Value::Null);
        Ok(Response {
            request_method: self.request_method.clone(),
            request_uri: self.request_uri.clone(),
            status,
            body: format_json(&body),
        })
    }

    /// Inner response of a `{status, headers, body}` envelope.
    pub fn unwrap_envelope(&self) -> Result<Response, SmokeError> {
        self.from_envelope(&self.json()?)
    }

    /// Splits `/**/callback({...})` into the callback name and its envelope.
    pub fn jsonp_parts(&self) -> Option<(String, Value)> {
        let stripped = self.body.strip_prefix(JSONP_PREFIX)?.trim();
        let (callback, rest) = stripped.split_once('(')?;
        let inner = rest.strip_suffix(')')?;
        if callback.is_empty() {
            return None;
        }
        let value = serde_json::from_str(inner).ok()?;
        Some((callback.to_string(), value))
    }

    pub fn unwrap_jsonp(&self) -> Result<Response, SmokeError> {
        match self.jsonp_parts() {
            Some((_, envelope)) => self.from_envelope(&envelope),
            None => Err(SmokeError::NotJsonp(self.body.clone())),
        }
    }

    /// Body for error messages: pretty JSON when short, else the first lines.
    pub fn json_stack_trace(&self) -> String {
        let lines: Vec<&str> = self.body.lines().collect();
        if lines.len() < 15 {
            if let Ok(v) = serde_json::from_str::<Value>(&self.body) {
                return format_json(&v)
                    .lines()
                    .map(|l| format!("  {}", l))
                    .collect::<Vec<_>>()
                    .join("\n");
            }
        }
        lines
            .iter()
            .take(10)
            .map(|l| format!("  {}", l))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub struct Helpers {
    client: Client,
    base_url: String,
    api_key: String,
}

impl Helpers {
    pub fn new(base_url: &str, api_key_file: &Path, timeout: Duration) -> Result<Self, SmokeError> {
        if !api_key_file.exists() {
            return Err(SmokeError::MissingApiKeyFile(api_key_file.to_path_buf()));
        }
        let api_key = std::fs::read_to_string(api_key_file)
            .map_err(|source| SmokeError::ApiKeyRead {
                path: api_key_file.to_path_buf(),
                source,
            })?
            .trim()
            .to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| SmokeError::Transport {
                method: "-".to_string(),
                url: base_url.to_string(),
                source,
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn get(&self, path: &str) -> Request<'_> {
        self.new_request(Method::GET, path)
    }

    pub fn delete(&self, path: &str) -> Request<'_> {
        self.new_request(Method::DELETE, path)
    }

    pub fn json_post(&self, path: &str, body: Option<Value>) -> Request<'_> {
        let req = self.new_request(Method::POST, path);
        match body {
            Some(b) => req.with_body(format_json(&b)),
            None => req,
        }
    }

    pub fn new_request(&self, method: Method, path: &str) -> Request<'_> {
        Request {
            helpers: self,
            method,
            url: format!("{}{}", self.base_url, path),
            headers: vec![("Content-type".to_string(), "application/json".to_string())],
            api_key: false,
            body: None,
        }
    }
}

pub struct Request<'a> {
    helpers: &'a Helpers,
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    api_key: bool,
    body: Option<String>,
}

impl<'a> Request<'a> {
    pub fn with_api_key(mut self) -> Self {
        self.api_key = true;
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }

    /// Sends the request. Statuses outside 200..500 are errors.
    pub fn execute(self) -> Result<Response, SmokeError> {
        let method = self.method.to_string();
        tracing::info!(method = %method, url = %self.url, "smoke request");

        let mut builder = self.helpers.client.request(self.method, &self.url);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if self.api_key {
            builder = builder.basic_auth(&self.helpers.api_key, Some(""));
        }
        if let Some(body) = self.body {
            builder = builder.body(body);
        }

        let resp = builder.send().map_err(|source| SmokeError::Transport {
            method: method.clone(),
            url: self.url.clone(),
            source,
        })?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|source| SmokeError::Transport {
                method: method.clone(),
                url: self.url.clone(),
                source,
            })?
            .trim()
            .to_string();

        let response = Response {
            request_method: method,
            request_uri: self.url,
            status,
            body,
        };

        if !(200..500).contains(&status) {
            return Err(server_error(&response));
        }
        Ok(response)
    }
}

fn server_error(r: &Response) -> SmokeError {
    let detail = match r.json() {
        Ok(js) => match (js.get("code"), js.get("messages").and_then(Value::as_array)) {
            (Some(code), Some(messages)) => {
                let messages: Vec<String> = messages
                    .iter()
                    .map(|m| m.as_str().map(str::to_string).unwrap_or_else(|| m.to_string()))
                    .collect();
                format!(
                    " - Code: {}\n   {}",
                    code.as_str().unwrap_or_default(),
                    messages.join("\n   ")
                )
            }
            _ => r.json_stack_trace(),
        },
        Err(_) => r.json_stack_trace(),
    };
    SmokeError::Server {
        method: r.request_method.clone(),
        url: r.request_uri.clone(),
        status: r.status,
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mock_http::{request_line, MockHttp};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn response(status: u16, body: &str) -> Response {
        Response {
            request_method: "GET".to_string(),
            request_uri: "http://localhost:7000/x".to_string(),
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn unwraps_response_envelope() {
        let r = response(
            200,
            r#"{"status":201,"headers":{},"body":{"id":"proxy-test-1"}}"#,
        );
        let inner = r.unwrap_envelope().unwrap();
        assert_eq!(inner.status, 201);
        assert_eq!(inner.json().unwrap()["id"], "proxy-test-1");
    }

    #[test]
    fn unwraps_jsonp_callback() {
        let r = response(
            200,
            "/**/ cb({\"status\":422,\"headers\":{},\"body\":{\"code\":\"generic_error\"}})",
        );
        let (callback, envelope) = r.jsonp_parts().unwrap();
        assert_eq!(callback, "cb");
        assert_eq!(envelope["status"], 422);
        let inner = r.unwrap_jsonp().unwrap();
        assert_eq!(inner.status, 422);
        assert_eq!(inner.json().unwrap()["code"], "generic_error");
    }

    #[test]
    fn jsonp_requires_prefix() {
        let r = response(200, "cb({})");
        assert!(matches!(r.unwrap_jsonp(), Err(SmokeError::NotJsonp(_))));
    }

    #[test]
    fn empty_body_is_reported_as_empty() {
        let err = response(200, "  ").json().unwrap_err();
        assert!(err.to_string().contains("body was empty"));
    }

    #[test]
    fn stack_trace_truncates_long_non_json_bodies() {
        let body = (0..30).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
        let trace = response(500, &body).json_stack_trace();
        assert_eq!(trace.lines().count(), 10);
        assert!(trace.starts_with("  line 0"));
    }

    #[test]
    fn envelope_status_out_of_range_is_rejected() {
        let r = response(200, r#"{"status":65736,"headers":{},"body":{}}"#);
        assert!(matches!(r.unwrap_envelope(), Err(SmokeError::InvalidJson(_))));
    }

    #[test]
    fn envelope_without_status_unwraps_to_zero() {
        let r = response(200, r#"{"headers":{},"body":{}}"#);
        assert_eq!(r.unwrap_envelope().unwrap().status, 0);
    }

    fn helpers_for(server: &MockHttp, key: &str) -> (tempfile::TempDir, Helpers) {
        let tmp = tempfile::TempDir::new().unwrap();
        let file = tmp.path().join("flow");
        std::fs::write(&file, key).unwrap();
        let helpers = Helpers::new(&server.uri(), &file, Duration::from_secs(5)).unwrap();
        (tmp, helpers)
    }

    #[test]
    fn execute_sends_api_key_and_content_type() {
        let server = MockHttp::start();
        // base64("abc123:")
        server.mount(
            Mock::given(method("POST"))
                .and(path("/organizations"))
                .and(header("authorization", "Basic YWJjMTIzOg=="))
                .and(header("content-type", "application/json"))
                .and(body_json(json!({"id": "o"})))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "o"}))),
        );
        let (_tmp, helpers) = helpers_for(&server, "abc123\n");

        let r = helpers
            .json_post("/organizations", Some(json!({"id": "o"})))
            .with_api_key()
            .execute()
            .unwrap();

        assert_eq!(r.status, 200);
        assert_eq!(r.json().unwrap()["id"], "o");
        let requests: Vec<String> = server.received().iter().map(request_line).collect();
        assert_eq!(requests, vec!["POST /organizations"]);
    }

    #[test]
    fn server_errors_surface_code_and_messages() {
        let server = MockHttp::start();
        server.mount(
            Mock::given(method("GET")).and(path("/x")).respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({"code": "boom", "messages": ["it broke"]})),
            ),
        );
        let (_tmp, helpers) = helpers_for(&server, "k");

        let err = helpers.get("/x").execute().unwrap_err();

        match err {
            SmokeError::Server { status, detail, .. } => {
                assert_eq!(status, 500);
                assert!(detail.contains("Code: boom"));
                assert!(detail.contains("it broke"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn client_errors_are_returned_for_assertions() {
        let server = MockHttp::start();
        let (_tmp, helpers) = helpers_for(&server, "k");

        let r = helpers.get("/not-mounted").execute().unwrap();

        assert_eq!(r.status, 404);
    }

    #[test]
    fn missing_key_file_is_rejected() {
        let err = Helpers::new(
            "http://localhost:7000",
            Path::new("/nope/flow"),
            Duration::from_secs(1),
        )
        .err()
        .unwrap();
        assert!(matches!(err, SmokeError::MissingApiKeyFile(_)));
    }
}
