//! End-to-end smoke test of a running proxy.
//!
//! ## Files
//! - `http.rs` — request builder, response envelope/JSONP unwrapping.
//! - `assert.rs` — assertion helpers returning `AssertionError`.
//!
//! The scenario creates a sandbox organization, walks the error, envelope
//! and session paths, and always deletes organizations carrying the test
//! prefix before returning.

pub mod assert;
pub mod http;

use crate::domain::errors::{AssertionError, SmokeError};
use crate::domain::models::{CheckItem, SmokeReport};
use self::assert::{
    assert_envelope, assert_equals, assert_generic_error, assert_jsonp, assert_not_nil,
    assert_status, assert_statuses, assert_unauthorized,
};
use self::http::Helpers;
use reqwest::Method;
use serde_json::{json, Value};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SmokeSettings {
    pub base_url: String,
    pub parent_organization: String,
    pub test_org_prefix: String,
    pub api_key_file: PathBuf,
    pub propagation_wait: Duration,
    pub request_timeout: Duration,
}

/// `~/.flow/<parent>`, where the flow CLI keeps the api key.
pub fn default_api_key_file(parent: &str) -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".flow").join(parent))
}

/// `<prefix>-<8 random hex chars>`.
pub fn test_org_id(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &suffix[..8])
}

struct Checks<'a> {
    items: Vec<CheckItem>,
    out: &'a mut dyn Write,
}

impl<'a> Checks<'a> {
    fn run<T>(
        &mut self,
        name: &str,
        check: impl FnOnce() -> Result<T, AssertionError>,
    ) -> Result<T, SmokeError> {
        match check() {
            Ok(v) => {
                let _ = writeln!(self.out, "  ok      {}", name);
                self.items.push(CheckItem {
                    name: name.to_string(),
                    status: "ok".to_string(),
                });
                Ok(v)
            }
            Err(source) => {
                let _ = writeln!(self.out, "  FAILED  {}", name);
                tracing::warn!(check = name, error = %source, "smoke check failed");
                Err(SmokeError::Check {
                    check: name.to_string(),
                    source,
                })
            }
        }
    }
}

pub fn run_smoke(settings: &SmokeSettings, out: &mut dyn Write) -> Result<SmokeReport, SmokeError> {
    let helpers = Helpers::new(
        &settings.base_url,
        &settings.api_key_file,
        settings.request_timeout,
    )?;
    let id = test_org_id(&settings.test_org_prefix);
    let _ = writeln!(out, "smoke testing {} with organization {}", settings.base_url, id);

    let mut checks = Checks {
        items: Vec::new(),
        out,
    };
    let result = scenario(&helpers, settings, &id, &mut checks);

    match delete_test_orgs(&helpers, &settings.parent_organization, &settings.test_org_prefix) {
        Ok(deleted) => tracing::info!(deleted, "removed test organizations"),
        Err(e) => tracing::warn!(error = %e, "failed to remove test organizations"),
    }

    result?;
    Ok(SmokeReport {
        base_url: settings.base_url.clone(),
        organization: id,
        overall: "ok".to_string(),
        checks: checks.items,
    })
}

/// Deletes organizations under `parent` whose id starts with `prefix`.
/// Only looks at the first page of 100.
pub fn delete_test_orgs(helpers: &Helpers, parent: &str, prefix: &str) -> Result<usize, SmokeError> {
    let listed = helpers
        .get(&format!(
            "/organizations?limit=100&environment=sandbox&parent={}",
            parent
        ))
        .with_api_key()
        .execute()?
        .json()?;

    let mut deleted = 0usize;
    for org in listed.as_array().cloned().unwrap_or_default() {
        let Some(org_id) = org.get("id").and_then(Value::as_str) else {
            continue;
        };
        if !org_id.starts_with(prefix) {
            continue;
        }
        let response = helpers
            .delete(&format!("/organizations/{}", org_id))
            .with_api_key()
            .execute()?;
        assert_statuses(&[204, 404], &response).map_err(|source| SmokeError::Check {
            check: "cleanup".to_string(),
            source,
        })?;
        deleted += 1;
    }
    Ok(deleted)
}

fn scenario(
    helpers: &Helpers,
    settings: &SmokeSettings,
    id: &str,
    checks: &mut Checks<'_>,
) -> Result<(), SmokeError> {
    let not_defined = "HTTP 'POST /foo' is not defined";

    let org = checks.run("create_organization", || {
        let r = helpers
            .json_post(
                "/organizations",
                Some(json!({
                    "environment": "sandbox",
                    "parent_id": settings.parent_organization,
                    "id": id,
                })),
            )
            .with_api_key()
            .execute()?;
        assert_status(201, &r)?;
        let org = r.json()?;
        assert_equals(&Value::from(id), org.get("id").unwrap_or(&Value::Null))?;
        Ok(org)
    })?;

    // Unknown path and response envelopes
    checks.run("unknown_path", || {
        let r = helpers.json_post("/foo", None).execute()?;
        assert_generic_error(&r, not_defined)
    })?;

    checks.run("invalid_envelope_parameter", || {
        let r = helpers.json_post("/foo?envelope=res", None).execute()?;
        assert_generic_error(
            &r,
            "Invalid value 'res' for query parameter 'envelope' - must be one of request, response",
        )
    })?;

    checks.run("response_envelope_error", || {
        let r = helpers.json_post("/foo?envelope=response", None).execute()?;
        assert_envelope(&r)?;
        assert_generic_error(&r.unwrap_envelope()?, not_defined)
    })?;

    checks.run("jsonp_envelope_error", || {
        let r = helpers
            .json_post("/foo?envelope=response&callback=cb", None)
            .execute()?;
        assert_jsonp(&r, "cb")?;
        assert_generic_error(&r.unwrap_jsonp()?, not_defined)
    })?;

    // Token validation
    checks.run("token_validation_missing_token", || {
        let r = helpers.json_post("/token-validations", None).execute()?;
        assert_generic_error(
            &r,
            "Missing required field for type 'token_validation_form': 'token'",
        )
    })?;

    checks.run("token_validation_invalid_token", || {
        let r = helpers
            .json_post("/token-validations", Some(json!({"token": "foo"})))
            .execute()?;
        assert_generic_error(&r, "The specified API token is not valid")
    })?;

    checks.run("token_validation_valid_token", || {
        let r = helpers
            .json_post(
                "/token-validations",
                Some(json!({"token": helpers.api_key()})),
            )
            .execute()?;
        assert_status(200, &r)?;
        assert_equals(
            &Value::from("Hooray! The provided API Token is valid."),
            r.json()?.get("status").unwrap_or(&Value::Null),
        )
    })?;

    checks.run("create_without_api_key_unauthorized", || {
        let r = helpers
            .json_post(
                "/organizations",
                Some(json!({"environment": "sandbox", "parent": "demo", "id": "proxy-test"})),
            )
            .execute()?;
        assert_unauthorized(&r)
    })?;

    // Response envelopes for valid requests
    checks.run("response_envelope_success", || {
        let r = helpers
            .get(&format!("/organizations/{}?envelope=response", id))
            .with_api_key()
            .execute()?;
        assert_envelope(&r)?;
        let inner = r.unwrap_envelope()?;
        assert_status(200, &inner)?;
        assert_equals(
            &Value::from(id),
            inner.json()?.get("id").unwrap_or(&Value::Null),
        )
    })?;

    checks.run("jsonp_envelope_success", || {
        let r = helpers
            .get(&format!("/organizations/{}?envelope=response&callback=foo", id))
            .with_api_key()
            .execute()?;
        assert_jsonp(&r, "foo")?;
        let inner = r.unwrap_jsonp()?;
        assert_status(200, &inner)?;
        assert_equals(
            &Value::from(id),
            inner.json()?.get("id").unwrap_or(&Value::Null),
        )
    })?;

    // Request envelopes
    checks.run("request_envelope_missing_method", || {
        let r = helpers
            .json_post("/organizations/0?envelope=request", Some(json!({})))
            .with_api_key()
            .execute()?;
        assert_generic_error(
            &r,
            "Error in envelope request body: Field 'method' is required",
        )
    })?;

    checks.run("request_envelope_invalid_method", || {
        let r = helpers
            .json_post(
                "/organizations/0?envelope=request",
                Some(json!({"method": 123, "body": "test"})),
            )
            .with_api_key()
            .execute()?;
        assert_generic_error(
            &r,
            "Error in envelope request body: Field 'method' must be one of GET, POST, PUT, PATCH, DELETE",
        )
    })?;

    let new_name = format!(
        "{} 2",
        org.get("name").and_then(Value::as_str).unwrap_or_default()
    );
    checks.run("request_envelope_put_unauthorized", || {
        let r = helpers
            .json_post(
                &format!("/organizations/{}?envelope=request", id),
                Some(json!({"method": "PUT", "body": {"name": new_name}})),
            )
            .with_api_key()
            .execute()?;
        assert_unauthorized(&r)
    })?;

    checks.run("request_envelope_get_unauthorized", || {
        let r = helpers
            .json_post(
                &format!("/organizations/{}?envelope=request", id),
                Some(json!({"method": "GET"})),
            )
            .with_api_key()
            .execute()?;
        assert_unauthorized(&r)
    })?;

    // Sessions
    tracing::info!(
        secs = settings.propagation_wait.as_secs(),
        "waiting for organization to reach the session service"
    );
    std::thread::sleep(settings.propagation_wait);

    let session_id = checks.run("create_session", || {
        let r = helpers
            .json_post(&format!("/sessions/organizations/{}", id), None)
            .execute()?;
        assert_status(201, &r)?;
        let js = r.json()?;
        assert_not_nil(js.get("id"))?;
        Ok(js
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    })?;

    checks.run("session_authorized", || {
        let r = helpers
            .get(&format!("/{}/countries", id))
            .with_header("Authorization", &format!("session {}", session_id))
            .execute()?;
        assert_status(200, &r)
    })?;

    checks.run("no_session_unauthorized", || {
        let r = helpers.get(&format!("/{}/countries", id)).execute()?;
        assert_unauthorized(&r)
    })?;

    checks.run("request_envelope_session_header", || {
        let body = json!({
            "method": "GET",
            "headers": {"Authorization": [format!("Session {}", session_id)]},
        });
        let r = helpers
            .new_request(Method::POST, &format!("/{}/countries?envelope=request", id))
            .with_body(http::format_json(&body))
            .execute()?;
        assert_status(200, &r)
    })?;

    checks.run("request_envelope_without_session", || {
        let r = helpers
            .new_request(Method::POST, &format!("/{}/countries?envelope=request", id))
            .with_body(http::format_json(&json!({"method": "GET"})))
            .execute()?;
        assert_unauthorized(&r)
    })?;

    Ok(())
}
