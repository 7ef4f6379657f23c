use super::http::Response;
use crate::domain::errors::AssertionError;
use serde_json::Value;
use std::fmt::Debug;

pub type Check = Result<(), AssertionError>;

pub fn assert_equals<T: PartialEq + Debug + ?Sized>(expected: &T, actual: &T) -> Check {
    if expected != actual {
        return Err(AssertionError::new(format!(
            "expected[{:?}] actual[{:?}]",
            expected, actual
        )));
    }
    Ok(())
}

pub fn assert_not_nil(value: Option<&Value>) -> Check {
    match value {
        Some(v) if !v.is_null() => Ok(()),
        _ => Err(AssertionError::new("expected value but got nil")),
    }
}

pub fn assert_status(expected: u16, response: &Response) -> Check {
    if expected != response.status {
        return Err(AssertionError::new(format!(
            "Invalid HTTP Status Code: expected[{}] actual[{}]\n{}",
            expected,
            response.status,
            response.json_stack_trace()
        )));
    }
    Ok(())
}

pub fn assert_statuses(expected: &[u16], response: &Response) -> Check {
    if !expected.contains(&response.status) {
        let joined = expected
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        return Err(AssertionError::new(format!(
            "Invalid HTTP Status Code: expected one of[{}] actual[{}]\n{}",
            joined,
            response.status,
            response.json_stack_trace()
        )));
    }
    Ok(())
}

pub fn assert_unauthorized(response: &Response) -> Check {
    assert_status(401, response)
}

fn is_envelope(status: u16, body: &Value) -> bool {
    status == 200
        && body.get("status").is_some()
        && body.get("headers").is_some()
        && body.get("body").is_some()
}

pub fn assert_envelope(response: &Response) -> Check {
    let ok = response
        .json()
        .map(|js| is_envelope(response.status, &js))
        .unwrap_or(false);
    if !ok {
        return Err(AssertionError::new(format!(
            "expected response envelope for {} {} but got\n  HTTP {}\n{}",
            response.request_method,
            response.request_uri,
            response.status,
            response.json_stack_trace()
        )));
    }
    Ok(())
}

pub fn assert_jsonp(response: &Response, expected_callback: &str) -> Check {
    let ok = response
        .jsonp_parts()
        .map(|(callback, body)| {
            callback == expected_callback && is_envelope(response.status, &body)
        })
        .unwrap_or(false);
    if !ok {
        return Err(AssertionError::new(format!(
            "expected response envelope with jsonp callback[{}] for {} {} but got\n  HTTP {}\n{}",
            expected_callback,
            response.request_method,
            response.request_uri,
            response.status,
            response.json_stack_trace()
        )));
    }
    Ok(())
}

/// 422 with code `generic_error` and exactly `[message]`.
pub fn assert_generic_error(response: &Response, message: &str) -> Check {
    assert_equals(&422, &response.status)?;
    let js = response.json()?;
    assert_equals(
        &Value::from("generic_error"),
        js.get("code").unwrap_or(&Value::Null),
    )?;
    assert_equals(
        &Value::from(vec![message]),
        js.get("messages").unwrap_or(&Value::Null),
    )
}
