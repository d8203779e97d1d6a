use serde::Serialize;
use serde_json::Value;

use crate::error::Error;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// A parsed JSON-RPC message. `id` is `None` for notifications; an explicit
/// `"id": null` is kept as `Some(Value::Null)`.
#[derive(Debug, Clone)]
pub struct Request {
    pub id: Option<Value>,
    pub method: String,
    pub params: Value,
}

impl Request {
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Value) -> Self {
        Self {
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Parses one line. A malformed message yields the error response to
    /// send back instead.
    pub fn parse(line: &str) -> std::result::Result<Self, Response> {
        let value: Value = serde_json::from_str(line).map_err(|err| {
            Response::err(Value::Null, PARSE_ERROR, format!("parse error: {err}"))
        })?;

        let Value::Object(mut message) = value else {
            return Err(Response::err(
                Value::Null,
                INVALID_REQUEST,
                "request must be a JSON object",
            ));
        };

        let id = message.remove("id");
        let reply_id = id.clone().unwrap_or(Value::Null);
        if message.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return Err(Response::err(
                reply_id,
                INVALID_REQUEST,
                "jsonrpc must be \"2.0\"",
            ));
        }
        let Some(Value::String(method)) = message.remove("method") else {
            return Err(Response::err(
                reply_id,
                INVALID_REQUEST,
                "method must be a string",
            ));
        };

        let params = match message.remove("params") {
            None | Some(Value::Null) => Value::Object(Default::default()),
            Some(params) => params,
        };

        Ok(Self { id, method, params })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("method not found: {method}"))
    }
}

impl From<Error> for RpcError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(_) | Error::Validation(_) => Self::invalid_params(err.to_string()),
            other => Self::new(INTERNAL_ERROR, other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    pub fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self::from_error(id, RpcError::new(code, message))
    }

    pub fn from_error(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn error_code(&self) -> Option<i64> {
        self.error.as_ref().map(|error| error.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_request_and_notification() {
        let request = Request::parse(r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#)
            .expect("request");
        assert_eq!(request.id, Some(json!(7)));
        assert_eq!(request.method, "ping");
        assert_eq!(request.params, json!({}));
        assert!(!request.is_notification());

        let notification =
            Request::parse(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .expect("notification");
        assert!(notification.is_notification());
    }

    #[test]
    fn malformed_json_is_a_parse_error_with_null_id() {
        let response = Request::parse("{not json").expect_err("parse error");
        assert_eq!(response.error_code(), Some(PARSE_ERROR));
        assert_eq!(response.id, Value::Null);
    }

    #[test]
    fn structural_problems_are_invalid_requests() {
        for line in [
            r#"[1, 2]"#,
            r#"{"id": 1, "method": "ping"}"#,
            r#"{"jsonrpc": "2.0", "id": 2, "method": 5}"#,
        ] {
            let response = Request::parse(line).expect_err("invalid");
            assert_eq!(response.error_code(), Some(INVALID_REQUEST), "{line}");
        }

        let response =
            Request::parse(r#"{"jsonrpc": "2.0", "id": "abc"}"#).expect_err("invalid");
        assert_eq!(response.id, json!("abc"));
    }

    #[test]
    fn success_response_omits_error_field() {
        let value = serde_json::to_value(Response::ok(json!(1), json!({}))).expect("serialize");
        assert_eq!(value["jsonrpc"], "2.0");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn library_errors_map_to_codes() {
        assert_eq!(
            RpcError::from(Error::NotFound("x".to_owned())).code,
            INVALID_PARAMS
        );
        assert_eq!(
            RpcError::from(Error::Tool("x".to_owned())).code,
            INTERNAL_ERROR
        );
    }
}
