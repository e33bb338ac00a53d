//! The "hello" function: a fixed greeting with wide-open CORS.
//!
//! Useful as a smoke test of the API Gateway wiring; nothing about the request
//! is looked at.

use serde_json::Value;

use crate::response::ProxyResponse;

const HELLO_BODY: &str = r#"{"message": "Hello World"}"#;

pub fn handle_hello(_payload: Option<Value>) -> ProxyResponse {
    ProxyResponse::ok(HELLO_BODY)
        .with_header("Access-Control-Allow-Origin", "*")
        .with_header("Access-Control-Allow-Headers", "*")
}
