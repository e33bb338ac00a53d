//! The response shape shared by both functions.
//!
//! API Gateway's Lambda-proxy integration expects a plain function to return
//! `{statusCode, headers, body}` with the body already encoded as a string.
//! The "bare" executable returns this struct directly; the "proxy event"
//! executable turns it into a real HTTP response with [`ProxyResponse::into_http`].

use lambda_http::{Body, Response};
use lambda_runtime::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// JSON text, not a JSON value.
    pub body: String,
}

impl ProxyResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        ProxyResponse {
            status_code: 200,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn into_http(self) -> Result<Response<Body>, Error> {
        let mut builder = Response::builder()
            .status(self.status_code)
            .header("Content-Type", "application/json");

        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        Ok(builder.body(Body::from(self.body))?)
    }
}
