use std::fmt::Debug;
use std::fmt::Formatter;

use http::Method;

use crate::hash::hex_sha256;
use crate::hash::EMPTY_SHA256;

/// The exact request that gets signed.
///
/// Built once per invocation and never mutated afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    /// HTTP method.
    pub method: Method,
    /// Logical upstream host the signature is scoped to.
    pub host: String,
    /// HTTP path, exactly as received.
    pub path: String,
    /// Headers taking part in the signature, lower-cased names.
    ///
    /// Always contains `host`.
    pub headers: Vec<(String, String)>,
    /// Decoded body bytes.
    pub body: Option<Vec<u8>>,
}

impl CanonicalRequest {
    /// Create a canonical request with only the host header.
    pub fn new(method: Method, host: impl Into<String>, path: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            method,
            headers: vec![("host".to_string(), host.clone())],
            host,
            path: path.into(),
            body: None,
        }
    }

    /// Attach the decoded body.
    pub fn with_body(mut self, body: Option<Vec<u8>>) -> Self {
        self.body = body;
        self
    }

    /// Hex encoded SHA256 of the body, or of the empty payload.
    pub fn payload_hash(&self) -> String {
        match &self.body {
            Some(bs) => hex_sha256(bs),
            None => EMPTY_SHA256.to_string(),
        }
    }
}

impl Debug for CanonicalRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanonicalRequest")
            .field("method", &self.method)
            .field("host", &self.host)
            .field("path", &self.path)
            .field("headers", &self.headers)
            .field("body_len", &self.body.as_ref().map(|v| v.len()))
            .finish()
    }
}
