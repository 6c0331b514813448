use crate::config::BodySigning;
use crate::request::{BodyEncoding, EdgeRequest, RequestBody};
use edgesign_core::hash::base64_decode;
use edgesign_core::{CanonicalRequest, Error, Result};
use http::Method;
use log::debug;

/// Canonicalizer turns an [`EdgeRequest`] into the [`CanonicalRequest`] that gets signed.
#[derive(Debug, Clone, Default)]
pub struct Canonicalizer {
    signing_host: Option<String>,
    body_signing: BodySigning,
}

impl Canonicalizer {
    /// Create a canonicalizer that signs for the origin's domain name.
    pub fn new(body_signing: BodySigning) -> Self {
        Self {
            signing_host: None,
            body_signing,
        }
    }

    /// Sign for `host` regardless of the origin.
    pub fn with_signing_host(mut self, host: impl Into<String>) -> Self {
        let host = host.into();
        self.signing_host = (!host.is_empty()).then_some(host);
        self
    }

    /// Build the canonical form of `req`.
    ///
    /// A truncated body is rejected before anything else is looked at.
    pub fn canonicalize(&self, req: &EdgeRequest) -> Result<CanonicalRequest> {
        if req.body.as_ref().is_some_and(|b| b.input_truncated) {
            return Err(Error::body_truncated(
                "request body was truncated and cannot be signed",
            ));
        }

        let method = Method::from_bytes(req.method.as_bytes())?;
        if !req.uri.starts_with('/') {
            return Err(Error::request_invalid(format!(
                "request uri must start with '/', got '{}'",
                req.uri
            )));
        }

        let host = self
            .signing_host
            .as_deref()
            .or_else(|| req.origin_domain_name())
            .ok_or_else(|| Error::config_invalid("no signing host: origin has no domain name"))?;

        let body = match &req.body {
            Some(body) => self.decode_body(body)?,
            None => None,
        };
        debug!(
            "canonicalized {} {} for host {host} with {} body bytes",
            method,
            req.uri,
            body.as_ref().map_or(0, Vec::len)
        );

        Ok(CanonicalRequest::new(method, host, req.uri.as_str()).with_body(body))
    }

    fn decode_body(&self, body: &RequestBody) -> Result<Option<Vec<u8>>> {
        if body.data.is_empty() {
            return Ok(None);
        }

        let bs = match body.encoding {
            BodyEncoding::Base64 => base64_decode(&body.data)?,
            BodyEncoding::Text => body.data.as_bytes().to_vec(),
        };
        let bs = match self.body_signing {
            BodySigning::Utf8Text => match String::from_utf8(bs) {
                Ok(s) => s.into_bytes(),
                Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned().into_bytes(),
            },
            BodySigning::RawBytes => bs,
        };
        Ok(Some(bs))
    }
}
