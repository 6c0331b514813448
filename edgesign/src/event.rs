use crate::EdgeRequest;
use edgesign_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Origin-request event delivered by the CDN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudFrontEvent {
    /// Event records, the CDN always sends exactly one.
    #[serde(rename = "Records")]
    pub records: Vec<CloudFrontRecord>,
}

/// One event record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudFrontRecord {
    /// Record payload.
    pub cf: CloudFrontPayload,
}

/// Record payload: distribution metadata and the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudFrontPayload {
    /// Distribution metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<EventConfig>,
    /// The request on its way to the origin.
    pub request: EdgeRequest,
}

/// Distribution metadata attached to every event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventConfig {
    /// Distribution domain name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_domain_name: Option<String>,
    /// Distribution id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_id: Option<String>,
    /// Event type, `origin-request` for this interceptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    /// Request id assigned by the CDN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl CloudFrontEvent {
    /// Parse an event from its JSON form.
    pub fn from_json(bs: &[u8]) -> Result<Self> {
        serde_json::from_slice(bs)
            .map_err(|e| Error::request_invalid("invalid event payload").with_source(e))
    }

    /// Take the request and its distribution metadata out of the first record.
    pub fn into_request(self) -> Result<(EventConfig, EdgeRequest)> {
        let record = self
            .records
            .into_iter()
            .next()
            .ok_or_else(|| Error::request_invalid("event contains no records"))?;
        Ok((record.cf.config.unwrap_or_default(), record.cf.request))
    }
}
