use edgesign_core::HeaderSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An origin-bound request as the CDN hands it to the interceptor.
///
/// Serializes to and from the CDN's own JSON shape so that fields this crate
/// never looks at are forwarded untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRequest {
    /// Viewer address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    /// HTTP method.
    pub method: String,
    /// Request path, starting with `/`.
    pub uri: String,
    /// Raw query string without the leading `?`. Forwarded, never signed.
    #[serde(default)]
    pub querystring: String,
    /// Request headers.
    #[serde(default)]
    pub headers: HeaderSet,
    /// The origin this request is dispatched to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
    /// Request body, only present when the CDN is configured to include it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestBody>,
}

impl EdgeRequest {
    /// Create a request without origin or body.
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            client_ip: None,
            method: method.into(),
            uri: uri.into(),
            querystring: String::new(),
            headers: HeaderSet::new(),
            origin: None,
            body: None,
        }
    }

    /// Set the headers.
    pub fn with_headers(mut self, headers: HeaderSet) -> Self {
        self.headers = headers;
        self
    }

    /// Dispatch to a custom origin at `domain_name`.
    pub fn with_custom_origin(mut self, domain_name: impl Into<String>) -> Self {
        self.origin = Some(Origin {
            custom: Some(OriginTarget::new(domain_name)),
            s3: None,
        });
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Domain name of the custom origin, the host requests are signed for.
    pub fn origin_domain_name(&self) -> Option<&str> {
        self.origin
            .as_ref()
            .and_then(|o| o.custom.as_ref())
            .map(|c| c.domain_name.as_str())
            .filter(|v| !v.is_empty())
    }
}

/// Origin descriptor, exactly one of the targets is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    /// Custom (HTTP) origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<OriginTarget>,
    /// Bucket origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<OriginTarget>,
}

/// One origin target. Only the domain name is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginTarget {
    /// DNS name of the origin.
    pub domain_name: String,
    /// Port, protocol, timeouts, custom headers and so on.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OriginTarget {
    /// Create a target with only a domain name.
    pub fn new(domain_name: impl Into<String>) -> Self {
        Self {
            domain_name: domain_name.into(),
            extra: Map::new(),
        }
    }
}

/// Transport encoding of [`RequestBody::data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    /// Standard base64.
    #[default]
    Base64,
    /// Plain text.
    Text,
}

/// Request body as included by the CDN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    /// Set when the CDN cut the body off at its size limit.
    #[serde(default)]
    pub input_truncated: bool,
    /// Whether the body may be replaced (`read-only` or `replace`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Encoding of `data`.
    #[serde(default)]
    pub encoding: BodyEncoding,
    /// Encoded body.
    #[serde(default)]
    pub data: String,
}

impl RequestBody {
    /// A base64 encoded body.
    pub fn base64(data: impl Into<String>) -> Self {
        Self {
            input_truncated: false,
            action: None,
            encoding: BodyEncoding::Base64,
            data: data.into(),
        }
    }

    /// A plain text body.
    pub fn text(data: impl Into<String>) -> Self {
        Self {
            encoding: BodyEncoding::Text,
            ..Self::base64(data)
        }
    }

    /// Mark the body as truncated.
    pub fn truncated(mut self) -> Self {
        self.input_truncated = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const REQUEST: &str = r#"{
        "clientIp": "203.0.113.178",
        "method": "POST",
        "uri": "/api/widgets",
        "querystring": "size=LARGE",
        "headers": {
            "host": [{"key": "Host", "value": "d111111abcdef8.cloudfront.net"}],
            "x-auth": [{"key": "X-Auth", "value": "Bearer abc"}]
        },
        "origin": {
            "custom": {
                "customHeaders": {},
                "domainName": "abcdef1234.execute-api.us-east-1.amazonaws.com",
                "keepaliveTimeout": 5,
                "path": "",
                "port": 443,
                "protocol": "https",
                "readTimeout": 30,
                "sslProtocols": ["TLSv1.2"]
            }
        },
        "body": {
            "action": "read-only",
            "data": "eyJuYW1lIjoiZ2VhciJ9",
            "encoding": "base64",
            "inputTruncated": false
        }
    }"#;

    #[test]
    fn test_deserialize() {
        let req: EdgeRequest = serde_json::from_str(REQUEST).unwrap();
        assert_eq!(req.method, "POST");
        assert_eq!(req.uri, "/api/widgets");
        assert_eq!(req.querystring, "size=LARGE");
        assert_eq!(
            req.origin_domain_name(),
            Some("abcdef1234.execute-api.us-east-1.amazonaws.com")
        );
        assert_eq!(req.headers.first_value("X-Auth"), Some("Bearer abc"));

        let body = req.body.unwrap();
        assert_eq!(body.encoding, BodyEncoding::Base64);
        assert!(!body.input_truncated);
        assert_eq!(body.action.as_deref(), Some("read-only"));
    }

    #[test]
    fn test_round_trip_keeps_unknown_origin_fields() {
        let req: EdgeRequest = serde_json::from_str(REQUEST).unwrap();
        let expected: Value = serde_json::from_str(REQUEST).unwrap();
        assert_eq!(serde_json::to_value(&req).unwrap(), expected);
    }

    #[test]
    fn test_s3_origin_has_no_signing_host() {
        let req: EdgeRequest = serde_json::from_str(
            r#"{"method":"GET","uri":"/index.html","origin":{"s3":{"domainName":"bucket.s3.amazonaws.com","path":""}}}"#,
        )
        .unwrap();
        assert_eq!(req.origin_domain_name(), None);
        assert!(req.headers.is_empty());
    }
}
