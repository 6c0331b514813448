use crate::constants::*;
use edgesign_aws_v4::UriEncoding;
use edgesign_core::utils::Redact;
use edgesign_core::{Context, Error, Result};
use std::fmt::{Debug, Formatter};
use std::str::FromStr;

/// How a decoded body is fed into the payload hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodySigning {
    /// Interpret the bytes as UTF-8 (invalid sequences become U+FFFD) and
    /// sign the resulting text.
    #[default]
    Utf8Text,
    /// Sign the decoded bytes as they are.
    RawBytes,
}

impl FromStr for BodySigning {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "utf8" | "utf-8" => Ok(BodySigning::Utf8Text),
            "raw" | "bytes" => Ok(BodySigning::RawBytes),
            v => Err(Error::config_invalid(format!(
                "body signing must be 'text' or 'raw', got '{v}'"
            ))),
        }
    }
}

/// Config for the interceptor.
///
/// Everything is resolved before the first request and never re-read.
/// Unset fields fall back to the defaults documented on each accessor.
#[derive(Clone, Default)]
pub struct Config {
    /// Shared secret the bearer credential is verified against.
    pub jwt_secret: Option<String>,
    /// Allowed clock skew in seconds for `exp` and `nbf`, defaults to 0.
    pub jwt_leeway: Option<u64>,
    /// Header carrying the bearer credential, defaults to `x-auth`.
    pub credential_header: Option<String>,
    /// Region the signature is scoped to.
    pub region: Option<String>,
    /// Service the signature is scoped to, defaults to `execute-api`.
    pub service: Option<String>,
    /// Static access key id. Loaded from env by the credential provider if unset.
    pub access_key_id: Option<String>,
    /// Static secret access key.
    pub secret_access_key: Option<String>,
    /// Static session token.
    pub session_token: Option<String>,
    /// First path segments that are protected.
    pub protected_segments: Option<Vec<String>>,
    /// Full regular expression for protected paths, overrides the segments.
    pub protected_pattern: Option<String>,
    /// Host to sign for instead of the origin's domain name.
    pub signing_host: Option<String>,
    /// How the body is hashed, defaults to UTF-8 text.
    pub body_signing: Option<BodySigning>,
    /// How the path is encoded into the canonical URI, defaults to double.
    pub uri_encoding: Option<UriEncoding>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("jwt_secret", &Redact::from(&self.jwt_secret))
            .field("jwt_leeway", &self.jwt_leeway)
            .field("credential_header", &self.credential_header)
            .field("region", &self.region)
            .field("service", &self.service)
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("secret_access_key", &Redact::from(&self.secret_access_key))
            .field("session_token", &Redact::from(&self.session_token))
            .field("protected_segments", &self.protected_segments)
            .field("protected_pattern", &self.protected_pattern)
            .field("signing_host", &self.signing_host)
            .field("body_signing", &self.body_signing)
            .field("uri_encoding", &self.uri_encoding)
            .finish()
    }
}

impl Config {
    /// Load config from environment variables.
    ///
    /// Fields already set are kept. Service credentials are not read here,
    /// they are resolved by a credential provider.
    pub fn from_env(mut self, ctx: &Context) -> Result<Self> {
        if self.jwt_secret.is_none() {
            self.jwt_secret = ctx.env_var_non_empty(JWT_SECRET);
        }
        if self.jwt_leeway.is_none() {
            if let Some(v) = ctx.env_var_non_empty(EDGESIGN_JWT_LEEWAY) {
                let leeway = v.trim().parse::<u64>().map_err(|e| {
                    Error::config_invalid(format!("{EDGESIGN_JWT_LEEWAY} must be seconds"))
                        .with_source(e)
                })?;
                self.jwt_leeway = Some(leeway);
            }
        }
        if self.credential_header.is_none() {
            self.credential_header = ctx.env_var_non_empty(EDGESIGN_CREDENTIAL_HEADER);
        }
        if self.region.is_none() {
            self.region = ctx
                .env_var_non_empty(AWS_REGION)
                .or_else(|| ctx.env_var_non_empty(AWS_DEFAULT_REGION));
        }
        if self.service.is_none() {
            self.service = ctx.env_var_non_empty(EDGESIGN_SERVICE);
        }
        // Segments and pattern exclude each other, an explicit one keeps
        // the other from being loaded.
        let route_set = self.protected_segments.is_some() || self.protected_pattern.is_some();
        if !route_set {
            self.protected_segments = ctx.env_var_non_empty(EDGESIGN_PROTECTED_SEGMENTS).map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            });
        }
        if !route_set {
            self.protected_pattern = ctx.env_var_non_empty(EDGESIGN_PROTECTED_PATTERN);
        }
        if self.signing_host.is_none() {
            self.signing_host = ctx.env_var_non_empty(EDGESIGN_SIGNING_HOST);
        }
        if self.body_signing.is_none() {
            if let Some(v) = ctx.env_var_non_empty(EDGESIGN_BODY_SIGNING) {
                self.body_signing = Some(v.parse()?);
            }
        }
        if self.uri_encoding.is_none() {
            if let Some(v) = ctx.env_var_non_empty(EDGESIGN_URI_ENCODING) {
                self.uri_encoding = Some(match v.trim().to_ascii_lowercase().as_str() {
                    "double" => UriEncoding::Double,
                    "single" => UriEncoding::Single,
                    v => {
                        return Err(Error::config_invalid(format!(
                            "uri encoding must be 'double' or 'single', got '{v}'"
                        )))
                    }
                });
            }
        }

        Ok(self)
    }

    /// Set the shared verification secret.
    pub fn with_jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = Some(secret.into());
        self
    }

    /// Set the allowed clock skew for time claims.
    pub fn with_jwt_leeway(mut self, seconds: u64) -> Self {
        self.jwt_leeway = Some(seconds);
        self
    }

    /// Set the header carrying the bearer credential.
    pub fn with_credential_header(mut self, header: impl Into<String>) -> Self {
        self.credential_header = Some(header.into());
        self
    }

    /// Set the signing region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the signing service.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Set static service credentials.
    pub fn with_static_credential(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self.session_token = session_token;
        self
    }

    /// Set the protected first path segments.
    pub fn with_protected_segments<S: Into<String>>(
        mut self,
        segments: impl IntoIterator<Item = S>,
    ) -> Self {
        self.protected_segments = Some(segments.into_iter().map(Into::into).collect());
        self
    }

    /// Set a full regular expression for protected paths.
    pub fn with_protected_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.protected_pattern = Some(pattern.into());
        self
    }

    /// Sign for `host` instead of the origin's domain name.
    pub fn with_signing_host(mut self, host: impl Into<String>) -> Self {
        self.signing_host = Some(host.into());
        self
    }

    /// Set how the body is hashed.
    pub fn with_body_signing(mut self, body_signing: BodySigning) -> Self {
        self.body_signing = Some(body_signing);
        self
    }

    /// Set how the canonical URI is encoded.
    pub fn with_uri_encoding(mut self, uri_encoding: UriEncoding) -> Self {
        self.uri_encoding = Some(uri_encoding);
        self
    }

    /// Check that the config is complete enough to build an interceptor.
    pub fn validate(&self) -> Result<()> {
        self.jwt_secret()?;
        self.region()?;
        if self.jwt_leeway() > MAX_JWT_LEEWAY {
            return Err(Error::config_invalid(format!(
                "jwt leeway must be at most {MAX_JWT_LEEWAY} seconds"
            )));
        }

        let has_ak = self.access_key_id.as_deref().is_some_and(|v| !v.is_empty());
        let has_sk = self
            .secret_access_key
            .as_deref()
            .is_some_and(|v| !v.is_empty());
        if has_ak != has_sk {
            return Err(Error::config_invalid(
                "access key id and secret access key must be set together",
            ));
        }

        if self.protected_segments.is_some() && self.protected_pattern.is_some() {
            return Err(Error::config_invalid(
                "protected segments and protected pattern are mutually exclusive",
            ));
        }
        if self.service().is_empty() || self.credential_header().trim().is_empty() {
            return Err(Error::config_invalid(
                "service and credential header must not be empty",
            ));
        }
        Ok(())
    }

    /// Header carrying the bearer credential.
    pub fn credential_header(&self) -> &str {
        self.credential_header
            .as_deref()
            .unwrap_or(DEFAULT_CREDENTIAL_HEADER)
    }

    /// Service the signature is scoped to.
    pub fn service(&self) -> &str {
        self.service.as_deref().unwrap_or(DEFAULT_SERVICE)
    }

    /// Clock skew allowed when checking time claims.
    pub fn jwt_leeway(&self) -> u64 {
        self.jwt_leeway.unwrap_or(0)
    }

    /// How the body is hashed.
    pub fn body_signing(&self) -> BodySigning {
        self.body_signing.unwrap_or_default()
    }

    /// How the canonical URI is encoded.
    pub fn uri_encoding(&self) -> UriEncoding {
        self.uri_encoding.unwrap_or_default()
    }

    /// Protected first path segments.
    pub fn protected_segments(&self) -> Vec<String> {
        match &self.protected_segments {
            Some(v) => v.clone(),
            None => DEFAULT_PROTECTED_SEGMENTS
                .iter()
                .map(|v| v.to_string())
                .collect(),
        }
    }

    /// Shared verification secret.
    pub fn jwt_secret(&self) -> Result<&str> {
        self.jwt_secret
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::config_invalid("jwt secret is required"))
    }

    /// Signing region.
    pub fn region(&self) -> Result<&str> {
        self.region
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::config_invalid("region is required"))
    }
}
