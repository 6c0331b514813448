use std::collections::HashSet;
use std::fmt::{Debug, Formatter};

use crate::constants::MAX_JWT_LEEWAY;
use edgesign_core::utils::{strip_bearer, Redact};
use edgesign_core::{Error, HeaderSet, Result};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use log::debug;
use serde_json::{Map, Value};

/// Verified token claims.
///
/// Claims only prove the caller holds a valid credential, nothing in them
/// influences signing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Get a claim by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The `sub` claim, if it is a string.
    pub fn subject(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }
}

/// CredentialValidator verifies the bearer token carried in a designated header.
///
/// Tokens are HMAC-signed JWTs (HS256, HS384 or HS512) checked against a
/// shared secret. `exp` and `nbf` are enforced when present; no claim is
/// required.
#[derive(Clone)]
pub struct CredentialValidator {
    header: String,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl Debug for CredentialValidator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("CredentialValidator")
            .field("header", &self.header)
            .field("validation", &self.validation)
            .finish()
    }
}

impl CredentialValidator {
    /// Create a validator reading `header` and verifying against `secret`.
    pub fn new(header: &str, secret: &str, leeway: u64) -> Result<Self> {
        if header.trim().is_empty() {
            return Err(Error::config_invalid("credential header must not be empty"));
        }
        if secret.is_empty() {
            return Err(Error::config_invalid("jwt secret must not be empty"));
        }
        if leeway > MAX_JWT_LEEWAY {
            return Err(Error::config_invalid(format!(
                "jwt leeway must be at most {MAX_JWT_LEEWAY} seconds, got {leeway}"
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = leeway;

        Ok(Self {
            header: header.trim().to_ascii_lowercase(),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Name of the header the credential is read from.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Extract and verify the credential from `headers`.
    ///
    /// - `CredentialMissing` if the header is absent or carries no token.
    /// - `CredentialInvalid` if the token does not verify.
    pub fn verify(&self, headers: &HeaderSet) -> Result<Claims> {
        let Some(value) = headers.first_value(&self.header) else {
            debug!("credential header {} is missing", self.header);
            return Err(Error::credential_missing(format!(
                "{} header not found in request",
                self.header
            )));
        };

        let token = strip_bearer(value);
        if token.is_empty() {
            debug!("credential header {} is empty", self.header);
            return Err(Error::credential_missing(format!(
                "{} header is empty",
                self.header
            )));
        }

        let data = jsonwebtoken::decode::<Map<String, Value>>(
            token,
            &self.decoding_key,
            &self.validation,
        )
        .map_err(|e| {
            debug!("credential {:?} failed verification: {e}", Redact::from(token));
            Error::credential_invalid(format!("credential verification failed: {e}"))
                .with_source(e)
        })?;

        let claims = Claims(data.claims);
        debug!("credential verified for subject {:?}", claims.subject());
        Ok(claims)
    }
}
