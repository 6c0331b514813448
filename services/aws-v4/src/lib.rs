//! AWS SigV4 signing for edgesign.
//!
//! [`RequestSigner`] computes the SigV4 headers for a
//! [`CanonicalRequest`](edgesign_core::CanonicalRequest). Service credentials
//! are resolved once through [`EnvCredentialProvider`] or
//! [`StaticCredentialProvider`] and passed to every signing call.
//!
//! ```
//! use edgesign_aws_v4::{Credential, RequestSigner};
//! use edgesign_core::{CanonicalRequest, SignRequest};
//!
//! # async fn example() -> edgesign_core::Result<()> {
//! let signer = RequestSigner::new("execute-api", "us-east-1");
//! let cred = Credential::new("access_key_id", "secret_access_key");
//! let req = CanonicalRequest::new(
//!     http::Method::GET,
//!     "abcdef1234.execute-api.us-east-1.amazonaws.com",
//!     "/api/widgets",
//! );
//!
//! let headers = signer.sign_request(&req, &cred).await?;
//! assert!(headers.get("authorization").is_some());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod constants;
pub use constants::{
    AUTHORIZATION, AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, AWS_SESSION_TOKEN, HOST,
    X_AMZ_CONTENT_SHA_256, X_AMZ_DATE, X_AMZ_SECURITY_TOKEN,
};

mod credential;
pub use credential::Credential;

mod provide_credential;
pub use provide_credential::{EnvCredentialProvider, StaticCredentialProvider};

mod sign_request;
pub use sign_request::{RequestSigner, UriEncoding};
