//! Verify bearer credentials and sign origin-bound requests at the CDN edge.
//!
//! An [`Interceptor`] runs once per request ahead of origin dispatch. For
//! paths on the protected surface it verifies the bearer token carried in a
//! designated header, then computes AWS SigV4 headers for the request and
//! merges them into the outgoing header set. Everything else passes through
//! untouched.
//!
//! ```no_run
//! use edgesign::{CloudFrontEvent, Config, Interceptor};
//! use edgesign_core::{Context, OsEnv};
//!
//! # async fn example(payload: &[u8]) -> edgesign_core::Result<()> {
//! let ctx = Context::new().with_env(OsEnv);
//! let interceptor = Interceptor::from_config(&ctx, Config::default()).await?;
//!
//! let event = CloudFrontEvent::from_json(payload)?;
//! let forwarded = interceptor.handle_event(event).await?;
//! # let _ = forwarded;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod constants;

mod config;
pub use config::{BodySigning, Config};

mod router;
pub use router::Router;

mod credential;
pub use credential::{Claims, CredentialValidator};

mod request;
pub use request::{BodyEncoding, EdgeRequest, Origin, OriginTarget, RequestBody};

mod canonical;
pub use canonical::Canonicalizer;

mod event;
pub use event::{CloudFrontEvent, CloudFrontPayload, CloudFrontRecord, EventConfig};

mod interceptor;
pub use interceptor::Interceptor;

pub use edgesign_aws_v4::{Credential, UriEncoding};
