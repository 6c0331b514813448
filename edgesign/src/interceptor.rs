use crate::canonical::Canonicalizer;
use crate::config::Config;
use crate::credential::CredentialValidator;
use crate::event::CloudFrontEvent;
use crate::request::EdgeRequest;
use crate::router::Router;
use edgesign_aws_v4::{Credential, EnvCredentialProvider, RequestSigner, StaticCredentialProvider};
use edgesign_core::time::DateTime;
use edgesign_core::{Context, Error, HeaderSet, ProvideCredential, Result, SignRequest};
use log::{debug, error, info, warn};

/// Interceptor verifies and signs origin-bound requests.
///
/// Built once from a resolved [`Config`] and service [`Credential`], then
/// shared by every request. [`Interceptor::handle`] applies the failure
/// policy:
///
/// - paths outside the protected surface pass through unchanged.
/// - blocking errors (missing or invalid credential, truncated body) are
///   returned and no request is produced.
/// - every other error is logged and the request passes through unchanged.
#[derive(Debug, Clone)]
pub struct Interceptor {
    router: Router,
    validator: CredentialValidator,
    canonicalizer: Canonicalizer,
    signer: RequestSigner,
    credential: Credential,
}

impl Interceptor {
    /// Build an interceptor from `config` signing with `credential`.
    pub fn new(config: &Config, credential: Credential) -> Result<Self> {
        config.validate()?;

        let router = match &config.protected_pattern {
            Some(pattern) => Router::with_pattern(pattern)?,
            None => Router::new(&config.protected_segments())?,
        };
        let validator = CredentialValidator::new(
            config.credential_header(),
            config.jwt_secret()?,
            config.jwt_leeway(),
        )?;
        let mut canonicalizer = Canonicalizer::new(config.body_signing());
        if let Some(host) = &config.signing_host {
            canonicalizer = canonicalizer.with_signing_host(host);
        }
        let signer = RequestSigner::new(config.service(), config.region()?)
            .with_uri_encoding(config.uri_encoding());

        Ok(Self {
            router,
            validator,
            canonicalizer,
            signer,
            credential,
        })
    }

    /// Build an interceptor, resolving service credentials first.
    ///
    /// Static keys in `config` win; otherwise they are loaded from the
    /// environment in `ctx`.
    pub async fn from_config(ctx: &Context, config: Config) -> Result<Self> {
        let config = config.from_env(ctx)?;

        let credential = match (&config.access_key_id, &config.secret_access_key) {
            (Some(ak), Some(sk)) => {
                let mut provider = StaticCredentialProvider::new(ak, sk);
                if let Some(token) = &config.session_token {
                    provider = provider.with_session_token(token);
                }
                provider.provide_credential(ctx).await?
            }
            _ => EnvCredentialProvider::new().provide_credential(ctx).await?,
        };
        let credential = credential
            .ok_or_else(|| Error::config_invalid("no service credential could be loaded"))?;

        let interceptor = Self::new(&config, credential)?;
        info!(
            "interceptor ready for service {} in region {}",
            interceptor.signer.service(),
            interceptor.signer.region()
        );
        Ok(interceptor)
    }

    /// Fix the signing time.
    ///
    /// Only use this for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.signer = self.signer.with_time(time);
        self
    }

    /// Verify and sign `req` if its path is protected.
    ///
    /// Returns the request to forward, or the blocking error that rejects it.
    pub async fn handle(&self, req: EdgeRequest) -> Result<EdgeRequest> {
        if !self.router.should_intercept(&req.uri) {
            debug!("{} {} is not protected, passing through", req.method, req.uri);
            return Ok(req);
        }

        match self.sign(&req).await {
            Ok(headers) => Ok(EdgeRequest { headers, ..req }),
            Err(err) if err.is_blocking() => {
                warn!("rejected {} {}: {err}", req.method, req.uri);
                Err(err)
            }
            Err(err) => {
                error!(
                    "failed to sign {} {}, forwarding unsigned: {err:?}",
                    req.method, req.uri
                );
                Ok(req)
            }
        }
    }

    /// Verify the credential of `req` and compute its signed header set.
    ///
    /// Routing and the failure policy are not applied here.
    pub async fn sign(&self, req: &EdgeRequest) -> Result<HeaderSet> {
        self.validator.verify(&req.headers)?;

        let creq = self.canonicalizer.canonicalize(req)?;
        let signed = self.signer.sign_request(&creq, &self.credential).await?;
        debug!("signed {} {} with headers {:?}", req.method, req.uri, signed);

        Ok(req.headers.merge(&signed))
    }

    /// Handle a CDN origin-request event.
    pub async fn handle_event(&self, event: CloudFrontEvent) -> Result<EdgeRequest> {
        let (config, req) = event.into_request()?;
        debug!(
            "handling request {} from distribution {}",
            config.request_id.as_deref().unwrap_or("-"),
            config.distribution_id.as_deref().unwrap_or("-")
        );
        self.handle(req).await
    }

    /// Check if `path` is protected.
    pub fn should_intercept(&self, path: &str) -> bool {
        self.router.should_intercept(path)
    }
}
