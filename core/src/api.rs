use crate::CanonicalRequest;
use crate::Context;
use crate::Result;
use crate::SignatureResult;
use std::fmt::Debug;

/// SigningCredential is the trait used by signer as the signing credential.
pub trait SigningCredential: Clone + Debug + Send + Sync + Unpin + 'static {
    /// Check if the signing credential is valid.
    fn is_valid(&self) -> bool;
}

/// ProvideCredential is the trait used to resolve service credentials.
///
/// Credentials are resolved before the interceptor is built and stay fixed
/// for its lifetime.
#[async_trait::async_trait]
pub trait ProvideCredential: Debug + Send + Sync + Unpin + 'static {
    /// Credential returned by this loader.
    type Credential: Send + Sync + Unpin + 'static;

    /// Load signing credential from current env.
    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>>;
}

/// SignRequest is the trait used to sign a canonical request.
#[async_trait::async_trait]
pub trait SignRequest: Debug + Send + Sync + Unpin + 'static {
    /// Credential used by this signer.
    type Credential: Send + Sync + Unpin + 'static;

    /// Compute the headers that authenticate `req`.
    ///
    /// The request itself is left untouched; callers merge the returned
    /// headers into whatever they forward.
    async fn sign_request(
        &self,
        req: &CanonicalRequest,
        credential: &Self::Credential,
    ) -> Result<SignatureResult>;
}
