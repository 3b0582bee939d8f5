//! Request signing.

use reqwest::RequestBuilder;

/// Applies caller-supplied credentials to every outgoing request.
pub trait RequestSigner: Send + Sync + 'static {
    fn sign(&self, request: RequestBuilder) -> RequestBuilder;
}

/// Sends requests unsigned. Useful against local emulators.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl RequestSigner for NoAuth {
    fn sign(&self, request: RequestBuilder) -> RequestBuilder {
        request
    }
}

/// Signs requests with a static OAuth bearer token.
#[derive(Clone)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

impl RequestSigner for BearerToken {
    fn sign(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.0)
    }
}
