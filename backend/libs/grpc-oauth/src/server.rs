//! Server-side OAuth Interceptor
//!
//! Extracts OAuth credentials from incoming gRPC requests and hands them to
//! a user-supplied auth callback before the handler runs.

use crate::credentials::{extract_credentials, OAuthCredentials};
use std::fmt;
use std::sync::Arc;
use tonic::service::Interceptor;
use tonic::{Request, Status};
use tracing::{debug, warn};

/// Auth callback invoked with the credentials of every inbound call
///
/// The callback receives the request (metadata and extensions) together with
/// the extracted credentials. Returning `Ok` lets the call through with the
/// returned request, so any extension inserted here (a verified identity,
/// claims, the credentials themselves) is visible to the handler. Returning
/// `Err` aborts the call with that status and the handler is never invoked.
///
/// Implemented for every `Fn(Request<()>, OAuthCredentials) -> Result<Request<()>, Status>`.
pub trait AuthFn: Send + Sync + 'static {
    fn authenticate(
        &self,
        request: Request<()>,
        credentials: OAuthCredentials,
    ) -> Result<Request<()>, Status>;
}

impl<F> AuthFn for F
where
    F: Fn(Request<()>, OAuthCredentials) -> Result<Request<()>, Status> + Send + Sync + 'static,
{
    fn authenticate(
        &self,
        request: Request<()>,
        credentials: OAuthCredentials,
    ) -> Result<Request<()>, Status> {
        self(request, credentials)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CallKind {
    Unary,
    Stream,
}

impl CallKind {
    fn as_str(self) -> &'static str {
        match self {
            CallKind::Unary => "unary",
            CallKind::Stream => "stream",
        }
    }
}

/// Server-side interceptor that extracts OAuth credentials and runs the auth callback
///
/// This interceptor:
/// 1. Parses `bearer` / `basic` values out of the `authorization` metadata
/// 2. Invokes the auth callback with the request and the credentials
/// 3. Returns the request produced by the callback to the handler
///
/// ## Design
///
/// - **Fail-fast**: a malformed `basic` value returns `Status::unauthenticated`
///   before the callback runs
/// - **Policy in the callback**: missing credentials are not rejected here
/// - **Cloneable**: the callback lives behind an `Arc`, so the interceptor can be
///   attached to as many services as needed
///
/// ## Usage
///
/// ```rust,no_run
/// use grpc_oauth::{unary_server_interceptor, OAuthCredentials};
/// use tonic::{Request, Status};
///
/// let interceptor = unary_server_interceptor(
///     |request: Request<()>, creds: OAuthCredentials| {
///         if creds.access_token() != "expected-token" {
///             return Err(Status::unauthenticated("invalid token"));
///         }
///         Ok(request)
///     },
/// );
///
/// // let service = MyServiceServer::with_interceptor(MyService, interceptor);
/// ```
#[derive(Clone)]
pub struct OAuthServerInterceptor {
    auth_fn: Arc<dyn AuthFn>,
    kind: CallKind,
}

impl OAuthServerInterceptor {
    /// Interceptor for unary calls
    pub fn unary(auth_fn: impl AuthFn) -> Self {
        Self {
            auth_fn: Arc::new(auth_fn),
            kind: CallKind::Unary,
        }
    }

    /// Interceptor for streaming calls
    ///
    /// tonic runs interceptors once per call before the first message is
    /// read, so the callback runs once at stream-open time and the request it
    /// returns carries the stream's extensions for its whole lifetime.
    pub fn stream(auth_fn: impl AuthFn) -> Self {
        Self {
            auth_fn: Arc::new(auth_fn),
            kind: CallKind::Stream,
        }
    }

    fn authenticate(&self, request: Request<()>) -> Result<Request<()>, Status> {
        let credentials = extract_credentials(request.metadata()).map_err(|e| {
            warn!(call = self.kind.as_str(), error = %e, "Rejected malformed credentials");
            Status::from(e)
        })?;

        let request = self
            .auth_fn
            .authenticate(request, credentials)
            .map_err(|status| {
                warn!(
                    call = self.kind.as_str(),
                    code = ?status.code(),
                    "Auth callback rejected call"
                );
                status
            })?;

        debug!(call = self.kind.as_str(), "Call authenticated");

        Ok(request)
    }
}

impl Interceptor for OAuthServerInterceptor {
    fn call(&mut self, request: Request<()>) -> Result<Request<()>, Status> {
        self.authenticate(request)
    }
}

impl fmt::Debug for OAuthServerInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthServerInterceptor")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Build the interceptor for unary calls from an auth callback
pub fn unary_server_interceptor<F>(f: F) -> OAuthServerInterceptor
where
    F: Fn(Request<()>, OAuthCredentials) -> Result<Request<()>, Status> + Send + Sync + 'static,
{
    OAuthServerInterceptor::unary(f)
}

/// Build the interceptor for streaming calls from an auth callback
pub fn stream_server_interceptor<F>(f: F) -> OAuthServerInterceptor
where
    F: Fn(Request<()>, OAuthCredentials) -> Result<Request<()>, Status> + Send + Sync + 'static,
{
    OAuthServerInterceptor::stream(f)
}
