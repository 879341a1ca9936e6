//! Request Extension Trait for Auth Context Access
//!
//! Gives handlers access to whatever the auth callback stored in the request.

use crate::credentials::OAuthCredentials;
use tonic::{Request, Status};

/// Extension trait for reading values the auth callback put into the request
///
/// The auth callback returns the request that the handler receives, so any
/// value inserted into its extensions (a verified client, a user id, the raw
/// credentials) travels with the call. This trait is implemented for all
/// `Request<T>` types.
///
/// ## Usage
///
/// ```rust,no_run
/// use grpc_oauth::AuthContextExt;
/// use tonic::{Request, Response, Status};
///
/// #[derive(Clone)]
/// struct ClientId(String);
///
/// async fn handler(request: Request<()>) -> Result<Response<()>, Status> {
///     let client = request.auth_context::<ClientId>()?;
///     println!("called by {}", client.0);
///     Ok(Response::new(()))
/// }
/// ```
pub trait AuthContextExt {
    /// Value of type `V` stored by the auth callback
    ///
    /// ## Errors
    ///
    /// Returns `Status::unauthenticated` if no such value was stored, which
    /// means the interceptor is not attached or the callback did not record
    /// an identity.
    fn auth_context<V>(&self) -> Result<&V, Status>
    where
        V: Send + Sync + 'static;

    /// Credentials forwarded into the request by the auth callback
    ///
    /// ## Errors
    ///
    /// Returns `Status::unauthenticated` if the callback did not insert them.
    fn oauth_credentials(&self) -> Result<&OAuthCredentials, Status>;
}

impl<T> AuthContextExt for Request<T> {
    fn auth_context<V>(&self) -> Result<&V, Status>
    where
        V: Send + Sync + 'static,
    {
        self.extensions().get::<V>().ok_or_else(|| {
            Status::unauthenticated("No auth context found. Ensure OAuthServerInterceptor is attached.")
        })
    }

    fn oauth_credentials(&self) -> Result<&OAuthCredentials, Status> {
        self.auth_context::<OAuthCredentials>()
    }
}
