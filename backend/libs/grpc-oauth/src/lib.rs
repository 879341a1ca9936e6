//! OAuth Credential Glue for gRPC Services
//!
//! This library moves OAuth2-style credentials between the `authorization`
//! metadata of gRPC calls and application code, in both directions.
//!
//! ## Core Components
//!
//! - **OAuthCredentials**: Bearer token and/or basic client id/secret parsed from a call
//! - **OAuthServerInterceptor**: Runs a user auth callback with the parsed credentials
//! - **OAuthChannel**: Channel that writes `Bearer` / `Basic` credentials into outgoing calls
//! - **CallCredentials**: Credentials for a single outgoing call
//! - **AuthContextExt**: Request extension trait for values stored by the auth callback
//!
//! ## What this library does not do
//!
//! Tokens and secrets are opaque strings. Validation, refresh, expiry,
//! revocation and scopes belong to the auth callback.
//!
//! ## Usage Example
//!
//! ### Server Side
//!
//! ```rust,no_run
//! use grpc_oauth::{unary_server_interceptor, AuthContextExt, OAuthCredentials};
//! use tonic::{Request, Response, Status};
//!
//! #[derive(Clone)]
//! struct ClientId(String);
//!
//! let interceptor = unary_server_interceptor(
//!     |mut request: Request<()>, creds: OAuthCredentials| {
//!         if creds.client_secret() != "expected-secret" {
//!             return Err(Status::unauthenticated("invalid client"));
//!         }
//!         let client = ClientId(creds.client_id().to_string());
//!         request.extensions_mut().insert(client);
//!         Ok(request)
//!     },
//! );
//! // let service = MyServiceServer::with_interceptor(MyService, interceptor);
//!
//! async fn handler(request: Request<()>) -> Result<Response<()>, Status> {
//!     let client = request.auth_context::<ClientId>()?;
//!     println!("called by {}", client.0);
//!     Ok(Response::new(()))
//! }
//! ```
//!
//! ### Client Side
//!
//! ```rust,no_run
//! use grpc_oauth::{per_rpc_client_id_credentials, with_per_rpc_token_credentials};
//! use tonic::transport::{ClientTlsConfig, Endpoint};
//! use tonic::Request;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoint = Endpoint::from_static("https://[::1]:50051")
//!     .tls_config(ClientTlsConfig::new())?;
//!
//! // Every call on this channel carries "Bearer <token>"
//! let channel = with_per_rpc_token_credentials(&endpoint, "eyJhbGc...")?;
//! // let mut client = SomeServiceClient::new(channel);
//!
//! // One call carries "Basic base64(client:secret)" instead
//! let request = per_rpc_client_id_credentials("client", "secret").attach(Request::new(()));
//! // client.some_call(request).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Guarantees
//!
//! - Malformed basic credentials = `Status::unauthenticated("Basic auth invalid")`
//! - Callback error = call aborted with that status, handler never runs
//! - Outbound credentials refuse channels not built from an `https` endpoint
//! - `Debug` output never contains secrets or tokens

mod client;
mod credentials;
pub mod error;
mod extensions;
pub mod metadata;
mod server;
pub mod tls;

pub use client::{
    oauth_channel, per_rpc_client_id_credentials, per_rpc_token_credentials,
    with_per_rpc_client_id_credentials, with_per_rpc_credentials, with_per_rpc_token_credentials,
    CallCredentials, OAuthChannel, OAuthClientInterceptor, PerRpcCredentials, StaticTokenSource,
    Token, TokenType,
};
pub use credentials::{extract_credentials, ClientCredentials, OAuthCredentials};
pub use error::{OAuthError, Result, TlsError};
pub use extensions::AuthContextExt;
pub use metadata::auth_from_metadata;
pub use server::{stream_server_interceptor, unary_server_interceptor, AuthFn, OAuthServerInterceptor};
pub use tls::{ClientTlsSettings, ServerTlsSettings};

// Re-export tonic Status for convenience
pub use tonic::Status;
