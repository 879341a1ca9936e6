//! Client-side OAuth Credentials
//!
//! Attaches bearer or basic credentials to outgoing gRPC requests, either for
//! a single call or for every call made through a channel.
//!
//! The interceptor that writes credentials is only handed out already wrapped
//! around a channel built from the endpoint whose scheme it checked, so the
//! transport security it enforces is that of the connection the call uses.

use crate::error::{OAuthError, Result};
use crate::metadata::AUTHORIZATION;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use std::sync::Arc;
use tonic::metadata::AsciiMetadataValue;
use tonic::service::interceptor::InterceptedService;
use tonic::service::Interceptor;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};
use tracing::{debug, warn};

/// Scheme a token is presented under
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TokenType {
    #[default]
    Bearer,
    Basic,
}

impl TokenType {
    /// Canonical scheme name written to the `authorization` value
    pub fn as_str(self) -> &'static str {
        match self {
            TokenType::Bearer => "Bearer",
            TokenType::Basic => "Basic",
        }
    }
}

/// A static token and the scheme it is sent with
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    pub token_type: TokenType,
}

impl Token {
    /// `authorization` value for this token, e.g. `Bearer abc`
    pub fn authorization_value(&self) -> String {
        format!("{} {}", self.token_type.as_str(), self.access_token)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Credentials rendered into the `authorization` metadata of outgoing calls
///
/// Implementations are immutable and shared between concurrent calls, so
/// rendering only reads state.
pub trait PerRpcCredentials: Send + Sync + 'static {
    /// Render the `authorization` value for one outgoing call
    ///
    /// ## Errors
    ///
    /// Returns `OAuthError::InvalidHeaderValue` if the value cannot be carried
    /// as ASCII metadata.
    fn authorization(&self) -> Result<AsciiMetadataValue>;

    /// Whether the credentials may only travel over an encrypted channel
    fn require_transport_security(&self) -> bool {
        true
    }
}

/// Credentials backed by a token that never changes
///
/// The same value is resent on every call for the lifetime of the source;
/// there is no refresh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticTokenSource {
    token: Token,
}

impl StaticTokenSource {
    pub fn new(token: Token) -> Self {
        Self { token }
    }

    /// `Basic base64(client_id:secret)` credentials
    pub fn client_id(client_id: &str, secret: &str) -> Self {
        let encoded = STANDARD.encode(format!("{}:{}", client_id, secret));

        Self::new(Token {
            access_token: encoded,
            token_type: TokenType::Basic,
        })
    }

    /// `Bearer <token>` credentials
    pub fn access_token(token: impl Into<String>) -> Self {
        Self::new(Token {
            access_token: token.into(),
            token_type: TokenType::Bearer,
        })
    }

    pub fn token(&self) -> &Token {
        &self.token
    }
}

impl PerRpcCredentials for StaticTokenSource {
    fn authorization(&self) -> Result<AsciiMetadataValue> {
        AsciiMetadataValue::try_from(self.token.authorization_value())
            .map_err(|_| OAuthError::InvalidHeaderValue)
    }
}

/// Credentials for a single call
///
/// Attach to a request with [`CallCredentials::attach`]; the channel's
/// [`OAuthClientInterceptor`] renders them on that call only, in place of
/// the channel's own credentials.
///
/// ```rust,no_run
/// use grpc_oauth::{oauth_channel, per_rpc_token_credentials};
/// use tonic::transport::{ClientTlsConfig, Endpoint};
/// use tonic::Request;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let endpoint = Endpoint::from_static("https://auth-service:50051")
///     .tls_config(ClientTlsConfig::new())?;
/// let channel = oauth_channel(&endpoint);
/// // let mut client = SomeServiceClient::new(channel);
///
/// let request = per_rpc_token_credentials("feadbb35-c2be-4529-b2a6-19109e07eaa3")
///     .attach(Request::new(()));
/// // client.some_call(request).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CallCredentials(Arc<dyn PerRpcCredentials>);

impl CallCredentials {
    pub fn new(credentials: impl PerRpcCredentials) -> Self {
        Self(Arc::new(credentials))
    }

    /// Store the credentials in the request so the channel interceptor sends them
    ///
    /// Only an [`OAuthChannel`] reads them back out. On any other channel the
    /// request extensions never reach the wire and the call goes out without
    /// an `authorization` header.
    pub fn attach<T>(self, mut request: Request<T>) -> Request<T> {
        request.extensions_mut().insert(self);
        request
    }
}

impl fmt::Debug for CallCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallCredentials").finish_non_exhaustive()
    }
}

/// Client-side interceptor that writes OAuth credentials into gRPC metadata
///
/// For every outgoing request it renders, in order of preference, the
/// request's [`CallCredentials`] or the channel credentials given at
/// construction, and inserts the result as the `authorization` header.
///
/// ## Design
///
/// - **Render per call**: credentials are asked for their value on every call
/// - **Secure channel only**: credentials requiring transport security are
///   refused unless the channel was built from an `https` endpoint
/// - **Bound to its channel**: only constructed inside an [`OAuthChannel`],
///   never on its own
///
/// ## Usage
///
/// ```rust,no_run
/// use grpc_oauth::with_per_rpc_client_id_credentials;
/// use tonic::transport::{ClientTlsConfig, Endpoint};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let endpoint = Endpoint::from_static("https://auth-service:50051")
///     .tls_config(ClientTlsConfig::new())?;
/// let channel = with_per_rpc_client_id_credentials(&endpoint, "client", "secret")?;
/// // let mut client = SomeServiceClient::new(channel);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct OAuthClientInterceptor {
    credentials: Option<Arc<dyn PerRpcCredentials>>,
    transport_secure: bool,
}

impl OAuthClientInterceptor {
    /// Interceptor without channel credentials; only per-call credentials are sent
    pub(crate) fn new(endpoint: &Endpoint) -> Self {
        Self {
            credentials: None,
            transport_secure: endpoint.uri().scheme_str() == Some("https"),
        }
    }

    /// Interceptor sending `credentials` on every call made through `endpoint`
    ///
    /// ## Errors
    ///
    /// Returns `OAuthError::InsecureTransport` if the credentials require
    /// transport security and the endpoint is not `https`.
    pub(crate) fn with_credentials(
        endpoint: &Endpoint,
        credentials: impl PerRpcCredentials,
    ) -> Result<Self> {
        let mut interceptor = Self::new(endpoint);

        if credentials.require_transport_security() && !interceptor.transport_secure {
            warn!(uri = %endpoint.uri(), "Refusing credentials on plaintext endpoint");
            return Err(OAuthError::InsecureTransport);
        }

        interceptor.credentials = Some(Arc::new(credentials));
        Ok(interceptor)
    }

    pub fn is_transport_secure(&self) -> bool {
        self.transport_secure
    }
}

impl Interceptor for OAuthClientInterceptor {
    fn call(&mut self, mut request: Request<()>) -> std::result::Result<Request<()>, Status> {
        let credentials = match request.extensions_mut().remove::<CallCredentials>() {
            Some(CallCredentials(per_call)) => per_call,
            None => match &self.credentials {
                Some(channel) => channel.clone(),
                None => return Ok(request),
            },
        };

        if credentials.require_transport_security() && !self.transport_secure {
            warn!("Refusing to send credentials over plaintext channel");
            return Err(OAuthError::InsecureTransport.into());
        }

        let value = credentials.authorization()?;
        request.metadata_mut().insert(AUTHORIZATION, value);

        debug!("Attached authorization metadata");

        Ok(request)
    }
}

/// Channel whose every call passes through an [`OAuthClientInterceptor`]
///
/// Use it as the transport of any generated client: `SomeClient::new(channel)`.
pub type OAuthChannel = InterceptedService<Channel, OAuthClientInterceptor>;

fn bind(endpoint: &Endpoint, interceptor: OAuthClientInterceptor) -> OAuthChannel {
    debug!(
        uri = %endpoint.uri(),
        transport_secure = interceptor.transport_secure,
        "Creating OAuth channel"
    );
    InterceptedService::new(endpoint.connect_lazy(), interceptor)
}

/// Channel that sends only per-call [`CallCredentials`]
///
/// Connects lazily on first use and must be created inside a Tokio runtime.
/// Per-call credentials fail their call with `Unauthenticated` when
/// `endpoint` is not `https`.
pub fn oauth_channel(endpoint: &Endpoint) -> OAuthChannel {
    bind(endpoint, OAuthClientInterceptor::new(endpoint))
}

/// Channel sending `credentials` on every call made through it
///
/// Connects lazily on first use and must be created inside a Tokio runtime.
///
/// ## Errors
///
/// Returns `OAuthError::InsecureTransport` if the credentials require
/// transport security and the endpoint is not `https`. No channel is built.
pub fn with_per_rpc_credentials(
    endpoint: &Endpoint,
    credentials: impl PerRpcCredentials,
) -> Result<OAuthChannel> {
    let interceptor = OAuthClientInterceptor::with_credentials(endpoint, credentials)?;
    Ok(bind(endpoint, interceptor))
}

impl fmt::Debug for OAuthClientInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthClientInterceptor")
            .field("has_credentials", &self.credentials.is_some())
            .field("transport_secure", &self.transport_secure)
            .finish()
    }
}

/// Per-call `Basic` credentials built from a client id and secret
pub fn per_rpc_client_id_credentials(client_id: &str, secret: &str) -> CallCredentials {
    CallCredentials::new(StaticTokenSource::client_id(client_id, secret))
}

/// Per-call `Bearer` credentials built from an access token
pub fn per_rpc_token_credentials(token: impl Into<String>) -> CallCredentials {
    CallCredentials::new(StaticTokenSource::access_token(token))
}

/// Channel sending `Basic` client id/secret credentials on every call
///
/// ## Errors
///
/// Returns `OAuthError::InsecureTransport` if the endpoint is not `https`.
pub fn with_per_rpc_client_id_credentials(
    endpoint: &Endpoint,
    client_id: &str,
    secret: &str,
) -> Result<OAuthChannel> {
    with_per_rpc_credentials(endpoint, StaticTokenSource::client_id(client_id, secret))
}

/// Channel sending `Bearer` token credentials on every call
///
/// ## Errors
///
/// Returns `OAuthError::InsecureTransport` if the endpoint is not `https`.
pub fn with_per_rpc_token_credentials(
    endpoint: &Endpoint,
    token: impl Into<String>,
) -> Result<OAuthChannel> {
    with_per_rpc_credentials(endpoint, StaticTokenSource::access_token(token))
}
