//! OAuth-protected Health Service Example
//!
//! Starts a TLS health server whose auth callback accepts one client id and
//! one bearer token, then calls it with both credential kinds.
//!
//! TLS material is issued into a temporary directory and loaded back through
//! the same environment variables a deployment would set.
//!
//! Run with: cargo run --example oauth_health

#[path = "../tests/common/mod.rs"]
mod common;

use common::LocalPki;
use grpc_oauth::{
    oauth_channel, per_rpc_client_id_credentials, unary_server_interceptor,
    with_per_rpc_token_credentials, AuthContextExt, ClientTlsSettings, ServerTlsSettings,
};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::{Endpoint, Server};
use tonic::{Request, Response, Status};
use tonic_health::pb::health_check_response::ServingStatus;
use tonic_health::pb::health_client::HealthClient;
use tonic_health::pb::health_server::{Health, HealthServer};
use tonic_health::pb::{HealthCheckRequest, HealthCheckResponse};
use tracing::info;
use tracing_subscriber::EnvFilter;

const CLIENT_ID: &str = "reporting-job";
const CLIENT_SECRET: &str = "s3cr3t";
const ACCESS_TOKEN: &str = "feadbb35-c2be-4529-b2a6-19109e07eaa3";

#[derive(Clone, Debug)]
struct Caller(String);

#[derive(Default)]
struct GreetingHealth;

#[tonic::async_trait]
impl Health for GreetingHealth {
    async fn check(
        &self,
        request: Request<HealthCheckRequest>,
    ) -> Result<Response<HealthCheckResponse>, Status> {
        let caller = request.auth_context::<Caller>()?;
        info!(caller = %caller.0, "Health check");

        Ok(Response::new(HealthCheckResponse {
            status: ServingStatus::Serving as i32,
        }))
    }

    type WatchStream = tokio_stream::Empty<Result<HealthCheckResponse, Status>>;

    async fn watch(
        &self,
        _request: Request<HealthCheckRequest>,
    ) -> Result<Response<Self::WatchStream>, Status> {
        Err(Status::unimplemented("watch"))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("GRPC_OAUTH_ADDR").unwrap_or_else(|_| "127.0.0.1:50051".to_string());

    // 1. TLS material: credentials are only sent over TLS
    let cert_dir = TempDir::new()?;
    let paths = LocalPki::issue()?.write_to(cert_dir.path())?;
    std::env::set_var("GRPC_SERVER_CERT_PATH", &paths.server_cert);
    std::env::set_var("GRPC_SERVER_KEY_PATH", &paths.server_key);
    std::env::set_var("GRPC_SERVER_CA_CERT_PATH", &paths.ca);
    std::env::set_var("GRPC_SERVER_DOMAIN", common::TLS_DOMAIN);

    // 2. Server with an auth callback deciding who gets in
    let interceptor = unary_server_interceptor(|mut request, creds| {
        let caller = if creds.access_token() == ACCESS_TOKEN {
            "token-holder".to_string()
        } else if creds.client_id() == CLIENT_ID && creds.client_secret() == CLIENT_SECRET {
            creds.client_id().to_string()
        } else {
            return Err(Status::unauthenticated("unknown caller"));
        };

        request.extensions_mut().insert(Caller(caller));
        Ok(request)
    });

    // Bound before the server task starts; early connects queue on the listener
    let listener = TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "Health server listening");

    let router = Server::builder()
        .tls_config(ServerTlsSettings::from_env()?.build())?
        .add_service(HealthServer::with_interceptor(GreetingHealth, interceptor));

    tokio::spawn(async move {
        if let Err(e) = router
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
        {
            tracing::error!(error = %e, "gRPC server stopped");
        }
    });

    let endpoint = Endpoint::from_shared(format!("https://{}", local_addr))?
        .tls_config(ClientTlsSettings::from_env()?.build())?;

    // 3. Channel-wide bearer token
    let mut token_client =
        HealthClient::new(with_per_rpc_token_credentials(&endpoint, ACCESS_TOKEN)?);
    let response = token_client
        .check(HealthCheckRequest {
            service: String::new(),
        })
        .await?;
    info!(status = response.into_inner().status, "Bearer call succeeded");

    // 4. Client id/secret for a single call
    let mut client = HealthClient::new(oauth_channel(&endpoint));
    let request = per_rpc_client_id_credentials(CLIENT_ID, CLIENT_SECRET).attach(Request::new(
        HealthCheckRequest {
            service: String::new(),
        },
    ));
    let response = client.check(request).await?;
    info!(status = response.into_inner().status, "Basic call succeeded");

    // 5. No credentials: rejected by the callback
    let request = Request::new(HealthCheckRequest {
        service: String::new(),
    });
    match client.check(request).await {
        Ok(_) => info!("Unexpectedly accepted anonymous call"),
        Err(status) => info!(code = ?status.code(), message = status.message(), "Anonymous call rejected"),
    }

    Ok(())
}
