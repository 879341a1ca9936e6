//! TLS settings for gRPC channels carrying OAuth credentials
//!
//! Outbound credentials refuse plaintext channels, so servers and clients
//! using this crate need TLS material. These helpers load it from disk.

use crate::error::{TlsError, TlsResult};
use std::fs;
use std::path::Path;
use tonic::transport::{Certificate, ClientTlsConfig, Identity, ServerTlsConfig};
use tracing::info;

/// TLS configuration for a gRPC server
#[derive(Clone)]
pub struct ServerTlsSettings {
    /// Server certificate (PEM format)
    pub cert_pem: String,
    /// Server private key (PEM format)
    pub key_pem: String,
    /// Optional client CA certificate for mTLS
    pub client_ca_cert: Option<String>,
}

impl ServerTlsSettings {
    /// Load server TLS settings from environment variables
    ///
    /// **Environment Variables**:
    /// - `GRPC_SERVER_CERT_PATH`: Path to server certificate PEM file
    /// - `GRPC_SERVER_KEY_PATH`: Path to server private key PEM file
    /// - `GRPC_CLIENT_CA_CERT_PATH`: Path to client CA cert for mTLS (optional)
    pub fn from_env() -> TlsResult<Self> {
        let cert_path = required_env(
            "GRPC_SERVER_CERT_PATH",
            "Set to server certificate path",
        )?;
        let key_path = required_env("GRPC_SERVER_KEY_PATH", "Set to server private key path")?;

        let cert_pem = read_pem(Path::new(&cert_path))?;
        let key_pem = read_pem(Path::new(&key_path))?;

        let client_ca_cert = match std::env::var("GRPC_CLIENT_CA_CERT_PATH") {
            Ok(path) => Some(read_pem(Path::new(&path))?),
            Err(_) => None,
        };

        info!(
            cert_path = %cert_path,
            mtls_enabled = client_ca_cert.is_some(),
            "gRPC server TLS configuration loaded"
        );

        Ok(Self {
            cert_pem,
            key_pem,
            client_ca_cert,
        })
    }

    /// Build tonic ServerTlsConfig
    pub fn build(&self) -> ServerTlsConfig {
        let identity = Identity::from_pem(&self.cert_pem, &self.key_pem);
        let mut tls_config = ServerTlsConfig::new().identity(identity);

        if let Some(ref ca_cert) = self.client_ca_cert {
            tls_config = tls_config.client_ca_root(Certificate::from_pem(ca_cert));
            info!("mTLS enabled for gRPC server");
        }

        tls_config
    }
}

/// TLS configuration for a gRPC client
#[derive(Clone)]
pub struct ClientTlsSettings {
    /// Server CA certificate to trust (PEM format)
    pub server_ca_cert: String,
    /// Server domain name for certificate validation
    pub domain_name: String,
}

impl ClientTlsSettings {
    /// Load client TLS settings from environment variables
    ///
    /// **Environment Variables**:
    /// - `GRPC_SERVER_CA_CERT_PATH`: Path to server CA certificate
    /// - `GRPC_SERVER_DOMAIN`: Server domain name (default: "localhost")
    pub fn from_env() -> TlsResult<Self> {
        let ca_cert_path = required_env(
            "GRPC_SERVER_CA_CERT_PATH",
            "Set to CA certificate path for server verification",
        )?;
        let server_ca_cert = read_pem(Path::new(&ca_cert_path))?;

        let domain_name =
            std::env::var("GRPC_SERVER_DOMAIN").unwrap_or_else(|_| "localhost".to_string());

        info!(domain = %domain_name, "gRPC client TLS configuration loaded");

        Ok(Self {
            server_ca_cert,
            domain_name,
        })
    }

    /// Build tonic ClientTlsConfig
    pub fn build(&self) -> ClientTlsConfig {
        ClientTlsConfig::new()
            .ca_certificate(Certificate::from_pem(&self.server_ca_cert))
            .domain_name(&self.domain_name)
    }
}

fn required_env(var_name: &str, hint: &str) -> TlsResult<String> {
    std::env::var(var_name).map_err(|_| TlsError::MissingEnvVar {
        var_name: var_name.to_string(),
        hint: hint.to_string(),
    })
}

fn read_pem(path: &Path) -> TlsResult<String> {
    fs::read_to_string(path).map_err(|e| TlsError::CertificateReadError {
        path: path.to_path_buf(),
        source: e,
    })
}
