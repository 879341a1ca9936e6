//! Throwaway TLS material for exercising credentials over encrypted channels
//!
//! Issues a CA and a `localhost` leaf for it on every call. Not for anything
//! that outlives a test process.

#![allow(dead_code)]

use anyhow::Context;
use grpc_oauth::{ClientTlsSettings, ServerTlsSettings};
use rcgen::{BasicConstraints, CertificateParams, IsCa, KeyPair, SanType};
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

/// Host name the leaf certificate is issued for
pub const TLS_DOMAIN: &str = "localhost";

/// A private CA and a server identity it signed
pub struct LocalPki {
    pub ca_pem: String,
    pub server_cert_pem: String,
    pub server_key_pem: String,
}

impl LocalPki {
    /// Issue a fresh CA and a leaf valid for `localhost` and `127.0.0.1`
    pub fn issue() -> anyhow::Result<Self> {
        let mut ca_params = CertificateParams::new(Vec::<String>::new())
            .context("CA parameters")?;
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Constrained(0));
        let ca_key = KeyPair::generate().context("CA key")?;
        let ca = ca_params.self_signed(&ca_key).context("self-sign CA")?;

        let mut leaf_params =
            CertificateParams::new(vec![TLS_DOMAIN.to_string()]).context("leaf parameters")?;
        leaf_params
            .subject_alt_names
            .push(SanType::IpAddress(IpAddr::V4(Ipv4Addr::LOCALHOST)));
        let leaf_key = KeyPair::generate().context("leaf key")?;
        let leaf = leaf_params
            .signed_by(&leaf_key, &ca, &ca_key)
            .context("sign leaf")?;

        Ok(Self {
            ca_pem: ca.pem(),
            server_cert_pem: leaf.pem(),
            server_key_pem: leaf_key.serialize_pem(),
        })
    }

    pub fn server_tls(&self) -> ServerTlsSettings {
        ServerTlsSettings {
            cert_pem: self.server_cert_pem.clone(),
            key_pem: self.server_key_pem.clone(),
            client_ca_cert: None,
        }
    }

    pub fn client_tls(&self) -> ClientTlsSettings {
        ClientTlsSettings {
            server_ca_cert: self.ca_pem.clone(),
            domain_name: TLS_DOMAIN.to_string(),
        }
    }

    /// Write `ca.crt`, `server.crt` and `server.key` into `dir`
    pub fn write_to(&self, dir: &Path) -> anyhow::Result<PemPaths> {
        let paths = PemPaths {
            ca: dir.join("ca.crt"),
            server_cert: dir.join("server.crt"),
            server_key: dir.join("server.key"),
        };

        fs::write(&paths.ca, &self.ca_pem).context("write CA")?;
        fs::write(&paths.server_cert, &self.server_cert_pem).context("write server cert")?;
        fs::write(&paths.server_key, &self.server_key_pem).context("write server key")?;

        Ok(paths)
    }
}

pub struct PemPaths {
    pub ca: PathBuf,
    pub server_cert: PathBuf,
    pub server_key: PathBuf,
}
