//! OAuth Credentials and Extraction
//!
//! This module defines the OAuthCredentials structure that is parsed from the
//! `authorization` metadata of an inbound call and handed to the auth callback.

use crate::error::{OAuthError, Result};
use crate::metadata::auth_from_metadata;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use tonic::metadata::MetadataMap;
use tracing::debug;

/// Client id and secret decoded from a `basic` authorization value
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Credentials presented by the caller of an inbound gRPC call
///
/// Created once per call and passed by value to the auth callback.
///
/// ## Design Notes
///
/// - Each scheme is looked up independently, so a caller sending both a
///   `bearer` and a `basic` value gets both fields populated
/// - Client id and secret travel together; one is never set without the other
/// - No validation happens here; an empty value means "not presented"
#[derive(Clone, Default, PartialEq, Eq)]
pub struct OAuthCredentials {
    /// Raw token from a `bearer` authorization value
    pub access_token: Option<String>,

    /// Decoded pair from a `basic` authorization value
    pub client: Option<ClientCredentials>,
}

impl OAuthCredentials {
    /// Parse credentials from inbound call metadata
    ///
    /// See [`extract_credentials`].
    pub fn from_metadata(metadata: &MetadataMap) -> Result<Self> {
        extract_credentials(metadata)
    }

    /// Bearer token, or `""` when none was presented
    pub fn access_token(&self) -> &str {
        self.access_token.as_deref().unwrap_or_default()
    }

    /// Client id, or `""` when no basic credentials were presented
    pub fn client_id(&self) -> &str {
        self.client
            .as_ref()
            .map(|c| c.client_id.as_str())
            .unwrap_or_default()
    }

    /// Client secret, or `""` when no basic credentials were presented
    pub fn client_secret(&self) -> &str {
        self.client
            .as_ref()
            .map(|c| c.client_secret.as_str())
            .unwrap_or_default()
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn has_client_credentials(&self) -> bool {
        self.client.is_some()
    }

    /// True when the caller presented neither a bearer nor a basic value
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.client.is_none()
    }
}

impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("client", &self.client)
            .finish()
    }
}

/// Extract bearer and basic credentials from inbound call metadata
///
/// 1. A `bearer` value becomes `access_token` verbatim
/// 2. A `basic` value is base64-decoded and split on the first `:` into
///    client id and secret (the secret may itself contain `:`)
/// 3. Absent schemes are not an error; the callback decides whether
///    credentials are required
///
/// The metadata is only read, so extracting twice yields the same value.
///
/// ## Errors
///
/// Returns `OAuthError::MalformedBasicAuth` if the `basic` value is not
/// base64, is not UTF-8 once decoded, or has no `:` separator.
pub fn extract_credentials(metadata: &MetadataMap) -> Result<OAuthCredentials> {
    let mut creds = OAuthCredentials::default();

    if let Ok(token) = auth_from_metadata(metadata, "bearer") {
        creds.access_token = Some(token.to_string());
    }

    if let Ok(value) = auth_from_metadata(metadata, "basic") {
        creds.client = Some(decode_basic(value)?);
    }

    debug!(
        has_bearer = creds.has_access_token(),
        has_basic = creds.has_client_credentials(),
        "Extracted OAuth credentials"
    );

    Ok(creds)
}

fn decode_basic(value: &str) -> Result<ClientCredentials> {
    let decoded = STANDARD
        .decode(value)
        .map_err(|_| OAuthError::MalformedBasicAuth)?;
    let decoded = String::from_utf8(decoded).map_err(|_| OAuthError::MalformedBasicAuth)?;

    let (client_id, client_secret) = decoded
        .split_once(':')
        .ok_or(OAuthError::MalformedBasicAuth)?;

    Ok(ClientCredentials {
        client_id: client_id.to_string(),
        client_secret: client_secret.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::AUTHORIZATION;
    use tonic::metadata::MetadataValue;

    fn metadata_with(value: &str) -> MetadataMap {
        let mut metadata = MetadataMap::new();
        metadata.insert(AUTHORIZATION, value.parse().unwrap());
        metadata
    }

    fn basic(payload: &str) -> String {
        format!("basic {}", STANDARD.encode(payload))
    }

    #[test]
    fn test_extract_basic_credentials() {
        let metadata = metadata_with("basic Zm9vOmJhcg==");

        let creds = extract_credentials(&metadata).unwrap();
        assert_eq!(creds.client_id(), "foo");
        assert_eq!(creds.client_secret(), "bar");
        assert_eq!(creds.access_token(), "");
        assert!(!creds.has_access_token());
    }

    #[test]
    fn test_extract_basic_credentials_various_pairs() {
        let pairs = [
            ("client", "s3cr3t"),
            ("", "secret-only"),
            ("id-only", ""),
            ("svc@example.com", "p@ss w0rd"),
        ];

        for (id, secret) in pairs {
            let metadata = metadata_with(&basic(&format!("{}:{}", id, secret)));
            let creds = extract_credentials(&metadata).unwrap();

            assert_eq!(creds.client_id(), id);
            assert_eq!(creds.client_secret(), secret);
        }
    }

    #[test]
    fn test_secret_may_contain_colons() {
        let metadata = metadata_with(&basic("foo:bar:baz"));

        let creds = extract_credentials(&metadata).unwrap();
        assert_eq!(creds.client_id(), "foo");
        assert_eq!(creds.client_secret(), "bar:baz");
    }

    #[test]
    fn test_extract_bearer_token() {
        let metadata = metadata_with("bearer feadbb35-c2be-4529-b2a6-19109e07eaa3");

        let creds = extract_credentials(&metadata).unwrap();
        assert_eq!(creds.access_token(), "feadbb35-c2be-4529-b2a6-19109e07eaa3");
        assert!(!creds.has_client_credentials());
        assert_eq!(creds.client_id(), "");
        assert_eq!(creds.client_secret(), "");
    }

    #[test]
    fn test_bearer_token_is_not_decoded() {
        let metadata = metadata_with("Bearer Zm9vOmJhcg==");

        let creds = extract_credentials(&metadata).unwrap();
        assert_eq!(creds.access_token(), "Zm9vOmJhcg==");
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        let metadata = metadata_with("basic =");

        let err = extract_credentials(&metadata).unwrap_err();
        assert_eq!(err, OAuthError::MalformedBasicAuth);
    }

    #[test]
    fn test_missing_separator_is_rejected() {
        // base64("bad")
        let metadata = metadata_with("basic YmFk");

        let err = extract_credentials(&metadata).unwrap_err();
        assert_eq!(err, OAuthError::MalformedBasicAuth);
    }

    #[test]
    fn test_empty_basic_value_is_rejected_like_bad_base64() {
        let mut metadata = MetadataMap::new();
        metadata.insert(AUTHORIZATION, MetadataValue::from_static("basic "));

        let empty = extract_credentials(&metadata).unwrap_err();
        let bad_base64 = extract_credentials(&metadata_with("basic =")).unwrap_err();
        assert_eq!(empty, bad_base64);
    }

    #[test]
    fn test_non_utf8_payload_is_rejected() {
        let metadata = metadata_with(&format!("basic {}", STANDARD.encode([0xff, b':', 0xfe])));

        let err = extract_credentials(&metadata).unwrap_err();
        assert_eq!(err, OAuthError::MalformedBasicAuth);
    }

    #[test]
    fn test_no_credentials_is_not_an_error() {
        let creds = extract_credentials(&MetadataMap::new()).unwrap();
        assert!(creds.is_empty());
    }

    #[test]
    fn test_unknown_scheme_is_ignored() {
        let metadata = metadata_with("Digest username=\"foo\"");

        let creds = extract_credentials(&metadata).unwrap();
        assert!(creds.is_empty());
    }

    #[test]
    fn test_both_schemes_are_extracted_independently() {
        let mut metadata = MetadataMap::new();
        metadata.append(AUTHORIZATION, MetadataValue::from_static("bearer abc"));
        metadata.append(
            AUTHORIZATION,
            MetadataValue::from_static("basic Zm9vOmJhcg=="),
        );

        let creds = extract_credentials(&metadata).unwrap();
        assert_eq!(creds.access_token(), "abc");
        assert_eq!(creds.client_id(), "foo");
        assert_eq!(creds.client_secret(), "bar");
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let mut metadata = MetadataMap::new();
        metadata.append(AUTHORIZATION, MetadataValue::from_static("bearer abc"));
        metadata.append(
            AUTHORIZATION,
            MetadataValue::from_static("basic Zm9vOmJhcg=="),
        );

        let first = OAuthCredentials::from_metadata(&metadata).unwrap();
        let second = OAuthCredentials::from_metadata(&metadata).unwrap();
        assert_eq!(first, second);
        assert_eq!(metadata.get_all(AUTHORIZATION).iter().count(), 2);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut metadata = MetadataMap::new();
        metadata.append(AUTHORIZATION, MetadataValue::from_static("bearer abc"));
        metadata.append(
            AUTHORIZATION,
            MetadataValue::from_static("basic Zm9vOmJhcg=="),
        );

        let creds = extract_credentials(&metadata).unwrap();
        let debug_str = format!("{:?}", creds);

        assert!(debug_str.contains("foo"));
        assert!(!debug_str.contains("bar"));
        assert!(!debug_str.contains("abc"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
