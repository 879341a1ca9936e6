//! Authorization metadata lookup
//!
//! Reads `<scheme> <value>` pairs out of the `authorization` metadata key.

use tonic::metadata::MetadataMap;
use tonic::Status;

/// Metadata key carrying credentials. gRPC metadata keys are lowercase.
pub const AUTHORIZATION: &str = "authorization";

/// Return the value presented under `expected_scheme` in the `authorization` metadata
///
/// Every `authorization` value is split on its first space into
/// `<scheme> <value>`; the first entry whose scheme matches
/// `expected_scheme` (ASCII case-insensitive) wins. Values that are not
/// visible ASCII are skipped.
///
/// ## Errors
///
/// Returns `Status::unauthenticated` if:
/// - No `authorization` value carries `expected_scheme`
/// - No value matched and at least one value had no `<scheme> <value>` shape
pub fn auth_from_metadata<'a>(
    metadata: &'a MetadataMap,
    expected_scheme: &str,
) -> Result<&'a str, Status> {
    let mut malformed = false;

    for value in metadata.get_all(AUTHORIZATION).iter() {
        let Ok(raw) = value.to_str() else {
            continue;
        };

        match raw.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case(expected_scheme) => {
                return Ok(token);
            }
            Some(_) => {}
            None => malformed = true,
        }
    }

    if malformed {
        return Err(Status::unauthenticated("Bad authorization string"));
    }

    Err(Status::unauthenticated(format!(
        "Request unauthenticated with {}",
        expected_scheme
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::metadata::MetadataValue;

    fn metadata_with(values: &[&'static str]) -> MetadataMap {
        let mut metadata = MetadataMap::new();
        for value in values {
            metadata.append(AUTHORIZATION, MetadataValue::from_static(value));
        }
        metadata
    }

    #[test]
    fn test_scheme_match_is_case_insensitive() {
        let metadata = metadata_with(&["BEARER abc"]);
        assert_eq!(auth_from_metadata(&metadata, "bearer").unwrap(), "abc");

        let metadata = metadata_with(&["Bearer abc"]);
        assert_eq!(auth_from_metadata(&metadata, "bearer").unwrap(), "abc");
    }

    #[test]
    fn test_value_keeps_everything_after_first_space() {
        let metadata = metadata_with(&["bearer a b c"]);
        assert_eq!(auth_from_metadata(&metadata, "bearer").unwrap(), "a b c");
    }

    #[test]
    fn test_missing_header() {
        let metadata = MetadataMap::new();
        let status = auth_from_metadata(&metadata, "bearer").unwrap_err();

        assert_eq!(status.code(), tonic::Code::Unauthenticated);
        assert_eq!(status.message(), "Request unauthenticated with bearer");
    }

    #[test]
    fn test_other_scheme_is_not_a_match() {
        let metadata = metadata_with(&["basic Zm9vOmJhcg=="]);
        let status = auth_from_metadata(&metadata, "bearer").unwrap_err();

        assert_eq!(status.message(), "Request unauthenticated with bearer");
    }

    #[test]
    fn test_bad_authorization_string() {
        let metadata = metadata_with(&["token"]);
        let status = auth_from_metadata(&metadata, "bearer").unwrap_err();

        assert_eq!(status.code(), tonic::Code::Unauthenticated);
        assert_eq!(status.message(), "Bad authorization string");
    }

    #[test]
    fn test_scans_every_authorization_value() {
        let metadata = metadata_with(&["bearer abc", "basic Zm9vOmJhcg=="]);

        assert_eq!(auth_from_metadata(&metadata, "bearer").unwrap(), "abc");
        assert_eq!(
            auth_from_metadata(&metadata, "basic").unwrap(),
            "Zm9vOmJhcg=="
        );
    }

    #[test]
    fn test_empty_value_after_scheme() {
        let metadata = metadata_with(&["basic "]);
        assert_eq!(auth_from_metadata(&metadata, "basic").unwrap(), "");
    }
}
