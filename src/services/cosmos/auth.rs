//! Master-key request signing
//!
//! Every control-plane request carries an `authorization` token derived
//! from the account master key: an HMAC-SHA256 over the lowercased verb,
//! resource type, resource link, and request date.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

use super::client::CosmosError;

type HmacSha256 = Hmac<Sha256>;

/// Decoded account master key
#[derive(Clone)]
pub struct MasterKey {
    key: Vec<u8>,
}

impl MasterKey {
    /// Decode the base64 master key as handed out by the portal
    pub fn from_base64(encoded: &str) -> Result<Self, CosmosError> {
        let key = BASE64
            .decode(encoded)
            .map_err(|_| CosmosError::InvalidKey)?;
        Ok(Self { key })
    }

    /// Build the `authorization` header value for one request.
    ///
    /// The signed payload is
    /// `"{verb}\n{resource_type}\n{resource_link}\n{date}\n\n"` with the
    /// verb, resource type, and date lowercased. The resource link is
    /// case-sensitive and signed as given. The token itself is the
    /// URL-encoded `type=master&ver=1.0&sig={base64 signature}`.
    pub fn authorization(
        &self,
        verb: &str,
        resource_type: &str,
        resource_link: &str,
        date: &str,
    ) -> String {
        let payload = format!(
            "{}\n{}\n{}\n{}\n\n",
            verb.to_lowercase(),
            resource_type.to_lowercase(),
            resource_link,
            date.to_lowercase()
        );

        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any length");
        mac.update(payload.as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());

        urlencoding::encode(&format!("type=master&ver=1.0&sig={}", signature)).into_owned()
    }
}

// Key material stays out of debug output
impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterKey").finish_non_exhaustive()
    }
}

/// Current UTC time in the RFC 1123 form the `x-ms-date` header expects,
/// e.g. `Tue, 01 Nov 1994 08:12:31 GMT`
pub fn rfc1123_now() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known emulator key, safe to embed in tests
    const TEST_KEY: &str =
        "C2y6yDjf5/R+ob0N8A7Cgv30VRDJIWEHLM+4QDU5DE2nQ9nDuVTqobD4b8mGGyPMbIZnqyMsEcaGQy67XIw/Jw==";

    #[test]
    fn test_known_signature_vector() {
        // Reference vector: GET on the collections feed of dbs/ToDoList
        let key = MasterKey::from_base64(TEST_KEY).unwrap();
        let token = key.authorization(
            "GET",
            "colls",
            "dbs/ToDoList",
            "Thu, 27 Apr 2017 00:51:12 GMT",
        );
        assert_eq!(
            token,
            "type%3Dmaster%26ver%3D1.0%26sig%3Dh4UkKlDSt47oOZqkyq9w1Nz0YUyPt%2Bs8GrF7dQv38zw%3D"
        );
    }

    #[test]
    fn test_signature_is_deterministic() {
        let key = MasterKey::from_base64(TEST_KEY).unwrap();
        let a = key.authorization("PUT", "offers", "abcd1234", "Thu, 27 Apr 2017 00:51:12 GMT");
        let b = key.authorization("PUT", "offers", "abcd1234", "Thu, 27 Apr 2017 00:51:12 GMT");
        assert_eq!(a, b);
    }

    #[test]
    fn test_signature_varies_with_verb() {
        let key = MasterKey::from_base64(TEST_KEY).unwrap();
        let get = key.authorization("GET", "offers", "abcd1234", "Thu, 27 Apr 2017 00:51:12 GMT");
        let put = key.authorization("PUT", "offers", "abcd1234", "Thu, 27 Apr 2017 00:51:12 GMT");
        assert_ne!(get, put);
    }

    #[test]
    fn test_token_is_url_encoded() {
        let key = MasterKey::from_base64(TEST_KEY).unwrap();
        let token = key.authorization("GET", "colls", "dbs/x", "Thu, 27 Apr 2017 00:51:12 GMT");
        // No raw separators survive encoding
        assert!(!token.contains('='));
        assert!(!token.contains('&'));
        assert!(!token.contains('+'));
        assert!(token.starts_with("type%3Dmaster%26ver%3D1.0%26sig%3D"));
    }

    #[test]
    fn test_invalid_key_rejected() {
        assert!(matches!(
            MasterKey::from_base64("!!!not-base64!!!"),
            Err(CosmosError::InvalidKey)
        ));
    }

    #[test]
    fn test_rfc1123_date_shape() {
        let date = rfc1123_now();
        // e.g. "Tue, 01 Nov 1994 08:12:31 GMT"
        assert_eq!(date.len(), 29);
        assert!(date.ends_with(" GMT"));
        assert_eq!(&date[3..5], ", ");
    }
}
