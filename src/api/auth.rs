//! OAuth 1.0a request signing for the Twitter REST API.

use base64::prelude::{Engine as _, BASE64_STANDARD};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;

use crate::config::TwitterConfig;

type HmacSha1 = Hmac<Sha1>;

/// Length of the random nonce sent with every request.
const NONCE_LENGTH: usize = 32;

/// Application and user credentials for OAuth 1.0a.
#[derive(Debug, Clone)]
pub struct OAuth1Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: String,
    pub token_secret: String,
}

impl From<&TwitterConfig> for OAuth1Credentials {
    fn from(config: &TwitterConfig) -> Self {
        Self {
            consumer_key: config.application_key.clone(),
            consumer_secret: config.application_secret.clone(),
            token: config.access_token.clone(),
            token_secret: config.access_token_secret.clone(),
        }
    }
}

/// RFC 3986 percent-encoding (only unreserved characters pass through).
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Build the signature base string.
///
/// Format: METHOD&enc(base_url)&enc(sorted, encoded parameter string)
pub fn signature_base_string(method: &str, base_url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(base_url),
        percent_encode(&param_string)
    )
}

/// HMAC-SHA1 signature of a base string, base64 encoded.
pub fn sign(base_string: &str, consumer_secret: &str, token_secret: &str) -> String {
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any size");
    mac.update(base_string.as_bytes());
    BASE64_STANDARD.encode(mac.finalize().into_bytes())
}

/// Generate a random alphanumeric nonce.
pub fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}

/// Build the `Authorization` header value for a request.
///
/// `query` holds the request parameters, which take part in the signature.
pub fn authorization_header(
    method: &str,
    base_url: &str,
    query: &[(&str, String)],
    credentials: &OAuth1Credentials,
) -> String {
    authorization_header_with(
        method,
        base_url,
        query,
        credentials,
        &generate_nonce(),
        Utc::now().timestamp(),
    )
}

/// Same as [`authorization_header`] with a fixed nonce and timestamp.
pub fn authorization_header_with(
    method: &str,
    base_url: &str,
    query: &[(&str, String)],
    credentials: &OAuth1Credentials,
    nonce: &str,
    timestamp: i64,
) -> String {
    let oauth_params = vec![
        ("oauth_consumer_key", credentials.consumer_key.clone()),
        ("oauth_nonce", nonce.to_string()),
        ("oauth_signature_method", "HMAC-SHA1".to_string()),
        ("oauth_timestamp", timestamp.to_string()),
        ("oauth_token", credentials.token.clone()),
        ("oauth_version", "1.0".to_string()),
    ];

    let all_params: Vec<(String, String)> = oauth_params
        .iter()
        .chain(query.iter())
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();

    let base_string = signature_base_string(method, base_url, &all_params);
    let signature = sign(
        &base_string,
        &credentials.consumer_secret,
        &credentials.token_secret,
    );

    let mut header_params = oauth_params;
    header_params.push(("oauth_signature", signature));
    header_params.sort_by(|a, b| a.0.cmp(b.0));

    let fields = header_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    format!("OAuth {}", fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference values from Twitter's "Creating a signature" guide.
    const STATUS: &str = "Hello Ladies + Gentlemen, a signed OAuth request!";
    const URL: &str = "https://api.twitter.com/1.1/statuses/update.json";

    fn reference_params() -> Vec<(String, String)> {
        [
            ("status", STATUS),
            ("include_entities", "true"),
            ("oauth_consumer_key", "xvz1evFS4wEEPTGEFPHBog"),
            ("oauth_nonce", "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg"),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", "1318622958"),
            ("oauth_token", "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb"),
            ("oauth_version", "1.0"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("Ladies + Gentlemen"), "Ladies%20%2B%20Gentlemen");
        assert_eq!(percent_encode("An encoded string!"), "An%20encoded%20string%21");
        assert_eq!(percent_encode("Dogs, Cats & Mice"), "Dogs%2C%20Cats%20%26%20Mice");
        assert_eq!(percent_encode("safe-_.~"), "safe-_.~");
    }

    #[test]
    fn test_signature_base_string_reference() {
        let base = signature_base_string("post", URL, &reference_params());
        assert_eq!(
            base,
            "POST&https%3A%2F%2Fapi.twitter.com%2F1.1%2Fstatuses%2Fupdate.json&include_entities%3Dtrue%26oauth_consumer_key%3Dxvz1evFS4wEEPTGEFPHBog%26oauth_nonce%3DkYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg%26oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1318622958%26oauth_token%3D370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb%26oauth_version%3D1.0%26status%3DHello%2520Ladies%2520%252B%2520Gentlemen%252C%2520a%2520signed%2520OAuth%2520request%2521"
        );
    }

    #[test]
    fn test_sign_reference() {
        let base = signature_base_string("POST", URL, &reference_params());
        let signature = sign(
            &base,
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
            "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
        );
        assert_eq!(signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    #[test]
    fn test_authorization_header_reference() {
        let credentials = OAuth1Credentials {
            consumer_key: "xvz1evFS4wEEPTGEFPHBog".to_string(),
            consumer_secret: "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw".to_string(),
            token: "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb".to_string(),
            token_secret: "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE".to_string(),
        };
        let header = authorization_header_with(
            "POST",
            URL,
            &[
                ("status", STATUS.to_string()),
                ("include_entities", "true".to_string()),
            ],
            &credentials,
            "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
            1318622958,
        );

        assert!(header.starts_with("OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\""));
        assert!(header.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
        assert!(!header.contains("status="));
    }

    #[test]
    fn test_nonce_is_random_alphanumeric() {
        let a = generate_nonce();
        let b = generate_nonce();
        assert_eq!(a.len(), NONCE_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
