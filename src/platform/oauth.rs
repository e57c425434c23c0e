//! OAuth 1.0a request signing (HMAC-SHA1) for the Twitter v1.1 API.

use base64::Engine;
use hmac::Mac;
use sha1::Sha1;

use crate::config::TwitterCredentials;

type HmacSha1 = hmac::Hmac<Sha1>;

/// RFC 3986 percent-encoding as required by the OAuth 1.0a spec:
/// everything except unreserved characters is escaped, spaces as %20.
fn percent_encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// Build the `Authorization: OAuth ...` header value for a request.
///
/// `params` must contain every query/body parameter that will be sent,
/// since they all participate in the signature base string.
pub fn authorization_header(
    creds: &TwitterCredentials,
    method: &str,
    base_url: &str,
    params: &[(&str, &str)],
) -> String {
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    let timestamp = chrono::Utc::now().timestamp().to_string();
    build_header(creds, method, base_url, params, &nonce, &timestamp)
}

fn build_header(
    creds: &TwitterCredentials,
    method: &str,
    base_url: &str,
    params: &[(&str, &str)],
    nonce: &str,
    timestamp: &str,
) -> String {
    let oauth_params: [(&str, &str); 6] = [
        ("oauth_consumer_key", &creds.consumer_key),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp),
        ("oauth_token", &creds.access_token),
        ("oauth_version", "1.0"),
    ];

    let signature = sign(creds, method, base_url, params, &oauth_params);

    let mut header = String::from("OAuth ");
    for (i, (key, value)) in oauth_params.iter().enumerate() {
        if i > 0 {
            header.push_str(", ");
        }
        header.push_str(&format!(
            "{}=\"{}\"",
            percent_encode(key),
            percent_encode(value)
        ));
    }
    header.push_str(&format!(
        ", oauth_signature=\"{}\"",
        percent_encode(&signature)
    ));
    header
}

fn sign(
    creds: &TwitterCredentials,
    method: &str,
    base_url: &str,
    params: &[(&str, &str)],
    oauth_params: &[(&str, &str)],
) -> String {
    // Collect, percent-encode and sort every parameter pair.
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .chain(oauth_params.iter())
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(base_url),
        percent_encode(&param_string)
    );

    let signing_key = format!(
        "{}&{}",
        percent_encode(&creds.consumer_secret),
        percent_encode(&creds.access_token_secret)
    );

    let mut mac =
        HmacSha1::new_from_slice(signing_key.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(base_string.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    // The worked example from Twitter's "Creating a signature" docs.
    fn doc_credentials() -> TwitterCredentials {
        TwitterCredentials {
            consumer_key: "xvz1evFS4wEEPTGEFPHBog".to_string(),
            consumer_secret: "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw".to_string(),
            access_token: "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb".to_string(),
            access_token_secret: "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE".to_string(),
        }
    }

    #[test]
    fn test_percent_encoding_rules() {
        assert_eq!(percent_encode("Ladies + Gentlemen"), "Ladies%20%2B%20Gentlemen");
        assert_eq!(percent_encode("An encoded string!"), "An%20encoded%20string%21");
        assert_eq!(percent_encode("Dogs, Cats & Mice"), "Dogs%2C%20Cats%20%26%20Mice");
        assert_eq!(percent_encode("~peculiar-but_safe.chars"), "~peculiar-but_safe.chars");
    }

    #[test]
    fn test_signature_matches_documented_example() {
        let creds = doc_credentials();
        let params = [
            (
                "status",
                "Hello Ladies + Gentlemen, a signed OAuth request!",
            ),
            ("include_entities", "true"),
        ];
        let oauth_params: [(&str, &str); 6] = [
            ("oauth_consumer_key", &creds.consumer_key),
            ("oauth_nonce", "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg"),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", "1318622958"),
            ("oauth_token", &creds.access_token),
            ("oauth_version", "1.0"),
        ];

        let signature = sign(
            &creds,
            "post",
            "https://api.twitter.com/1.1/statuses/update.json",
            &params,
            &oauth_params,
        );

        assert_eq!(signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    #[test]
    fn test_header_shape() {
        let creds = doc_credentials();
        let header = build_header(
            &creds,
            "GET",
            "https://api.twitter.com/1.1/account/verify_credentials.json",
            &[],
            "abc123",
            "1318622958",
        );

        assert!(header.starts_with("OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\""));
        assert!(header.contains("oauth_nonce=\"abc123\""));
        assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
        assert!(header.contains("oauth_timestamp=\"1318622958\""));
        assert!(header.contains("oauth_version=\"1.0\""));
        assert!(header.contains("oauth_signature=\""));
    }
}
