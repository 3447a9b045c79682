//! Fetching source images by URL, including `data:` URLs from base64 image models.

use base64::Engine;
use base64::engine::general_purpose;
use tracing::debug;
use url::Url;

/// Why an image could not be fetched.
#[derive(Debug)]
pub enum FetchError {
    /// The URL did not parse.
    InvalidUrl(url::ParseError),
    /// Only http, https and data URLs are fetched.
    UnsupportedScheme(String),
    /// A `data:` URL that isn't base64 or doesn't decode.
    InvalidDataUrl(String),
    /// The request failed before a response arrived.
    Transport(reqwest::Error),
    /// The remote answered with a non-success status.
    Status(u16),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUrl(err) => write!(f, "invalid image URL: {err}"),
            Self::UnsupportedScheme(scheme) => write!(f, "unsupported URL scheme {scheme:?}"),
            Self::InvalidDataUrl(detail) => write!(f, "invalid data URL: {detail}"),
            Self::Transport(err) => write!(f, "image request failed: {err}"),
            Self::Status(status) => write!(f, "image request returned status {status}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<url::ParseError> for FetchError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err)
    }
}

/// Returns the raw bytes behind `raw_url`.
pub async fn fetch_image_bytes(client: &reqwest::Client, raw_url: &str) -> Result<Vec<u8>, FetchError> {
    let url = Url::parse(raw_url.trim())?;
    match url.scheme() {
        "data" => decode_data_url(url.as_str()),
        "http" | "https" => {
            debug!("Fetching image from {}", url.host_str().unwrap_or_default());
            let resp = client.get(url).send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }
            Ok(resp.bytes().await?.to_vec())
        }
        other => Err(FetchError::UnsupportedScheme(other.to_string())),
    }
}

/// Decodes a base64 `data:` URL.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, FetchError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| FetchError::InvalidDataUrl("missing data: prefix".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| FetchError::InvalidDataUrl("missing payload".to_string()))?;
    if !meta.ends_with(";base64") {
        return Err(FetchError::InvalidDataUrl(
            "only base64 payloads are supported".to_string(),
        ));
    }
    general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|err| FetchError::InvalidDataUrl(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_base64_data_urls() {
        let bytes = decode_data_url("data:image/png;base64,aGVsbG8=").expect("decode");
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn rejects_plain_data_urls() {
        assert!(matches!(
            decode_data_url("data:text/plain,hello"),
            Err(FetchError::InvalidDataUrl(_))
        ));
        assert!(matches!(
            decode_data_url("data:image/png;base64,@@@"),
            Err(FetchError::InvalidDataUrl(_))
        ));
    }

    #[tokio::test]
    async fn rejects_other_schemes() {
        let client = reqwest::Client::new();
        assert!(matches!(
            fetch_image_bytes(&client, "file:///etc/passwd").await,
            Err(FetchError::UnsupportedScheme(scheme)) if scheme == "file"
        ));
        assert!(matches!(
            fetch_image_bytes(&client, "not a url").await,
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn fetches_data_urls_without_network() {
        let client = reqwest::Client::new();
        let bytes = fetch_image_bytes(&client, "data:image/png;base64,aGVsbG8=")
            .await
            .expect("fetch");
        assert_eq!(bytes, b"hello");
    }
}
