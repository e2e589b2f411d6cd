use crate::error::{CoreError, Result};
use url::Url;

/// Longest accepted URL in bytes; matches the `original_url` column width.
pub const MAX_URL_LENGTH: usize = 2000;

/// Validates that `raw` is an absolute `http`/`https` URL with a non-empty host
/// and at most [`MAX_URL_LENGTH`] bytes.
pub fn validate_url(raw: &str) -> Result<Url> {
    if raw.trim().is_empty() {
        return Err(CoreError::InvalidUrl("URL cannot be empty".to_string()));
    }
    if raw.len() > MAX_URL_LENGTH {
        return Err(CoreError::InvalidUrl(format!(
            "URL is {} bytes long, the limit is {MAX_URL_LENGTH}",
            raw.len()
        )));
    }

    let url = Url::parse(raw).map_err(|e| CoreError::InvalidUrl(format!("{raw}: {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(CoreError::InvalidUrl(format!(
                "URL scheme must be http or https: {other}"
            )))
        }
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(CoreError::InvalidUrl(format!("URL must have a host: {raw}")));
    }

    Ok(url)
}
