//! Reported page URL validation.

use std::sync::LazyLock;

use regex::Regex;

use crate::RegistryError;

/// Accepts `http(s)://[www.]facebook.com/...` and `fb.com` short links.
static FACEBOOK_PAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(www\.)?(facebook|fb)\.com/.+").expect("valid regex")
});

/// Returns whether `url` looks like a Facebook page URL. The URL is matched
/// as given, so leading whitespace fails the scheme anchor.
#[must_use]
pub fn is_facebook_page_url(url: &str) -> bool {
    FACEBOOK_PAGE_RE.is_match(url)
}

/// Validates a submitted page URL.
///
/// # Errors
///
/// Returns [`RegistryError::Validation`] if the URL is blank or does not
/// point at a Facebook page.
pub fn validate_page_url(url: &str) -> Result<(), RegistryError> {
    if url.trim().is_empty() {
        return Err(RegistryError::Validation {
            message: "URL is required".to_string(),
        });
    }

    if !is_facebook_page_url(url) {
        return Err(RegistryError::Validation {
            message: "Please provide a valid Facebook URL".to_string(),
        });
    }

    Ok(())
}
