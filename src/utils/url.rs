//! URL helpers for building backend endpoints.
//!
//! Base URLs come from user configuration, so they arrive with or without a
//! trailing slash. Both spellings must address the same server.

/// Strip trailing slashes from a base URL.
///
/// # Examples
///
/// ```
/// use confab::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:11434"), "http://localhost:11434");
/// assert_eq!(normalize_base_url("http://localhost:11434/"), "http://localhost:11434");
/// ```
pub fn normalize_base_url(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

/// Join a base URL and an endpoint path with exactly one slash between them.
///
/// # Examples
///
/// ```
/// use confab::utils::url::endpoint_url;
///
/// assert_eq!(
///     endpoint_url("http://localhost:11434/", "api/chat"),
///     "http://localhost:11434/api/chat"
/// );
/// assert_eq!(
///     endpoint_url("https://api.openai.com/v1", "/chat/completions"),
///     "https://api.openai.com/v1/chat/completions"
/// );
/// ```
pub fn endpoint_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        normalize_base_url(base_url),
        endpoint.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_any_number_of_trailing_slashes() {
        assert_eq!(
            normalize_base_url("http://localhost:11434"),
            "http://localhost:11434"
        );
        assert_eq!(
            normalize_base_url("http://localhost:11434/"),
            "http://localhost:11434"
        );
        assert_eq!(
            normalize_base_url("http://localhost:11434///"),
            "http://localhost:11434"
        );
        assert_eq!(normalize_base_url(""), "");
    }

    #[test]
    fn slashed_and_unslashed_bases_produce_the_same_endpoint() {
        assert_eq!(
            endpoint_url("http://localhost:11434", "api/chat"),
            "http://localhost:11434/api/chat"
        );
        assert_eq!(
            endpoint_url("http://localhost:11434/", "api/chat"),
            "http://localhost:11434/api/chat"
        );
    }

    #[test]
    fn leading_slashes_on_the_endpoint_do_not_double_up() {
        assert_eq!(
            endpoint_url("https://api.openai.com/v1/", "/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            endpoint_url("https://api.openai.com/v1", "///models"),
            "https://api.openai.com/v1/models"
        );
    }
}
