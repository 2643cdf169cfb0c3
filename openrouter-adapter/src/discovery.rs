//! Locates the OpenRouter API key.

use crate::error::OpenRouterError;

/// Environment variable holding the OpenRouter API key.
pub const API_KEY_ENV_VAR: &str = "OPEN_ROUTER_API_KEY";

/// Locates the OpenRouter API key.
///
/// Resolution order:
/// 1. `explicit` if provided and non-blank.
/// 2. The `OPEN_ROUTER_API_KEY` environment variable.
/// 3. Helpful error.
///
/// Callers that support `.env` files load them before calling this.
///
/// # Errors
///
/// Returns `OpenRouterError::ApiKeyNotFound` when neither source yields a key.
pub fn discover_api_key(explicit: Option<String>) -> Result<String, OpenRouterError> {
    resolve_api_key(explicit, std::env::var(API_KEY_ENV_VAR).ok())
}

fn resolve_api_key(
    explicit: Option<String>,
    from_env: Option<String>,
) -> Result<String, OpenRouterError> {
    let non_blank = |key: String| {
        let key = key.trim().to_string();
        (!key.is_empty()).then_some(key)
    };

    if let Some(key) = explicit.and_then(non_blank) {
        return Ok(key);
    }

    if let Some(key) = from_env.and_then(non_blank) {
        return Ok(key);
    }

    Err(OpenRouterError::ApiKeyNotFound(format!(
        "set {API_KEY_ENV_VAR} in the environment or a .env file.\n\
         Keys are created at https://openrouter.ai/keys"
    )))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn explicit_key_wins() {
        let key = resolve_api_key(Some("sk-explicit".into()), Some("sk-env".into())).unwrap();
        assert_eq!(key, "sk-explicit");
    }

    #[test]
    fn blank_explicit_falls_back_to_env() {
        let key = resolve_api_key(Some("  ".into()), Some(" sk-env\n".into())).unwrap();
        assert_eq!(key, "sk-env");
    }

    #[test]
    fn missing_key_names_the_variable() {
        let err = resolve_api_key(None, Some(String::new())).unwrap_err();
        assert!(matches!(err, OpenRouterError::ApiKeyNotFound(_)));
        assert!(err.to_string().contains(API_KEY_ENV_VAR));
    }
}
