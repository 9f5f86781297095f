#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;

use crate::domain::models::GenerationError;

/// Providers that can serve requests without an API key.
pub const OPTIONAL_CREDENTIAL_PROVIDERS: &[&str] = &["ollama", "vertex"];

/// Name of the server side variable holding the key for `provider`.
pub fn credential_env_var(provider: &str) -> String {
    let provider = provider.trim().to_uppercase().replace(['-', ' ', '.'], "_");
    return format!("{provider}_API_KEY");
}

/// Picks the credential for a request: the caller's own key, then the server
/// environment. Fails when neither exists and the provider needs one.
pub fn resolve_credential<F>(
    provider: &str,
    caller_key: Option<&str>,
    lookup_env: F,
) -> Result<Option<String>, GenerationError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = caller_key.filter(|key| return !key.is_empty()) {
        return Ok(Some(key.to_string()));
    }

    let env_var = credential_env_var(provider);
    if let Some(key) = lookup_env(&env_var).filter(|key| return !key.is_empty()) {
        return Ok(Some(key));
    }

    if OPTIONAL_CREDENTIAL_PROVIDERS.contains(&provider.to_lowercase().as_str()) {
        return Ok(None);
    }

    tracing::warn!(provider = provider, env_var = %env_var, "No credential for provider");
    return Err(GenerationError::AccessDenied(format!(
        "missing API key for provider '{provider}', set {env_var}"
    )));
}
