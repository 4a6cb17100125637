use unidash_core::{RefreshFailurePolicy, UnidashConfig};

/// Defaults overridden by build-time environment variables
pub fn app_config() -> UnidashConfig {
    let mut config = UnidashConfig::default();

    if let Some(url) = option_env!("UNIDASH_API_URL") {
        config.api.base_url = url.to_string();
    }
    if let Some(url) = option_env!("UNIDASH_IDENTITY_URL") {
        config.identity.url = url.to_string();
    }
    if let Some(key) = option_env!("UNIDASH_IDENTITY_ANON_KEY") {
        config.identity.anon_key = key.to_string();
    }
    if let Some(location) = option_env!("UNIDASH_EXPIRED_REDIRECT") {
        config.session.refresh_failure = RefreshFailurePolicy::Redirect {
            location: location.to_string(),
        };
    }

    config
}
