//! Configuration read from environment variables.

use itinera_core::{Edition, SessionBuilder};
use itinera_gemini_model::{GeminiConfigBuilder, GeminiProvider};

/// Variable holding the Gemini API key.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
/// Variable overriding the Gemini model name.
pub const MODEL_VAR: &str = "GEMINI_MODEL";
/// Variable overriding the Gemini endpoint.
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";
/// Variable selecting the edition, `basic` or `pro`.
pub const EDITION_VAR: &str = "ITINERA_EDITION";

/// Startup configuration.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// The API key, `None` leaves the session unconfigured.
    pub api_key: Option<String>,
    /// The model name, the provider default if `None`.
    pub model: Option<String>,
    /// The endpoint, the provider default if `None`.
    pub base_url: Option<String>,
    /// The edition.
    pub edition: Edition,
}

impl Config {
    /// Reads the configuration from the process environment.
    #[inline]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration with a custom variable lookup.
    ///
    /// Blank values count as unset. An unknown edition falls back to the
    /// default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let edition = match var(EDITION_VAR).map(|value| value.parse()) {
            Some(Ok(edition)) => edition,
            Some(Err(err)) => {
                warn!("{err}, using the default edition");
                Edition::default()
            }
            None => Edition::default(),
        };

        Self {
            api_key: var(API_KEY_VAR),
            model: var(MODEL_VAR),
            base_url: var(BASE_URL_VAR),
            edition,
        }
    }

    /// Creates a session builder for this configuration.
    ///
    /// Without an API key the session is built unconfigured, it can still
    /// browse and export but not generate.
    pub fn session_builder(&self) -> SessionBuilder {
        let builder = match &self.api_key {
            Some(api_key) => {
                let mut config = GeminiConfigBuilder::with_api_key(api_key);
                if let Some(model) = &self.model {
                    config = config.with_model(model);
                }
                if let Some(base_url) = &self.base_url {
                    config = config.with_base_url(base_url);
                }
                let config = config.build();
                debug!("using model {}", config.model());
                SessionBuilder::with_model_provider(GeminiProvider::new(config))
            }
            None => {
                warn!("{API_KEY_VAR} is not set, generation is disabled");
                SessionBuilder::unconfigured()
            }
        };
        builder.with_edition(self.edition)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("edition", &self.edition)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config, Config::default());
        assert_eq!(config.edition, Edition::Pro);
        assert!(!config.session_builder().build().is_configured());
    }

    #[test]
    fn test_from_lookup() {
        let config = config(&[
            (API_KEY_VAR, "secret"),
            (MODEL_VAR, " gemini-2.5-pro "),
            (BASE_URL_VAR, ""),
            (EDITION_VAR, "Basic"),
        ]);
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(config.base_url, None);
        assert_eq!(config.edition, Edition::Basic);
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));

        let session = config.session_builder().build();
        assert!(session.is_configured());
        assert_eq!(session.edition(), Edition::Basic);
    }

    #[test]
    fn test_unknown_edition() {
        let config = config(&[(EDITION_VAR, "deluxe")]);
        assert_eq!(config.edition, Edition::Pro);
    }
}
