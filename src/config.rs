//! Model settings resolved once at startup and the LLM providers built from them.

use std::str::FromStr;

use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::{ChatProvider, StructuredOutputFormat};
use log::{info, warn};
use url::Url;

use crate::constants::{
    BROCHURE_SYSTEM_PROMPT, EXPECTED_API_KEY_PREFIX, FALLBACK_API_KEY_ENV_NAME,
    LINK_RESPONSE_SCHEMA, LINK_SYSTEM_PROMPT, MODEL_API_KEY_ENV_NAME,
};
use crate::error::{Error, Result};

/// Which model to talk to and with which credential.
#[derive(Clone, Debug)]
pub struct ModelSettings {
    /// Model URL in the `backend://model` form, e.g. `openai://gpt-4o-mini`.
    pub model: Url,
    pub api_key: Option<String>,
}

impl ModelSettings {
    /// Parses the model URL and keeps the given key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] if `model` is not a valid URL.
    pub fn new(model: &str, api_key: Option<String>) -> Result<Self> {
        let model = Url::parse(model).map_err(|e| Error::Model(format!("Invalid model URL: {e}")))?;
        Ok(Self { model, api_key })
    }

    /// Like [`ModelSettings::new`], reading the key from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] if `model` is not a valid URL.
    pub fn from_env(model: &str) -> Result<Self> {
        let api_key = std::env::var(MODEL_API_KEY_ENV_NAME)
            .or_else(|_| std::env::var(FALLBACK_API_KEY_ENV_NAME))
            .ok()
            .filter(|key| !key.is_empty());
        Self::new(model, api_key)
    }

    /// Logs whether the key looks plausible. Never rejects it.
    pub fn check_api_key(&self) -> bool {
        match &self.api_key {
            Some(key) if key.starts_with(EXPECTED_API_KEY_PREFIX) => {
                info!("API key looks good so far");
                true
            }
            Some(_) => {
                warn!("There might be a problem with your API key: unexpected prefix");
                false
            }
            None => {
                warn!(
                    "No API key found in {MODEL_API_KEY_ENV_NAME} or {FALLBACK_API_KEY_ENV_NAME}"
                );
                false
            }
        }
    }

    fn builder(&self) -> Result<LLMBuilder> {
        let backend = LLMBackend::from_str(self.model.scheme())
            .map_err(|e| Error::Model(format!("Invalid LLM backend: {e}")))?;
        let name = [
            self.model
                .host_str()
                .ok_or_else(|| Error::Model("Specify model name as host URL.".to_string()))?,
            self.model.username(),
        ]
        .iter()
        .filter(|x| !x.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(":");

        let builder = LLMBuilder::new().backend(backend).model(name);
        Ok(match &self.api_key {
            Some(key) => builder.api_key(key.clone()),
            None => builder,
        })
    }

    /// Builds the provider used for link selection, asking for JSON output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] if the backend is unknown or the provider
    /// cannot be built.
    pub fn link_model(&self) -> Result<Box<dyn ChatProvider>> {
        let schema: StructuredOutputFormat = serde_json::from_str(LINK_RESPONSE_SCHEMA)
            .map_err(|e| Error::Model(format!("Invalid link response schema: {e}")))?;
        let model = self
            .builder()?
            .system(LINK_SYSTEM_PROMPT)
            .schema(schema)
            .build()
            .map_err(|e| Error::Model(e.to_string()))?;
        let model: Box<dyn ChatProvider> = model;
        Ok(model)
    }

    /// Builds the provider that writes the brochure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] if the backend is unknown or the provider
    /// cannot be built.
    pub fn brochure_model(&self) -> Result<Box<dyn ChatProvider>> {
        let model = self
            .builder()?
            .system(BROCHURE_SYSTEM_PROMPT)
            .build()
            .map_err(|e| Error::Model(e.to_string()))?;
        let model: Box<dyn ChatProvider> = model;
        Ok(model)
    }
}
