//! Error types shared by the brochure pipeline.

use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for pipeline operations
#[derive(Debug, Error)]
pub enum Error {
    /// A page could not be fetched or answered with a non-success status
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The link selection reply did not match `{"links": [{"type", "url"}]}`
    #[error("Malformed link selection response: {0}")]
    MalformedResponse(String),

    /// The completion endpoint failed
    #[error("LLM error: {0}")]
    Llm(String),

    /// The LLM provider could not be built from the settings
    #[error("Unable to build LLM model: {0}")]
    Model(String),

    /// The model returned blank brochure text
    #[error("Could not generate summary")]
    EmptyBrochure,
}
