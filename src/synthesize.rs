//! The synthesize module drives the whole scrape-select-fetch-summarize
//! pipeline and asks the model for the final brochure.

use futures::{Stream, StreamExt};
use llm::chat::{ChatMessage, ChatProvider};
use log::info;
use url::Url;

use crate::aggregate::{AggregatedDocument, FailurePolicy, aggregate};
use crate::config::ModelSettings;
use crate::error::{Error, Result};
use crate::fetch::PageFetcher;
use crate::render::strip_fence_artifacts;

/// A generated brochure together with what was left out while building it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Brochure {
    /// Model output, verbatim.
    pub markdown: String,
    /// The document the brochure was written from.
    pub details: AggregatedDocument,
}

/// Everything needed to turn a company URL into a brochure.
pub struct Pipeline {
    fetcher: PageFetcher,
    link_model: Box<dyn ChatProvider>,
    brochure_model: Box<dyn ChatProvider>,
    policy: FailurePolicy,
}

impl Pipeline {
    /// Creates a pipeline from already built providers.
    pub fn new(
        fetcher: PageFetcher,
        link_model: Box<dyn ChatProvider>,
        brochure_model: Box<dyn ChatProvider>,
    ) -> Self {
        Self {
            fetcher,
            link_model,
            brochure_model,
            policy: FailurePolicy::default(),
        }
    }

    /// Builds both providers from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] if either provider cannot be built.
    pub fn from_settings(settings: &ModelSettings) -> Result<Self> {
        Ok(Self::new(
            PageFetcher::new(),
            settings.link_model()?,
            settings.brochure_model()?,
        ))
    }

    /// Sets how failing sub-pages are handled.
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// How failing sub-pages are handled.
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Scrapes `url` and writes a brochure for `company_name`, optionally in
    /// `language`.
    ///
    /// # Errors
    ///
    /// Returns an error if aggregation fails (see [`aggregate`]), the
    /// completion call fails, or the model answers with blank text.
    pub async fn create_brochure(
        &self,
        company_name: &str,
        url: &str,
        language: Option<&str>,
    ) -> Result<Brochure> {
        let (details, messages) = self.prepare(company_name, url, language).await?;

        let markdown = self
            .brochure_model
            .chat(&messages)
            .await
            .map_err(|err| Error::Llm(err.to_string()))?
            .to_string();

        finish(markdown, details)
    }

    /// Like [`Pipeline::create_brochure`], but streams the answer. After every
    /// chunk `on_partial` receives the text so far with code fences stripped.
    /// The returned brochure holds the full answer verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error if aggregation fails, the backend cannot stream or a
    /// chunk fails, or the model answers with blank text.
    pub async fn stream_brochure<F>(
        &self,
        company_name: &str,
        url: &str,
        language: Option<&str>,
        on_partial: F,
    ) -> Result<Brochure>
    where
        F: FnMut(&str),
    {
        let (details, messages) = self.prepare(company_name, url, language).await?;

        let stream = self
            .brochure_model
            .chat_stream(&messages)
            .await
            .map_err(|err| Error::Llm(err.to_string()))?;
        let markdown = accumulate_stream(stream, on_partial).await?;

        finish(markdown, details)
    }

    async fn prepare(
        &self,
        company_name: &str,
        url: &str,
        language: Option<&str>,
    ) -> Result<(AggregatedDocument, Vec<ChatMessage>)> {
        info!("Creating brochure for {company_name} from {url}");
        let details = aggregate(&self.fetcher, self.link_model.as_ref(), url, self.policy).await?;

        let messages = vec![
            ChatMessage::user()
                .content(brochure_user_prompt(company_name, &details.text, language))
                .build(),
        ];
        Ok((details, messages))
    }
}

fn finish(markdown: String, details: AggregatedDocument) -> Result<Brochure> {
    if markdown.trim().is_empty() {
        return Err(Error::EmptyBrochure);
    }
    Ok(Brochure { markdown, details })
}

/// Collects streamed chunks into the full answer, reporting the cleaned
/// partial text after each one.
///
/// # Errors
///
/// Returns [`Error::Llm`] on the first failed chunk.
pub async fn accumulate_stream<S, E, F>(mut stream: S, mut on_partial: F) -> Result<String>
where
    S: Stream<Item = std::result::Result<String, E>> + Unpin,
    E: std::fmt::Display,
    F: FnMut(&str),
{
    let mut markdown = String::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| Error::Llm(err.to_string()))?;
        markdown.push_str(&chunk);
        on_partial(&strip_fence_artifacts(&markdown));
    }
    Ok(markdown)
}

/// Builds the user message embedding the company name and aggregated text.
pub fn brochure_user_prompt(company_name: &str, details: &str, language: Option<&str>) -> String {
    let mut prompt = format!(
        "You are looking at a company called: {company_name}\nHere are the contents of its landing page and other relevant pages; use this information to build a short brochure of the company in markdown.\n"
    );
    if let Some(language) = language.map(str::trim).filter(|language| !language.is_empty()) {
        prompt.push_str(&format!("Write the brochure in {language}.\n"));
    }
    prompt.push_str(details);
    prompt
}

/// Picks a display name for the company: `name` if given, else the URL host.
pub fn company_name_or_host(name: &str, url: &str) -> String {
    let name = name.trim();
    if !name.is_empty() {
        return name.to_string();
    }

    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}
