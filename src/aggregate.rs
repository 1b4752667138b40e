//! The aggregate module folds the landing page and every selected sub-page
//! into one document for the brochure prompt.

use llm::chat::ChatProvider;
use log::{info, warn};

use crate::constants::MAX_DETAILS_CHARS;
use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::select::select_links;

/// What to do when a selected sub-page cannot be fetched.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum FailurePolicy {
    /// Abort the whole aggregation.
    #[default]
    FailFast,
    /// Record the page as omitted and continue with the next one.
    SkipFailed,
}

/// A selected page left out of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OmittedPage {
    pub label: String,
    pub url: String,
    pub reason: String,
}

/// The flattened page text handed to the brochure model.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AggregatedDocument {
    /// Landing page section followed by one section per selected link, capped
    /// at [`MAX_DETAILS_CHARS`] characters.
    pub text: String,
    /// Pages skipped under [`FailurePolicy::SkipFailed`].
    pub omitted: Vec<OmittedPage>,
}

/// Fetches `url`, lets `link_model` pick relevant sub-pages and appends each
/// of them under its label.
///
/// # Errors
///
/// Returns an error if the landing page cannot be fetched, link selection
/// fails, or (with [`FailurePolicy::FailFast`]) any selected page cannot be
/// fetched.
pub async fn aggregate(
    fetcher: &PageFetcher,
    link_model: &dyn ChatProvider,
    url: &str,
    policy: FailurePolicy,
) -> Result<AggregatedDocument> {
    let landing = fetcher.fetch(url).await?;
    let mut document = AggregatedDocument {
        text: format!("Landing page:\n{}", landing.contents()),
        omitted: Vec::new(),
    };

    let selection = select_links(link_model, &landing).await?;

    for link in selection {
        let page = match fetcher.fetch(&link.url).await {
            Ok(page) => page,
            Err(err) if policy == FailurePolicy::SkipFailed => {
                warn!("Skipping {} ({}): {err}", link.url, link.kind);
                document.omitted.push(OmittedPage {
                    label: link.kind,
                    url: link.url,
                    reason: err.to_string(),
                });
                continue;
            }
            Err(err) => return Err(err),
        };

        document.text.push_str(&format!("\n\n{}\n", link.kind));
        document.text.push_str(&page.contents());
    }

    truncate_chars(&mut document.text, MAX_DETAILS_CHARS);
    info!(
        "Aggregated {} chars from {url}, {} pages omitted",
        document.text.chars().count(),
        document.omitted.len()
    );

    Ok(document)
}

/// Cuts `text` down to at most `max_chars` characters.
pub fn truncate_chars(text: &mut String, max_chars: usize) {
    if let Some((byte_index, _)) = text.char_indices().nth(max_chars) {
        text.truncate(byte_index);
    }
}
