//! The select module asks the model which links of a landing page belong in a
//! company brochure and validates the JSON it answers with.

use llm::chat::{ChatMessage, ChatProvider};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{FENCE_STRIPPER, THINK_STRIPPER};
use crate::error::{Error, Result};
use crate::fetch::FetchedPage;

static THINK_STRIPPER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(THINK_STRIPPER).expect("Failed to compile THINK_STRIPPER regex"));
static FENCE_STRIPPER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(FENCE_STRIPPER).expect("Failed to compile FENCE_STRIPPER regex"));

/// A link the model considers relevant for the brochure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSelection {
    /// Free-text label such as "about page".
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Absolute URL of the page.
    pub url: String,
}

/// Builds the user message listing the raw links of `page`.
pub fn links_user_prompt(page: &FetchedPage) -> String {
    let mut prompt = format!(
        "Here is the list of links on the website of {} - please decide which of these are relevant web links for a brochure about the company, respond with the full https URL in JSON format. Do not include Terms of Service, Privacy, or email links.\nLinks (some might be relative links):\n",
        page.url
    );
    prompt.push_str(&page.links.join("\n"));
    prompt
}

/// Sends the links of `page` to the model and returns its selection in the
/// order the model gave it.
///
/// # Errors
///
/// Returns [`Error::Llm`] if the completion call fails, or
/// [`Error::MalformedResponse`] if the reply is not shaped as
/// `{"links": [{"type": str, "url": str}]}`.
pub async fn select_links(
    model: &dyn ChatProvider,
    page: &FetchedPage,
) -> Result<Vec<LinkSelection>> {
    let messages = vec![ChatMessage::user().content(links_user_prompt(page)).build()];

    let response = model
        .chat(&messages)
        .await
        .map_err(|err| Error::Llm(err.to_string()))?
        .to_string();

    let selection = parse_link_selection(&response)?;
    info!(
        "Found links: {}",
        selection
            .iter()
            .map(|link| format!("{} ({})", link.kind, link.url))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(selection)
}

/// Validates a raw link selection reply.
///
/// Reasoning blocks and a surrounding code fence are tolerated; everything else
/// must match the expected shape.
///
/// # Errors
///
/// Returns [`Error::MalformedResponse`] if the reply is not JSON, lacks a
/// `links` list, or contains an entry without a string `url`.
pub fn parse_link_selection(raw: &str) -> Result<Vec<LinkSelection>> {
    let cleaned = THINK_STRIPPER_REGEX.replace_all(raw, "");
    let cleaned = match FENCE_STRIPPER_REGEX.captures(&cleaned) {
        Some(captures) => captures
            .get(1)
            .map(|inner| inner.as_str().to_string())
            .unwrap_or_default(),
        None => cleaned.trim().to_string(),
    };

    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|err| Error::MalformedResponse(format!("reply is not JSON: {err}")))?;

    let links = value
        .get("links")
        .ok_or_else(|| Error::MalformedResponse("missing \"links\" key".to_string()))?;
    let entries = links
        .as_array()
        .ok_or_else(|| Error::MalformedResponse("\"links\" is not a list".to_string()))?;

    entries
        .iter()
        .enumerate()
        .map(|(position, entry)| {
            LinkSelection::deserialize(entry).map_err(|err| {
                Error::MalformedResponse(format!("link entry {position} is invalid: {err}"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landing() -> FetchedPage {
        FetchedPage {
            url: "https://acme.test".to_string(),
            title: "Acme".to_string(),
            text: String::new(),
            links: vec!["/about".to_string(), "https://acme.test/jobs".to_string()],
        }
    }

    #[test]
    fn user_prompt_lists_every_link() {
        let prompt = links_user_prompt(&landing());
        assert!(prompt.contains("website of https://acme.test"));
        assert!(prompt.ends_with("Links (some might be relative links):\n/about\nhttps://acme.test/jobs"));
    }

    #[test]
    fn parses_links_in_model_order() {
        let raw = r#"{"links": [
            {"type": "careers page", "url": "https://acme.test/jobs"},
            {"type": "about page", "url": "https://acme.test/about"}
        ]}"#;

        let links = parse_link_selection(raw).expect("valid reply");

        assert_eq!(
            links,
            vec![
                LinkSelection {
                    kind: "careers page".to_string(),
                    url: "https://acme.test/jobs".to_string()
                },
                LinkSelection {
                    kind: "about page".to_string(),
                    url: "https://acme.test/about".to_string()
                },
            ]
        );
    }

    #[test]
    fn empty_list_is_valid() {
        assert_eq!(parse_link_selection(r#"{"links": []}"#).expect("valid"), vec![]);
    }

    #[test]
    fn tolerates_think_block_and_code_fence() {
        let raw = "<think>hmm</think>\n```json\n{\"links\": [{\"type\": \"about page\", \"url\": \"https://acme.test/about\"}]}\n```";
        let links = parse_link_selection(raw).expect("valid reply");
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn missing_type_defaults_to_empty_label() {
        let links =
            parse_link_selection(r#"{"links": [{"url": "https://acme.test/about"}]}"#).expect("valid");
        assert_eq!(links.first().map(|link| link.kind.as_str()), Some(""));
    }

    #[test]
    fn rejects_malformed_replies() {
        for raw in [
            "Sure! Here are the links you asked for.",
            r#"{"pages": []}"#,
            r#"{"links": "https://acme.test/about"}"#,
            r#"{"links": [{"type": "about page"}]}"#,
            r#"[{"type": "about page", "url": "https://acme.test/about"}]"#,
        ] {
            let result = parse_link_selection(raw);
            assert!(
                matches!(result, Err(Error::MalformedResponse(_))),
                "{raw} gave {result:?}"
            );
        }
    }
}
