//! The fetch module downloads a single webpage and reduces it to a title,
//! readable body text and the raw link targets found on it.

use log::debug;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use crate::constants::{NO_TITLE, USER_AGENT};
use crate::error::{Error, Result};

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("Failed to compile title selector"));
static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("Failed to compile body selector"));
static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("Failed to compile anchor selector"));

/// Elements whose content never reaches the body text.
const STRIPPED_ELEMENTS: [&str; 4] = ["script", "style", "img", "input"];

/// A webpage reduced to what the brochure pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// The URL the page was requested from.
    pub url: String,
    /// Text of the first `<title>`, or [`NO_TITLE`].
    pub title: String,
    /// Body text nodes, trimmed and joined by newlines.
    pub text: String,
    /// Non-empty `href` values of every anchor, in document order, unresolved.
    pub links: Vec<String>,
}

impl FetchedPage {
    /// Renders the title and text block folded into the aggregated document.
    pub fn contents(&self) -> String {
        format!(
            "Webpage Title:\n{}\nWebpage Contents:\n{}\n\n",
            self.title, self.text
        )
    }
}

/// Fetches pages over HTTP with a shared client.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl Default for PageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PageFetcher {
    /// Creates a fetcher with the default HTTP client settings.
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }

    /// Creates a fetcher around an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Downloads `url` and parses it into a [`FetchedPage`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`] if the request fails, the server answers with a
    /// non-success status, or the body cannot be read.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let fetch_error = |source| Error::Fetch {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(fetch_error)?;
        let html = response.text().await.map_err(fetch_error)?;

        let page = parse_page(url, &html);
        debug!(
            "Fetched {url}: {} chars of text, {} links",
            page.text.len(),
            page.links.len()
        );
        Ok(page)
    }
}

/// Parses raw HTML into a [`FetchedPage`].
///
/// A document without body content yields empty text rather than an error.
pub fn parse_page(url: &str, html: &str) -> FetchedPage {
    let document = Html::parse_document(html);

    FetchedPage {
        url: url.to_string(),
        title: parse_title(&document),
        text: parse_body_text(&document),
        links: parse_links(&document),
    }
}

fn parse_title(document: &Html) -> String {
    document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|title| title.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string())
}

fn parse_body_text(document: &Html) -> String {
    let mut fragments = Vec::new();
    if let Some(body) = document.select(&BODY_SELECTOR).next() {
        collect_text(body, &mut fragments);
    }
    fragments.join("\n")
}

fn collect_text(element: ElementRef<'_>, fragments: &mut Vec<String>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let text = text.trim();
            if !text.is_empty() {
                fragments.push(text.to_string());
            }
        } else if let Some(child_element) = ElementRef::wrap(child)
            && !STRIPPED_ELEMENTS.contains(&child_element.value().name())
        {
            collect_text(child_element, fragments);
        }
    }
}

fn parse_links(document: &Html) -> Vec<String> {
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_styles_images_and_inputs() {
        let html = r#"<html><head><title>Acme</title></head><body>
            <h1>Welcome</h1>
            <script>var secret = "hidden";</script>
            <style>.hidden { color: red; }</style>
            <img src="logo.png" alt="logo alt text">
            <input type="text" value="typed value">
            <p>We build <b>rockets</b>.</p>
        </body></html>"#;

        let page = parse_page("https://acme.test", html);

        assert_eq!(page.title, "Acme");
        assert_eq!(page.text, "Welcome\nWe build\nrockets\n.");
        for leaked in ["secret", "hidden", "logo", "typed value", "color"] {
            assert!(!page.text.contains(leaked), "{leaked} leaked into text");
        }
    }

    #[test]
    fn missing_title_uses_sentinel() {
        let page = parse_page("https://acme.test", "<body><p>Hi</p></body>");
        assert_eq!(page.title, NO_TITLE);

        let page = parse_page("https://acme.test", "<title>   </title><p>Hi</p>");
        assert_eq!(page.title, NO_TITLE);
    }

    #[test]
    fn empty_body_is_empty_text() {
        let page = parse_page("https://acme.test", "<html><head><title>T</title></head></html>");
        assert_eq!(page.text, "");
    }

    #[test]
    fn links_keep_order_and_drop_empty_hrefs() {
        let html = r#"<body>
            <a href="/about">About</a>
            <a>No href</a>
            <a href="">Empty</a>
            <a href="https://acme.test/careers">Careers</a>
            <a href="mailto:hi@acme.test">Mail</a>
        </body>"#;

        let page = parse_page("https://acme.test", html);

        assert_eq!(
            page.links,
            vec!["/about", "https://acme.test/careers", "mailto:hi@acme.test"]
        );
    }

    #[test]
    fn contents_block_layout() {
        let page = FetchedPage {
            url: "https://acme.test".to_string(),
            title: "Acme".to_string(),
            text: "Rockets".to_string(),
            links: vec![],
        };
        assert_eq!(
            page.contents(),
            "Webpage Title:\nAcme\nWebpage Contents:\nRockets\n\n"
        );
    }
}
