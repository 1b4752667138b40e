#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use llm::{
    chat::{ChatMessage, ChatProvider, ChatResponse, Tool},
    error::LLMError,
};

/// Chat provider answering every request with the same text and counting calls.
pub(crate) struct StubLlmProvider {
    response_content: String,
    calls: Arc<AtomicUsize>,
}

impl StubLlmProvider {
    pub fn new(response_content: impl Into<String>) -> Self {
        StubLlmProvider {
            response_content: response_content.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle to the call counter that survives boxing the provider.
    pub fn calls(&self) -> CallCounter {
        CallCounter(Arc::clone(&self.calls))
    }
}

#[derive(Clone)]
pub(crate) struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl ChatProvider for StubLlmProvider {
    fn chat<'life0, 'life1, 'async_trait>(
        &'life0 self,
        _messages: &'life1 [ChatMessage],
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Box<dyn ChatResponse>, LLMError>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        self.calls.fetch_add(1, Ordering::SeqCst);

        Box::pin(async move {
            #[derive(Debug)]
            struct StringResponse(String);

            impl ChatResponse for StringResponse {
                fn text(&self) -> Option<String> {
                    Some(self.0.clone())
                }

                fn tool_calls(&self) -> Option<Vec<llm::ToolCall>> {
                    panic!()
                }

                fn thinking(&self) -> Option<String> {
                    None
                }

                fn usage(&self) -> Option<llm::chat::Usage> {
                    None
                }
            }

            impl std::fmt::Display for StringResponse {
                fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(formatter, "{}", self.0)
                }
            }

            Ok(Box::new(StringResponse(self.response_content.clone())) as Box<dyn ChatResponse>)
        })
    }

    fn chat_with_tools<'life0, 'life1, 'life2, 'async_trait>(
        &'life0 self,
        _messages: &'life1 [ChatMessage],
        _tools: Option<&'life2 [Tool]>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Box<dyn ChatResponse>, LLMError>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        'life2: 'async_trait,
        Self: 'async_trait,
    {
        panic!()
    }
}

/// A landing page linking to the given paths.
pub(crate) fn landing_html(title: &str, text: &str, links: &[&str]) -> String {
    let anchors = links
        .iter()
        .map(|href| format!("<a href=\"{href}\">{href}</a>"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "<html><head><title>{title}</title></head><body><p>{text}</p>\n{anchors}\n<script>track()</script></body></html>"
    )
}

/// Reply of the link model selecting `links` as (label, url) pairs.
pub(crate) fn links_reply(links: &[(&str, &str)]) -> String {
    let entries = links
        .iter()
        .map(|(kind, url)| serde_json::json!({"type": kind, "url": url}))
        .collect::<Vec<_>>();
    serde_json::json!({ "links": entries }).to_string()
}
