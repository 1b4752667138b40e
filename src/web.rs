//! Browser front end: a form that takes a company URL, a result page with the
//! rendered brochure, and a download of the last brochure of the session.

use std::num::NonZeroUsize;
use std::sync::Arc;

use axum::{
    Form, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use log::{error, info};
use lru::LruCache;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::constants::{DOWNLOAD_FILE_NAME, MAX_SESSIONS, SESSION_COOKIE};
use crate::error::Error;
use crate::render::{escape_html, markdown_to_html};
use crate::synthesize::{Brochure, Pipeline, company_name_or_host};

/// One brochure slot per session; a new brochure replaces the previous one.
/// Holds at most `capacity` sessions, evicting the least recently used.
#[derive(Clone)]
pub struct SessionStore {
    slots: Arc<Mutex<LruCache<Uuid, String>>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_capacity(MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            slots: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    pub async fn store(&self, session: Uuid, markdown: String) {
        self.slots.lock().await.put(session, markdown);
    }

    pub async fn load(&self, session: Uuid) -> Option<String> {
        self.slots.lock().await.get(&session).cloned()
    }

    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.lock().await.is_empty()
    }
}

/// Shared state for the web front end
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub sessions: SessionStore,
}

/// Fields of the brochure form. Every field may be missing.
#[derive(Debug, Default, Deserialize)]
pub struct BrochureForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub language: String,
}

/// Builds the router serving `/` and `/download`.
pub fn router(pipeline: Arc<Pipeline>) -> Router {
    let state = AppState {
        pipeline,
        sessions: SessionStore::default(),
    };

    Router::new()
        .route("/", get(index_handler).post(submit_handler))
        .route("/download", get(download_handler))
        .with_state(state)
}

/// Serves the web front end on `bind` until the process is stopped.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(pipeline: Pipeline, bind: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(Arc::new(pipeline))).await
}

async fn index_handler() -> Html<String> {
    Html(form_page(&BrochureForm::default(), None))
}

async fn submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<BrochureForm>,
) -> Response {
    let url = form.url.trim();
    if url.is_empty() {
        return Html(form_page(&form, Some("Please enter a URL"))).into_response();
    }

    let name = company_name_or_host(&form.name, url);
    let brochure = match state
        .pipeline
        .create_brochure(&name, url, Some(form.language.as_str()))
        .await
    {
        Ok(brochure) => brochure,
        Err(Error::EmptyBrochure) => {
            return Html(form_page(&form, Some("Could not generate summary"))).into_response();
        }
        Err(err) => {
            error!("Brochure for {url} failed: {err}");
            let message = format!("Error: {err}");
            return Html(form_page(&form, Some(message.as_str()))).into_response();
        }
    };

    let session = session_id(&headers).unwrap_or_else(Uuid::new_v4);
    let page = result_page(&name, url, &brochure);
    state.sessions.store(session, brochure.markdown).await;

    (
        [(
            header::SET_COOKIE,
            format!("{SESSION_COOKIE}={session}; Path=/; HttpOnly; SameSite=Lax"),
        )],
        Html(page),
    )
        .into_response()
}

async fn download_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let markdown = match session_id(&headers) {
        Some(session) => state.sessions.load(session).await,
        None => None,
    };

    match markdown {
        Some(markdown) => (
            [
                (header::CONTENT_TYPE, "text/markdown".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\""),
                ),
            ],
            markdown,
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html(form_page(
                &BrochureForm::default(),
                Some("No brochure to download"),
            )),
        )
            .into_response(),
    }
}

/// Reads the session id from the request cookies.
fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }}
.error {{ color: #b00020; border: 1px solid #b00020; padding: .5rem 1rem; }}
.warning {{ color: #8a6d00; }}
label {{ display: block; margin-top: 1rem; }}
input {{ width: 100%; padding: .4rem; }}
</style>
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape_html(title),
    )
}

fn form_page(form: &BrochureForm, error: Option<&str>) -> String {
    let flash = error
        .map(|message| format!(r#"<p class="error">{}</p>"#, escape_html(message)))
        .unwrap_or_default();

    layout(
        "Company Brochure",
        &format!(
            r#"<h1>Company Brochure</h1>
{flash}
<form method="post" action="/">
<label>Company name <input name="name" value="{name}"></label>
<label>Website URL <input name="url" value="{url}" placeholder="https://example.com"></label>
<label>Language <input name="language" value="{language}" placeholder="English"></label>
<p><button type="submit">Generate brochure</button></p>
</form>"#,
            name = escape_html(&form.name),
            url = escape_html(&form.url),
            language = escape_html(&form.language),
        ),
    )
}

fn result_page(name: &str, url: &str, brochure: &Brochure) -> String {
    let omitted = if brochure.details.omitted.is_empty() {
        String::new()
    } else {
        let items = brochure
            .details
            .omitted
            .iter()
            .map(|page| {
                format!(
                    "<li>{} ({}): {}</li>",
                    escape_html(&page.label),
                    escape_html(&page.url),
                    escape_html(&page.reason)
                )
            })
            .collect::<String>();
        format!(r#"<div class="warning"><p>Some pages could not be fetched:</p><ul>{items}</ul></div>"#)
    };

    layout(
        &format!("{name} brochure"),
        &format!(
            r#"<h1>{name}</h1>
<p><a href="{url}">{url}</a></p>
{omitted}
<article>
{content}
</article>
<p><a href="/download">Download {file}</a> · <a href="/">New brochure</a></p>
<details><summary>Markdown</summary><pre>{markdown}</pre></details>"#,
            name = escape_html(name),
            url = escape_html(url),
            content = markdown_to_html(&brochure.markdown),
            file = DOWNLOAD_FILE_NAME,
            markdown = escape_html(&brochure.markdown),
        ),
    )
}
