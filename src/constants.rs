pub const MODEL_API_KEY_ENV_NAME: &str = "BROCHURE_MODEL_API_KEY";
pub const FALLBACK_API_KEY_ENV_NAME: &str = "OPENAI_API_KEY";
pub const MODEL_ENV_NAME: &str = "BROCHURE_MODEL";
pub const DEFAULT_MODEL: &str = "openai://gpt-4o-mini";
pub const EXPECTED_API_KEY_PREFIX: &str = "sk-proj-";

pub const USER_AGENT: &str = "Brochure Bot";
pub const NO_TITLE: &str = "No title found";

/// Hard cap on the aggregated page text handed to the model, in characters.
pub const MAX_DETAILS_CHARS: usize = 20_000;

pub const DEFAULT_OUTPUT_FILE: &str = "brochure.md";
pub const DOWNLOAD_FILE_NAME: &str = "summary.md";
pub const SESSION_COOKIE: &str = "brochure_session";
/// Sessions whose last brochure is kept for download.
pub const MAX_SESSIONS: usize = 1024;

pub(crate) const THINK_STRIPPER: &str = r"<think>[\s\S]*</think>\s*";
pub(crate) const FENCE_STRIPPER: &str = r"^\s*```[A-Za-z]*\s*\n?([\s\S]*?)\n?\s*```\s*$";

pub(crate) const LINK_SYSTEM_PROMPT: &str = r#"You are provided with a list of links found on a webpage.
You are able to decide which of the links would be most relevant to include in a brochure about the company, such as links to an About page, or a Company page, or Careers/Jobs pages.
You should respond in JSON as in this example:

{
    "links": [
        {"type": "about page", "url": "https://full.url/goes/here/about"},
        {"type": "careers page", "url": "https://another.full.url/careers"}
    ]
}
"#;

pub(crate) const LINK_RESPONSE_SCHEMA: &str = r#"{
    "name": "relevant_links",
    "description": "Links relevant for a company brochure",
    "strict": true,
    "schema": {
        "type": "object",
        "properties": {
            "links": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "type": {"type": "string"},
                        "url": {"type": "string"}
                    },
                    "required": ["type", "url"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["links"],
        "additionalProperties": false
    }
}"#;

pub(crate) const BROCHURE_SYSTEM_PROMPT: &str = "You are an assistant that analyzes the contents of several relevant pages from a company website and creates a short brochure about the company for prospective customers, investors, and recruits. Respond in markdown. Include details of company culture, customers, and careers/jobs if available.";
