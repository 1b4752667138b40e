//! The brochure library scrapes a company website, lets an LLM pick the pages
//! worth reading (About, Careers, ...) and asks it to write a short markdown
//! brochure from them.

pub mod aggregate;
pub mod config;
pub mod constants;
pub mod error;
pub mod fetch;
pub mod render;
pub mod select;
pub mod synthesize;
pub mod web;

pub use aggregate::{AggregatedDocument, FailurePolicy, aggregate};
pub use config::ModelSettings;
pub use error::{Error, Result};
pub use fetch::{FetchedPage, PageFetcher, parse_page};
pub use select::{LinkSelection, select_links};
pub use synthesize::{Brochure, Pipeline};
