//! Collaborators that turn identifiers and URLs into records the analyzer can use.

pub mod catalog;
mod http;
pub mod page;

pub use catalog::{CatalogClient, HttpCatalogClient};
pub use page::{HttpPageExtractor, PageFetcher, PlaceholderPageFetcher};
