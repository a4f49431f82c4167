//! mp-graph: Graph API client for meta-publish
//!
//! One parameterized call primitive ([`GraphClient::call`]) plus thin typed
//! wrappers for the Page and Instagram endpoints the publisher needs.

pub mod client;
pub mod error;
pub mod instagram;
pub mod page;

pub use client::GraphClient;
pub use error::{GraphError, Result};
pub use reqwest::Method;
