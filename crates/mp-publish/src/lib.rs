//! mp-publish: one-shot Facebook Page and Instagram publisher
//!
//! Exchanges the system token for a Page token, then publishes an optional
//! text post, an optional photo post and an optional Instagram cross-post.

pub mod error;
pub mod workflow;

pub use error::{PublishStep, Result, WorkflowError};
pub use workflow::{Outcome, PublishReport, PublishWorkflow};
