//! Turning track descriptors into tagged files on disk

pub mod backend;
pub mod error;
pub mod extractor;
pub mod orchestrator;
pub mod soundcloud;
pub mod tags;

pub use backend::{Backend, Backends};
pub use error::BackendError;
pub use orchestrator::{Orchestrator, Outcome, RunReport, TrackReport};
