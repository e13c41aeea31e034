//! Read-only access to an unzipped chat export

pub mod error;
pub mod event;
pub mod reader;

pub use error::ExportError;
pub use event::{Attachment, Event};
pub use reader::ExportReader;
