use std::{collections::HashMap, path::Path};

use crate::{domain::track::ServiceName, download::error::BackendError};

/// Something that can turn a track url into an audio file at `destination`.
///
/// Implementations must leave nothing at `destination` when they fail.
pub trait Backend {
    /// Short name used in reports, e.g. `SoundCloud`
    fn name(&self) -> &str;

    fn fetch(&self, url: &str, destination: &Path) -> Result<(), BackendError>;
}

/// Backend to use for each service
#[derive(Default)]
pub struct Backends {
    by_service: HashMap<ServiceName, Box<dyn Backend>>,
}

impl Backends {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, service: ServiceName, backend: impl Backend + 'static) -> Self {
        self.by_service.insert(service, Box::new(backend));
        self
    }

    pub fn get(&self, service: ServiceName) -> Option<&dyn Backend> {
        self.by_service.get(&service).map(|b| b.as_ref())
    }
}
