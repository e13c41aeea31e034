use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use crate::{
    domain::track::{ServiceName, TrackDescriptor, TrackTags},
    download::{backend::Backends, tags::MetadataSink},
    naming::NamingPolicy,
};

/// What happened to one track
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Downloaded(PathBuf),
    AlreadyExists(PathBuf),
    /// no backend registered for the service
    Unsupported(ServiceName),
    Failed(String),
    /// the file is on disk but could not be tagged
    TagFailed { path: PathBuf, reason: String },
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Downloaded(path) => write!(f, "{}", path.display()),
            Outcome::AlreadyExists(path) => write!(f, "already exists: {}", path.display()),
            Outcome::Unsupported(service) => write!(f, "no backend for {service}, skipped"),
            Outcome::Failed(reason) => write!(f, "{reason}"),
            Outcome::TagFailed { path, reason } => {
                write!(f, "{} (tagging failed: {reason})", path.display())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackReport {
    pub track_url: String,
    pub outcome: Outcome,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub tracks: Vec<TrackReport>,
}

impl RunReport {
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.tracks.iter().filter(|t| pred(&t.outcome)).count()
    }

    pub fn downloaded(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Downloaded(_)))
    }

    pub fn already_present(&self) -> usize {
        self.count(|o| matches!(o, Outcome::AlreadyExists(_)))
    }

    pub fn unsupported(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Unsupported(_)))
    }

    /// Tracks with no file on disk after the run
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    /// Tracks that were saved but carry no tags
    pub fn tag_failures(&self) -> usize {
        self.count(|o| matches!(o, Outcome::TagFailed { .. }))
    }
}

/// Downloads and tags tracks one after another.
///
/// Resuming is purely existence based: a track whose target file is already on disk is skipped,
/// whatever that file contains.
pub struct Orchestrator {
    output_root: PathBuf,
    naming: NamingPolicy,
    backends: Backends,
    sink: Box<dyn MetadataSink>,
}

impl Orchestrator {
    pub fn new(
        output_root: impl AsRef<Path>,
        naming: NamingPolicy,
        backends: Backends,
        sink: impl MetadataSink + 'static,
    ) -> Self {
        Self {
            output_root: output_root.as_ref().to_path_buf(),
            naming,
            backends,
            sink: Box::new(sink),
        }
    }

    pub fn target_path(&self, channel: &str, track: &TrackDescriptor) -> PathBuf {
        self.output_root.join(self.naming.build_path(channel, track))
    }

    /// Processes every track in the given order, calling `on_track` as soon as each one is done.
    ///
    /// A failing track never stops the batch.
    pub fn process(
        &self,
        channel: &str,
        tracks: &[TrackDescriptor],
        mut on_track: impl FnMut(&TrackReport),
    ) -> RunReport {
        let mut report = RunReport::default();

        for track in tracks {
            let outcome = self.process_track(channel, track);
            match &outcome {
                Outcome::Downloaded(_) | Outcome::AlreadyExists(_) => {
                    log::debug!("{} - {outcome}", track.track_url)
                }
                _ => log::warn!("{} - {outcome}", track.track_url),
            }

            let entry = TrackReport {
                track_url: track.track_url.clone(),
                outcome,
            };
            on_track(&entry);
            report.tracks.push(entry);
        }

        report
    }

    fn process_track(&self, channel: &str, track: &TrackDescriptor) -> Outcome {
        let path = self.target_path(channel, track);

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                return Outcome::Failed(format!("cannot create {}: {e}", parent.display()));
            }
        }

        if path.exists() {
            return Outcome::AlreadyExists(path);
        }

        let Some(backend) = self.backends.get(track.service_name) else {
            return Outcome::Unsupported(track.service_name);
        };

        log::info!("fetching {} via {}", track.track_url, backend.name());
        if let Err(e) = backend.fetch(&track.track_url, &path) {
            return Outcome::Failed(format!("{} download error: {e}", backend.name()));
        }

        match self.sink.embed(&path, &TrackTags::for_track(channel, track)) {
            Ok(()) => Outcome::Downloaded(path),
            Err(e) => Outcome::TagFailed {
                path,
                reason: e.to_string(),
            },
        }
    }
}
