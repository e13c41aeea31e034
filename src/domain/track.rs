use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Media services we know how to download from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ServiceName {
    SoundCloud,
    YouTube,
}

impl ServiceName {
    /// Matches the `service_name` string written by the chat export.
    pub fn from_export(name: &str) -> Option<Self> {
        match name {
            "SoundCloud" => Some(Self::SoundCloud),
            "YouTube" => Some(Self::YouTube),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SoundCloud => "SoundCloud",
            Self::YouTube => "YouTube",
        }
    }
}

impl Display for ServiceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One downloadable track found in the export.
///
/// Built once by the extractor from an event and its author,
/// then only read by the download stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackDescriptor {
    /// `YYYY-MM-DD`, taken from the day file name
    pub date: String,
    pub user_name: String,
    pub service_name: ServiceName,
    pub track_url: String,
    pub track_name: String,
    pub artist_name: String,
    pub artist_url: String,
}

impl TrackDescriptor {
    /// `(year, month)` parts of the date, missing parts are empty
    pub fn year_month(&self) -> (&str, &str) {
        let mut parts = self.date.split('-');
        (parts.next().unwrap_or(""), parts.next().unwrap_or(""))
    }
}

/// Tags embedded into a downloaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackTags {
    pub title: String,
    pub artist: String,
    pub album: String,
}

impl TrackTags {
    pub fn for_track(channel: &str, track: &TrackDescriptor) -> Self {
        Self {
            title: track.track_name.clone(),
            artist: track.artist_name.clone(),
            album: channel.to_string(),
        }
    }
}
