//! File naming for downloaded tracks
//!
//! All paths are relative to the output root and always look like
//! `<channel>/<year>/<month>/<basename>.mp3`.

use std::path::PathBuf;

use clap::ValueEnum;
use serde::Deserialize;

use crate::domain::track::TrackDescriptor;

pub(crate) const AUDIO_EXTENSION: &str = "mp3";
const NAME_PART_LEN: usize = 30;
const SEPARATOR: &str = "__";

/// How the basename of a track file is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NamingPolicy {
    /// `<user>__<artist>__<title>`, readable but may collide
    #[default]
    #[serde(alias = "metadata-derived")]
    #[value(alias = "metadata-derived")]
    Metadata,
    /// last two url segments, unique but opaque
    #[serde(alias = "url-derived")]
    #[value(alias = "url-derived")]
    Url,
}

/// Lower-case `[a-z0-9_]` token for use in file names. `None` gives an empty token.
pub fn robotize(text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };

    let underscored = text
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>();

    collapse_underscores(&underscored).to_lowercase()
}

fn collapse_underscores(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out
}

/// robotized text cut to `len` chars, without underscores at either end
fn shrink(text: &str, len: usize) -> String {
    let token = robotize(Some(text));
    let cut = token.chars().take(len).collect::<String>();
    cut.trim_matches('_').to_string()
}

/// Makes `part` usable as exactly one path component
fn safe_component(part: &str) -> String {
    let cleaned = part.replace(['/', '\\'], "_").replace('\0', "");
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

impl NamingPolicy {
    pub fn basename(&self, track: &TrackDescriptor) -> String {
        match self {
            NamingPolicy::Url => {
                let segments = track.track_url.rsplit('/').take(2).collect::<Vec<_>>();
                segments
                    .into_iter()
                    .rev()
                    .collect::<Vec<_>>()
                    .join(SEPARATOR)
            }
            NamingPolicy::Metadata => [
                track.user_name.clone(),
                shrink(&track.artist_name, NAME_PART_LEN),
                shrink(&track.track_name, NAME_PART_LEN),
            ]
            .join(SEPARATOR),
        }
    }

    /// Relative path of the track file. Pure: depends only on the arguments.
    pub fn build_path(&self, channel: &str, track: &TrackDescriptor) -> PathBuf {
        let (year, month) = track.year_month();
        let mut path = PathBuf::from(safe_component(channel));
        path.push(safe_component(year));
        if !month.is_empty() {
            path.push(safe_component(month));
        }
        path.push(format!(
            "{}.{AUDIO_EXTENSION}",
            safe_component(&self.basename(track))
        ));
        path
    }
}
