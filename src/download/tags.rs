use std::path::Path;

use id3::{Tag, TagLike, Version};
use thiserror::Error;

use crate::domain::track::TrackTags;

#[derive(Debug, Error)]
pub enum TagError {
    #[error("id3 error: {0}")]
    Id3(#[from] id3::Error),
}

/// Writes title/artist/album into a downloaded file
pub trait MetadataSink {
    fn embed(&self, path: &Path, tags: &TrackTags) -> Result<(), TagError>;
}

/// Replaces the file's ID3 tag with a fresh ID3v2.4 one
#[derive(Debug, Default, Clone, Copy)]
pub struct Id3Sink;

impl MetadataSink for Id3Sink {
    fn embed(&self, path: &Path, tags: &TrackTags) -> Result<(), TagError> {
        let mut tag = Tag::new();
        tag.set_title(tags.title.as_str());
        if !tags.artist.is_empty() {
            tag.set_artist(tags.artist.as_str());
        }
        tag.set_album(tags.album.as_str());
        tag.write_to_path(path, Version::Id3v24)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn embed_writes_readable_tag() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("song.mp3");
        std::fs::write(&path, b"not really audio")?;

        let tags = TrackTags {
            title: "Song".into(),
            artist: "X".into(),
            album: "general".into(),
        };
        Id3Sink.embed(&path, &tags)?;

        let tag = Tag::read_from_path(&path)?;
        assert_eq!(tag.title(), Some("Song"));
        assert_eq!(tag.artist(), Some("X"));
        assert_eq!(tag.album(), Some("general"));

        Ok(())
    }

    #[test]
    fn embed_replaces_previous_tag() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("song.mp3");
        std::fs::write(&path, b"audio")?;

        let first = TrackTags {
            title: "Old".into(),
            artist: "Someone".into(),
            album: "random".into(),
        };
        Id3Sink.embed(&path, &first)?;

        let second = TrackTags {
            title: "New".into(),
            artist: String::new(),
            album: "general".into(),
        };
        Id3Sink.embed(&path, &second)?;

        let tag = Tag::read_from_path(&path)?;
        assert_eq!(tag.title(), Some("New"));
        assert_eq!(tag.artist(), None);
        assert_eq!(tag.album(), Some("general"));

        Ok(())
    }
}
