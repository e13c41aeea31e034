//! Turns export events into track descriptors

use std::collections::{HashMap, HashSet};

use regex::Regex;
use thiserror::Error;

use crate::{
    domain::{
        track::{ServiceName, TrackDescriptor},
        user::{User, UserId},
    },
    export::{Attachment, Event, ExportError, ExportReader},
};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("event of {date} references unknown user {user}")]
    UnknownUser { user: UserId, date: String },

    #[error("event of {date} has media attachments but no user")]
    MissingUser { date: String },
}

/// Descriptors of every supported media attachment of the event, in attachment order.
pub fn extract(
    users: &HashMap<UserId, User>,
    event: &Event,
) -> Result<Vec<TrackDescriptor>, ExtractError> {
    let supported = event
        .attachments
        .iter()
        .flatten()
        .filter_map(|a| supported_service(a).map(|service| (service, a)))
        .collect::<Vec<_>>();

    if supported.is_empty() {
        return Ok(Vec::new());
    }

    let user_id = event.user.as_ref().ok_or_else(|| ExtractError::MissingUser {
        date: event.date.clone(),
    })?;
    let user = users.get(user_id).ok_or_else(|| ExtractError::UnknownUser {
        user: user_id.clone(),
        date: event.date.clone(),
    })?;

    Ok(supported
        .into_iter()
        .map(|(service, attachment)| to_descriptor(&event.date, user, service, attachment))
        .collect())
}

/// Reads a whole channel and returns its tracks sorted by date, each url once.
pub fn extract_tracks(
    reader: &ExportReader,
    channel: &str,
) -> Result<Vec<TrackDescriptor>, ExtractError> {
    let users = reader.load_users()?;
    log::debug!("loaded {} users", users.len());

    let mut tracks = Vec::new();
    for day in reader.list_days(channel)? {
        for event in reader.load_day(channel, &day)? {
            if !event.has_attachments() {
                continue;
            }
            tracks.extend(extract(&users, &event)?);
        }
    }

    sort_by_date(&mut tracks);
    Ok(dedup(tracks))
}

/// Stable ascending sort on the date string
pub fn sort_by_date(tracks: &mut [TrackDescriptor]) {
    tracks.sort_by(|a, b| a.date.cmp(&b.date));
}

/// Keeps the first occurrence of each `(service, url)` pair
fn dedup(tracks: Vec<TrackDescriptor>) -> Vec<TrackDescriptor> {
    let mut seen = HashSet::new();
    tracks
        .into_iter()
        .filter(|t| {
            let fresh = seen.insert((t.service_name, t.track_url.clone()));
            if !fresh {
                log::debug!("dropping repeated link {} from {}", t.track_url, t.date);
            }
            fresh
        })
        .collect()
}

fn supported_service(attachment: &Attachment) -> Option<ServiceName> {
    let service = ServiceName::from_export(attachment.service_name.as_deref()?)?;
    let has_title = attachment.title.as_deref().is_some_and(|t| !t.is_empty());
    let has_url = attachment.from_url.as_deref().is_some_and(|u| !u.is_empty());
    (has_title && has_url).then_some(service)
}

fn to_descriptor(
    date: &str,
    user: &User,
    service: ServiceName,
    attachment: &Attachment,
) -> TrackDescriptor {
    let field = |value: &Option<String>| decode_entities(value.as_deref().unwrap_or(""));

    let artist_name = field(&attachment.author_name);
    let track_name = strip_artist(&field(&attachment.title), &artist_name);

    TrackDescriptor {
        date: date.to_string(),
        user_name: user.display_name.clone(),
        service_name: service,
        track_url: field(&attachment.from_url),
        track_name,
        artist_name,
        artist_url: field(&attachment.author_link),
    }
}

/// The export escapes `<`, `>` and `&`; `&amp;` goes last so `&amp;lt;` stays `&lt;`
fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Best-effort removal of the artist from a title like "Song by Artist" or "Artist & Song".
///
/// Only runs when the artist literally occurs in the title. Both patterns are always applied,
/// which can leave odd leftovers on titles that mention the artist in other forms.
fn strip_artist(title: &str, artist: &str) -> String {
    if artist.is_empty() || !title.contains(artist) {
        return title.to_string();
    }

    let artist = regex::escape(artist);
    let patterns = [
        format!(r"\s*by\s*{artist}\s*"),
        format!(r"\s*&*{artist}&*\s*"),
    ];

    patterns.iter().fold(title.to_string(), |title, pattern| {
        match Regex::new(pattern) {
            Ok(re) => re.replace_all(&title, "").into_owned(),
            Err(e) => {
                log::warn!("cannot build artist pattern {pattern}: {e}");
                title
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn users() -> HashMap<UserId, User> {
        let al = User {
            id: UserId::from("1"),
            display_name: "Al".into(),
        };
        HashMap::from([(al.id.clone(), al)])
    }

    fn attachment(service: &str, title: &str, author: &str, url: &str) -> Attachment {
        Attachment {
            service_name: Some(service.into()),
            title: Some(title.into()),
            from_url: Some(url.into()),
            author_name: Some(author.into()),
            author_link: None,
        }
    }

    fn event(date: &str, user: &str, attachments: Vec<Attachment>) -> Event {
        Event {
            user: Some(UserId::from(user)),
            attachments: Some(attachments),
            date: date.into(),
        }
    }

    #[test]
    fn extract_strips_by_artist_and_resolves_user() -> anyhow::Result<()> {
        let event = event(
            "2020-01-15",
            "1",
            vec![attachment("SoundCloud", "Song by X", "X", "http://sc/u/song")],
        );

        let tracks = extract(&users(), &event)?;

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].track_name, "Song");
        assert_eq!(tracks[0].user_name, "Al");
        assert_eq!(tracks[0].service_name, ServiceName::SoundCloud);
        assert_eq!(tracks[0].track_url, "http://sc/u/song");
        assert_eq!(tracks[0].date, "2020-01-15");
        Ok(())
    }

    #[test]
    fn extract_skips_unsupported_and_untitled() -> anyhow::Result<()> {
        let mut untitled = attachment("YouTube", "", "", "https://youtu.be/a");
        untitled.title = None;
        let no_url = Attachment {
            from_url: None,
            ..attachment("YouTube", "T", "", "")
        };
        let event = event(
            "2020-01-15",
            "1",
            vec![attachment("Vimeo", "X", "", "https://vimeo.com/1"), untitled, no_url],
        );

        assert!(extract(&users(), &event)?.is_empty());
        Ok(())
    }

    #[test]
    fn extract_keeps_attachment_order() -> anyhow::Result<()> {
        let event = event(
            "2020-01-15",
            "1",
            vec![
                attachment("YouTube", "B", "", "https://youtu.be/b"),
                attachment("SoundCloud", "A", "", "https://soundcloud.com/x/a"),
            ],
        );

        let names: Vec<_> = extract(&users(), &event)?
            .into_iter()
            .map(|t| t.track_name)
            .collect();

        assert_eq!(names, vec!["B", "A"]);
        Ok(())
    }

    #[test]
    fn extract_decodes_entities() -> anyhow::Result<()> {
        let mut a = attachment(
            "YouTube",
            "Rock &amp; Roll",
            "Tom &amp; Jerry",
            "https://youtube.com/watch?v=1&amp;t=2",
        );
        a.author_link = Some("https://youtube.com/c/tom&amp;jerry".into());

        let tracks = extract(&users(), &event("2020-01-15", "1", vec![a]))?;

        assert_eq!(tracks[0].track_name, "Rock & Roll");
        assert_eq!(tracks[0].artist_name, "Tom & Jerry");
        assert_eq!(tracks[0].track_url, "https://youtube.com/watch?v=1&t=2");
        assert_eq!(tracks[0].artist_url, "https://youtube.com/c/tom&jerry");
        Ok(())
    }

    #[test]
    fn extract_unknown_user_is_an_error() {
        let event = event(
            "2020-01-15",
            "42",
            vec![attachment("YouTube", "T", "", "https://youtu.be/t")],
        );

        let err = extract(&users(), &event).unwrap_err();

        assert!(matches!(err, ExtractError::UnknownUser { .. }));
    }

    #[test]
    fn extract_unknown_user_without_media_is_fine() -> anyhow::Result<()> {
        let event = event(
            "2020-01-15",
            "42",
            vec![attachment("Vimeo", "T", "", "https://vimeo.com/t")],
        );

        assert!(extract(&users(), &event)?.is_empty());
        Ok(())
    }

    #[test]
    fn strip_artist_applies_documented_patterns() {
        assert_eq!(strip_artist("Song by X", "X"), "Song");
        assert_eq!(strip_artist("X & Song", "X"), "& Song");
        assert_eq!(strip_artist("Song &X&", "X"), "Song");
        assert_eq!(strip_artist("Song (feat. Y)", "X"), "Song (feat. Y)");
        assert_eq!(strip_artist("Song by x", "X"), "Song by x");
        assert_eq!(strip_artist("Song", ""), "Song");
    }

    #[test]
    fn strip_artist_escapes_regex_characters() {
        assert_eq!(strip_artist("Tune by A.B (C)", "A.B (C)"), "Tune");
        assert_eq!(strip_artist("Tune by AxB", "A.B"), "Tune by AxB");
    }

    #[test]
    fn sort_puts_earlier_dates_first() {
        let track = |date: &str| TrackDescriptor {
            date: date.into(),
            user_name: "Al".into(),
            service_name: ServiceName::YouTube,
            track_url: format!("https://youtu.be/{date}"),
            track_name: "T".into(),
            artist_name: String::new(),
            artist_url: String::new(),
        };
        let mut tracks = vec![track("2020-02-01"), track("2020-01-15")];

        sort_by_date(&mut tracks);

        assert_eq!(tracks[0].date, "2020-01-15");
        assert_eq!(tracks[1].date, "2020-02-01");
    }

    fn write_channel(root: &std::path::Path) -> anyhow::Result<()> {
        fs::write(root.join("users.json"), r#"[{"id": 1, "name": "Al"}]"#)?;
        let general = root.join("general");
        fs::create_dir_all(&general)?;
        fs::write(
            general.join("2020-02-01.json"),
            r#"[
                {"user": 1, "text": "no media"},
                {"user": 1, "attachments": [
                    {"service_name": "YouTube", "title": "Later", "from_url": "https://youtu.be/later"},
                    {"service_name": "SoundCloud", "title": "Again", "from_url": "https://soundcloud.com/a/again"}
                ]}
            ]"#,
        )?;
        fs::write(
            general.join("2020-01-15.json"),
            r#"[{"user": 1, "attachments": [
                {"service_name": "SoundCloud", "title": "First by A", "author_name": "A",
                 "from_url": "https://soundcloud.com/a/again"}
            ]}]"#,
        )?;
        Ok(())
    }

    #[test]
    fn extract_tracks_sorts_and_dedups() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        write_channel(tmp.path())?;
        let reader = ExportReader::new(tmp.path());

        let tracks = extract_tracks(&reader, "general")?;

        let summary: Vec<_> = tracks
            .iter()
            .map(|t| (t.date.as_str(), t.track_name.as_str()))
            .collect();
        assert_eq!(summary, vec![("2020-01-15", "First"), ("2020-02-01", "Later")]);
        Ok(())
    }

    #[test]
    fn extract_tracks_is_deterministic() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        write_channel(tmp.path())?;
        let reader = ExportReader::new(tmp.path());

        let first = serde_json::to_string(&extract_tracks(&reader, "general")?)?;
        let second = serde_json::to_string(&extract_tracks(&reader, "general")?)?;

        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn extract_tracks_fails_on_unknown_user() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        write_channel(tmp.path())?;
        fs::write(
            tmp.path().join("general").join("2020-03-01.json"),
            r#"[{"user": 9, "attachments": [
                {"service_name": "YouTube", "title": "T", "from_url": "https://youtu.be/t"}
            ]}]"#,
        )?;

        let err = extract_tracks(&ExportReader::new(tmp.path()), "general").unwrap_err();

        assert!(matches!(err, ExtractError::UnknownUser { ref date, .. } if date == "2020-03-01"));
        Ok(())
    }
}
