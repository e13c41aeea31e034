//! Module to read channel day files and the user directory of an export

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;
use walkdir::WalkDir;

use crate::{
    domain::user::{User, UserId},
    export::{error::ExportError, event::Event},
};

const USERS_FILE: &str = "users.json";
const DAY_EXTENSION: &str = "json";

/// Reads an unzipped export laid out as `<root>/users.json` and `<root>/<channel>/<day>.json`
#[derive(Debug, Clone)]
pub struct ExportReader {
    root: PathBuf,
}

impl ExportReader {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn channel_dir(&self, channel: &str) -> Result<PathBuf, ExportError> {
        let dir = self.root.join(channel);
        if !dir.is_dir() {
            return Err(ExportError::MissingExport(dir));
        }
        Ok(dir)
    }

    /// Day identifiers (file stems) of a channel.
    ///
    /// Callers must not rely on the order; it is sorted only to keep logs readable.
    pub fn list_days(&self, channel: &str) -> Result<Vec<String>, ExportError> {
        let dir = self.channel_dir(channel)?;

        let mut days = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|source| ExportError::Scan {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || !is_day_file(path) {
                log::debug!("skipping {}: not a day file", path.display());
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                days.push(stem.to_string());
            }
        }

        days.sort();
        Ok(days)
    }

    /// Events of one day, each tagged with the day as its date
    pub fn load_day(&self, channel: &str, day: &str) -> Result<Vec<Event>, ExportError> {
        let path = self
            .channel_dir(channel)?
            .join(format!("{day}.{DAY_EXTENSION}"));

        let mut events: Vec<Event> = read_json_file(&path)?;
        for event in &mut events {
            event.date = day.to_string();
        }
        Ok(events)
    }

    pub fn load_users(&self) -> Result<HashMap<UserId, User>, ExportError> {
        let path = self.root.join(USERS_FILE);
        let users: Vec<User> = read_json_file(&path)?;
        Ok(users.into_iter().map(|u| (u.id.clone(), u)).collect())
    }
}

fn is_day_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(DAY_EXTENSION))
        .unwrap_or(false)
}

fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, ExportError> {
    if !path.is_file() {
        return Err(ExportError::MissingExport(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|source| ExportError::Json {
        path: path.to_path_buf(),
        source,
    })
}
