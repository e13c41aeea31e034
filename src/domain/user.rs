use std::fmt::Display;

use serde::Deserialize;

/// Author id as written by the export.
///
/// Real exports use strings (`"U024BE7LH"`), hand-written fixtures often use numbers.
/// Both are kept as their string form so lookups don't depend on the JSON type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "RawUserId")]
pub struct UserId(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawUserId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawUserId> for UserId {
    fn from(raw: RawUserId) -> Self {
        match raw {
            RawUserId::Text(s) => UserId(s),
            RawUserId::Number(n) => UserId(n.to_string()),
        }
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(rename = "name", default)]
    pub display_name: String,
}
