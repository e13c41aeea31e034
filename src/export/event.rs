use serde::Deserialize;

use crate::domain::user::UserId;

/// A single message of a channel day file.
///
/// Only the fields the extractor needs are kept, everything else in the record is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Event {
    #[serde(default, alias = "user_id")]
    pub user: Option<UserId>,

    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,

    /// Day the event was posted, filled from the day file name
    #[serde(skip)]
    pub date: String,
}

impl Event {
    pub fn has_attachments(&self) -> bool {
        self.attachments.as_ref().is_some_and(|a| !a.is_empty())
    }
}

/// Rich link preview attached to a message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Attachment {
    pub service_name: Option<String>,
    pub title: Option<String>,
    pub from_url: Option<String>,
    pub author_name: Option<String>,
    pub author_link: Option<String>,
}
