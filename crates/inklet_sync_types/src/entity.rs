//! Content entity shapes shared with the remote services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A content entity as drafted locally, carried by create operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDraft {
    /// Entity identifier, assigned locally.
    pub id: String,
    /// Title of the piece.
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub body: String,
    /// When the draft was last edited locally.
    pub updated_at: DateTime<Utc>,
}

/// A content entity as currently known remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntity {
    /// Entity identifier.
    pub id: String,
    /// Title of the piece.
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub body: String,
    /// The remote last-modified time. This is the value conflict detection
    /// compares a pending update's basis against.
    pub updated_at: DateTime<Utc>,
}

/// A partial edit to a content entity, carried by update operations.
///
/// `updated_at` is the **basis timestamp**: the last-modified time of the
/// local copy the edit was made against. Conflict detection treats a missing
/// basis as the Unix epoch, so the remote copy always wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentPatch {
    /// New title, if the edit changes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New body, if the edit changes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Basis timestamp of the local copy this edit was made against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ContentPatch {
    /// Sets the title field.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the body field.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the basis timestamp.
    #[must_use]
    pub fn with_basis(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Returns the basis timestamp, or the Unix epoch when absent.
    #[must_use]
    pub fn basis(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}
