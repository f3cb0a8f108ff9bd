//! Core data models used throughout the harvester.
//!
//! Two input shapes feed the store: [`RawChannel`] items from the search API
//! and [`SeedChannel`] entries from local snapshot files. Both converge on
//! [`ChannelRecord`], and only when the description carries contact details.

use serde::{Deserialize, Deserializer, Serialize};

use crate::contact;

/// A channel with extracted contacts, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRecord {
    pub name: String,
    pub description: String,
    /// Comma-joined email matches, `None` when there were none.
    pub email: Option<String>,
    /// Comma-joined phone matches, `None` when there were none.
    pub phone_number: Option<String>,
    /// Search keyword the channel was harvested under.
    pub keyword: String,
    pub subscriber_count: i64,
}

impl ChannelRecord {
    /// Build a record from a description, or `None` if it holds no contact details.
    pub fn from_description(
        name: String,
        description: String,
        keyword: &str,
        subscriber_count: i64,
    ) -> Option<Self> {
        let contacts = contact::extract(&description);
        if contacts.is_empty() {
            return None;
        }

        Some(Self {
            email: contacts.joined_emails(),
            phone_number: contacts.joined_phones(),
            name,
            description,
            keyword: keyword.to_string(),
            subscriber_count,
        })
    }
}

/// A channel record as persisted, with its generated id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredChannel {
    pub id: String,
    pub name: String,
    pub description: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub keyword: String,
    pub subscriber_count: i64,
    pub created_at: i64,
}

/// Pagination state for one keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CursorRecord {
    pub keyword: String,
    pub cursor: String,
    pub updated_at: i64,
}

/// One channel item from a search results page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChannel {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub subscriber_count: i64,
}

impl RawChannel {
    pub fn into_record(self, keyword: &str) -> Option<ChannelRecord> {
        ChannelRecord::from_description(self.name, self.description, keyword, self.subscriber_count)
    }
}

/// Wire shape of a search results page.
#[derive(Debug, Clone, Deserialize)]
pub struct PageBody {
    pub list: Vec<RawChannel>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cursor: String,
}

/// A fetched page: its items and the cursor for the next one (empty = last page).
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<RawChannel>,
    pub next_cursor: String,
}

impl From<PageBody> for Page {
    fn from(body: PageBody) -> Self {
        Self {
            items: body.list,
            next_cursor: body.cursor,
        }
    }
}

/// Top-level shape of a seed snapshot file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedFile {
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub record_number: i64,
    #[serde(default)]
    pub records: Vec<SeedChannel>,
}

/// A previously exported channel entry. Stored contact fields are ignored
/// and re-derived from the description.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedChannel {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, rename = "keyWord", alias = "keyword", deserialize_with = "null_as_empty")]
    pub keyword: String,
    #[serde(default)]
    pub subscriber_count: i64,
}

impl SeedChannel {
    pub fn into_record(self) -> Option<ChannelRecord> {
        ChannelRecord::from_description(
            self.name,
            self.description,
            &self.keyword,
            self.subscriber_count,
        )
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
