//! crates/book_corner_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! Field names serialize in camelCase, which is both the storage layout and the
//! vault export format. Timestamps are milliseconds since the Unix epoch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Dicebear palette used for generated covers.
const COVER_BACKGROUND: &str = "a7c957,6a994e,f28482,f4e285,fdf0d5";

/// The closed set of genres a book can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Genre {
    Novel,
    SelfHelp,
    Philosophy,
    WebNovel,
    Manga,
    Manhwa,
    Textbook,
    #[default]
    Other,
}

impl Genre {
    pub const ALL: [Genre; 8] = [
        Genre::Novel,
        Genre::SelfHelp,
        Genre::Philosophy,
        Genre::WebNovel,
        Genre::Manga,
        Genre::Manhwa,
        Genre::Textbook,
        Genre::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Novel => "Novel",
            Genre::SelfHelp => "Self-Help",
            Genre::Philosophy => "Philosophy",
            Genre::WebNovel => "Web Novel",
            Genre::Manga => "Manga",
            Genre::Manhwa => "Manhwa",
            Genre::Textbook => "Textbook",
            Genre::Other => "Other",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Unknown labels read back as `Other` so older or hand-edited data still loads.
impl From<String> for Genre {
    fn from(value: String) -> Self {
        Genre::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(value.trim()))
            .unwrap_or(Genre::Other)
    }
}

impl From<Genre> for String {
    fn from(value: Genre) -> Self {
        value.as_str().to_string()
    }
}

/// A free-text annotation attached to a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub content: String,
    pub date_added: i64,
}

/// A word saved to a book's private glossary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vocabulary {
    pub id: String,
    pub word: String,
    pub meaning: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub date_added: i64,
}

/// A point-in-time record of the chapter a reader had reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub chapter: u32,
}

/// A tracked reading item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub genre: Genre,
    #[serde(default)]
    pub subgenres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default = "first_chapter")]
    pub current_chapter: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chapters: Option<u32>,
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub dictionary: Vec<Vocabulary>,
    #[serde(default)]
    pub is_college_material: bool,
    #[serde(default)]
    pub cover_url: String,
    pub last_updated: i64,
    pub date_started: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_completed: Option<i64>,
    #[serde(default)]
    pub progress_history: Vec<ProgressSnapshot>,
}

fn first_chapter() -> u32 {
    1
}

/// Fields accepted when cataloging a new book. Only `title` and `author` are required.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: Option<Genre>,
    pub subgenres: Vec<String>,
    pub source: Option<String>,
    pub current_chapter: Option<u32>,
    pub total_chapters: Option<u32>,
    pub is_college_material: bool,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Default::default()
        }
    }
}

/// A partial update. `None` leaves a field untouched; for the optional fields,
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<Genre>,
    pub subgenres: Option<Vec<String>>,
    #[serde(deserialize_with = "double_option")]
    pub source: Option<Option<String>>,
    pub current_chapter: Option<u32>,
    #[serde(deserialize_with = "double_option")]
    pub total_chapters: Option<Option<u32>>,
    pub rating: Option<u8>,
    pub is_completed: Option<bool>,
    pub is_college_material: Option<bool>,
}

/// Tells an explicit `null` (`Some(None)`) apart from an absent field (`None`).
/// Pair with `#[serde(default)]`.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// The normalized result of a word lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub meaning: String,
    pub language: String,
}

/// What a definition collaborator answered, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawDefinition {
    #[serde(default)]
    pub meaning: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub synonyms: Option<Vec<String>>,
}

/// Avatar styles a profile may pick from.
pub const AVATAR_STYLES: [&str; 6] = [
    "lorelei",
    "big-smile",
    "pixel-art",
    "fun-emoji",
    "adventurer",
    "notionists",
];

/// The single reader's display identity and goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub bio: String,
    pub reading_goal: u32,
    pub favorite_genre: String,
    pub avatar_seed: String,
    pub avatar_choice: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_flip: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_rotate: Option<i32>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "Garden Reader".to_string(),
            bio: "Nurturing ideas like spring blossoms.".to_string(),
            reading_goal: 50,
            favorite_genre: "Philosophy".to_string(),
            avatar_seed: "spring-breeze".to_string(),
            avatar_choice: AVATAR_STYLES[0].to_string(),
            avatar_flip: None,
            avatar_rotate: None,
        }
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Formats an epoch-millisecond timestamp as a `YYYY-MM-DD` date stamp.
pub fn date_stamp(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .format("%Y-%m-%d")
        .to_string()
}

/// Placeholder cover derived from the title. Display only, never an identity key.
pub fn cover_url_for(title: &str) -> String {
    format!(
        "https://api.dicebear.com/7.x/initials/svg?seed={}&backgroundColor={}",
        urlencoding::encode(title),
        COVER_BACKGROUND
    )
}
