//! crates/book_corner_core/src/persistence.rs
//!
//! Reads and writes the book collection and the profile through a `KeyValueStore`.
//! Loading is forgiving: missing or damaged data falls back to an empty library
//! and the default profile instead of stopping the application.

use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{cover_url_for, Book, UserProfile};
use crate::ports::{KeyValueStore, PortError, PortResult};
use crate::profile;
use crate::repository::MAX_RATING;

pub const BOOKS_KEY: &str = "book_corner_data";
pub const PROFILE_KEY: &str = "book_corner_profile";

#[derive(Clone)]
pub struct Persistence {
    store: Arc<dyn KeyValueStore>,
}

impl Persistence {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self) -> (Vec<Book>, UserProfile) {
        let books = match self.read(BOOKS_KEY).await {
            Some(raw) => decode_books(&raw),
            None => Vec::new(),
        };
        let profile = match self.read(PROFILE_KEY).await {
            Some(raw) => decode_profile(&raw),
            None => UserProfile::default(),
        };
        info!(books = books.len(), "Library loaded from storage");
        (books, profile)
    }

    /// Full overwrite of both documents.
    pub async fn save(&self, books: &[Book], profile: &UserProfile) -> PortResult<()> {
        let books_json =
            serde_json::to_string(books).map_err(|e| PortError::Unexpected(e.to_string()))?;
        let profile_json =
            serde_json::to_string(profile).map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.store.set(BOOKS_KEY, &books_json).await?;
        self.store.set(PROFILE_KEY, &profile_json).await?;
        Ok(())
    }

    pub async fn clear(&self) -> PortResult<()> {
        self.store.remove(BOOKS_KEY).await?;
        self.store.remove(PROFILE_KEY).await?;
        Ok(())
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Could not read from storage, using defaults");
                None
            }
        }
    }
}

/// Parses the stored book array, keeping every entry that still fits the schema.
pub fn decode_books(raw: &str) -> Vec<Book> {
    let entries = match serde_json::from_str::<Vec<Value>>(raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "Stored books are not a JSON array, starting empty");
            return Vec::new();
        }
    };

    let total = entries.len();
    let mut books: Vec<Book> = Vec::with_capacity(total);
    for entry in entries {
        match serde_json::from_value::<Book>(entry) {
            // A duplicated id would break lookups, so only the first copy survives.
            Ok(book) if books.iter().any(|b| b.id == book.id) => {
                warn!(book_id = %book.id, "Skipping duplicate stored book");
            }
            Ok(book) => books.push(repair_book(book)),
            Err(e) => warn!(error = %e, "Skipping malformed stored book"),
        }
    }
    if books.len() < total {
        warn!(kept = books.len(), total, "Some stored books were dropped");
    }
    books
}

pub fn decode_profile(raw: &str) -> UserProfile {
    match serde_json::from_str::<UserProfile>(raw) {
        Ok(profile) => profile::normalize(profile),
        Err(e) => {
            warn!(error = %e, "Stored profile is unreadable, using defaults");
            UserProfile::default()
        }
    }
}

/// Fills display fields older data may lack and pulls the rating back into range.
pub fn repair_book(mut book: Book) -> Book {
    if book.cover_url.trim().is_empty() {
        book.cover_url = cover_url_for(&book.title);
    }
    if book.current_chapter == 0 {
        book.current_chapter = 1;
    }
    book.rating = book.rating.min(MAX_RATING);
    book
}
