//! crates/book_corner_core/src/repository.rs
//!
//! The in-memory book collection. Every operation validates its input before
//! touching state, so a rejected call leaves the collection exactly as it was.
//! Mutations hand back an owned copy of the affected book.

use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    cover_url_for, date_stamp, now_millis, Book, BookPatch, Definition, Genre, NewBook, Note,
    ProgressSnapshot, Vocabulary,
};

/// Highest rating a reader can give. Zero means unrated.
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Book not found: {0}")]
    NotFound(String),
    #[error("Rating {0} is outside 0..=5")]
    RatingOutOfRange(u8),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Clone, Default)]
pub struct BookRepository {
    books: Vec<Book>,
}

impl BookRepository {
    pub fn new(books: Vec<Book>) -> Self {
        Self { books }
    }

    /// Books in collection order, newest creation first.
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    /// Catalogs a new book and puts it at the front of the collection.
    pub fn create(&mut self, fields: NewBook) -> RepositoryResult<Book> {
        let title = required(&fields.title, "title")?;
        let author = required(&fields.author, "author")?;
        let chapter = match fields.current_chapter {
            Some(0) => return Err(validation("currentChapter must be at least 1")),
            Some(chapter) => chapter,
            None => 1,
        };
        if fields.total_chapters == Some(0) {
            return Err(validation("totalChapters must be at least 1"));
        }

        let now = now_millis();
        let book = Book {
            id: Uuid::new_v4().to_string(),
            cover_url: cover_url_for(&title),
            title,
            author,
            genre: fields.genre.unwrap_or(Genre::Other),
            subgenres: clean_tags(fields.subgenres),
            source: optional_text(fields.source),
            current_chapter: chapter,
            total_chapters: fields.total_chapters,
            rating: 0,
            is_completed: false,
            notes: Vec::new(),
            dictionary: Vec::new(),
            is_college_material: fields.is_college_material,
            last_updated: now,
            date_started: now,
            date_completed: None,
            progress_history: vec![ProgressSnapshot {
                date: date_stamp(now),
                chapter,
            }],
        };

        debug!(book_id = %book.id, "Book created");
        self.books.insert(0, book.clone());
        Ok(book)
    }

    /// Merges `patch` into the book and bumps `lastUpdated`.
    pub fn update(&mut self, id: &str, patch: BookPatch) -> RepositoryResult<Book> {
        // Validate everything up front so a bad field never half-applies.
        let title = patch.title.as_deref().map(|t| required(t, "title")).transpose()?;
        let author = patch.author.as_deref().map(|a| required(a, "author")).transpose()?;
        if patch.current_chapter == Some(0) {
            return Err(validation("currentChapter must be at least 1"));
        }
        if patch.total_chapters == Some(Some(0)) {
            return Err(validation("totalChapters must be at least 1"));
        }
        if let Some(rating) = patch.rating {
            check_rating(rating)?;
        }

        self.modify(id, |book| {
            if let Some(title) = title {
                book.title = title;
            }
            if let Some(author) = author {
                book.author = author;
            }
            if let Some(genre) = patch.genre {
                book.genre = genre;
            }
            if let Some(subgenres) = patch.subgenres {
                book.subgenres = clean_tags(subgenres);
            }
            if let Some(source) = patch.source {
                book.source = optional_text(source);
            }
            if let Some(chapter) = patch.current_chapter {
                book.current_chapter = chapter;
            }
            if let Some(total) = patch.total_chapters {
                book.total_chapters = total;
            }
            if let Some(rating) = patch.rating {
                book.rating = rating;
            }
            if let Some(completed) = patch.is_completed {
                set_completed(book, completed);
            }
            if let Some(academic) = patch.is_college_material {
                book.is_college_material = academic;
            }
        })
    }

    /// Removes a book together with all of its notes and vocabulary.
    pub fn delete(&mut self, id: &str) -> RepositoryResult<Book> {
        let index = self.index_of(id)?;
        let removed = self.books.remove(index);
        debug!(
            book_id = %removed.id,
            notes = removed.notes.len(),
            words = removed.dictionary.len(),
            "Book deleted"
        );
        Ok(removed)
    }

    pub fn add_note(&mut self, id: &str, content: &str) -> RepositoryResult<Book> {
        if content.trim().is_empty() {
            return Err(validation("note content must not be empty"));
        }
        let note = Note {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            date_added: now_millis(),
        };
        self.modify(id, move |book| book.notes.insert(0, note))
    }

    /// Removes a note. An unknown `note_id` leaves the book untouched.
    pub fn remove_note(&mut self, id: &str, note_id: &str) -> RepositoryResult<Book> {
        let book = self.get(id).ok_or_else(|| not_found(id))?;
        if !book.notes.iter().any(|n| n.id == note_id) {
            return Ok(book.clone());
        }
        self.modify(id, |book| book.notes.retain(|n| n.id != note_id))
    }

    pub fn add_vocabulary(
        &mut self,
        id: &str,
        word: &str,
        context: Option<&str>,
        definition: Definition,
    ) -> RepositoryResult<Book> {
        let word = word.trim();
        if word.is_empty() {
            return Err(validation("word must not be empty"));
        }
        let entry = Vocabulary {
            id: Uuid::new_v4().to_string(),
            word: word.to_string(),
            meaning: definition.meaning,
            language: definition.language,
            context: optional_text(context.map(str::to_string)),
            date_added: now_millis(),
        };
        self.modify(id, move |book| book.dictionary.insert(0, entry))
    }

    /// Removes a vocabulary entry. An unknown `vocab_id` leaves the book untouched.
    pub fn remove_vocabulary(&mut self, id: &str, vocab_id: &str) -> RepositoryResult<Book> {
        let book = self.get(id).ok_or_else(|| not_found(id))?;
        if !book.dictionary.iter().any(|v| v.id == vocab_id) {
            return Ok(book.clone());
        }
        self.modify(id, |book| book.dictionary.retain(|v| v.id != vocab_id))
    }

    pub fn toggle_completion(&mut self, id: &str) -> RepositoryResult<Book> {
        self.modify(id, |book| {
            let completed = !book.is_completed;
            set_completed(book, completed);
        })
    }

    /// Sets the rating. Values above [`MAX_RATING`] are rejected rather than clamped.
    pub fn set_rating(&mut self, id: &str, value: u8) -> RepositoryResult<Book> {
        check_rating(value)?;
        self.modify(id, |book| book.rating = value)
    }

    /// Finds a note anywhere in the collection, with the id of the book that owns it.
    pub fn find_note(&self, note_id: &str) -> Option<(&str, &Note)> {
        self.books.iter().find_map(|b| {
            b.notes
                .iter()
                .find(|n| n.id == note_id)
                .map(|n| (b.id.as_str(), n))
        })
    }

    pub fn find_vocabulary(&self, vocab_id: &str) -> Option<(&str, &Vocabulary)> {
        self.books.iter().find_map(|b| {
            b.dictionary
                .iter()
                .find(|v| v.id == vocab_id)
                .map(|v| (b.id.as_str(), v))
        })
    }

    /// Swaps in a whole new collection, as done by an import.
    pub fn replace_all(&mut self, books: Vec<Book>) {
        self.books = books;
    }

    //=====================================================================================
    // Helpers
    //=====================================================================================

    fn index_of(&self, id: &str) -> RepositoryResult<usize> {
        self.books
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| not_found(id))
    }

    /// The single write path: applies `change`, bumps the timestamp, returns a copy.
    fn modify<F>(&mut self, id: &str, change: F) -> RepositoryResult<Book>
    where
        F: FnOnce(&mut Book),
    {
        let index = self.index_of(id)?;
        let book = &mut self.books[index];
        change(book);
        book.last_updated = now_millis().max(book.last_updated);
        Ok(book.clone())
    }
}

fn set_completed(book: &mut Book, completed: bool) {
    if book.is_completed == completed {
        return;
    }
    book.is_completed = completed;
    book.date_completed = completed.then(now_millis);
}

fn check_rating(value: u8) -> RepositoryResult<()> {
    if value > MAX_RATING {
        return Err(RepositoryError::RatingOutOfRange(value));
    }
    Ok(())
}

fn required(value: &str, field: &str) -> RepositoryResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(validation(&format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Trims tags, drops blanks and repeats; first occurrence wins.
fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !cleaned.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            cleaned.push(tag.to_string());
        }
    }
    cleaned
}

fn validation(message: &str) -> RepositoryError {
    RepositoryError::Validation(message.to_string())
}

fn not_found(id: &str) -> RepositoryError {
    RepositoryError::NotFound(id.to_string())
}
