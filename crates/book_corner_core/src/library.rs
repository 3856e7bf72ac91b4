//! crates/book_corner_core/src/library.rs
//!
//! `Library` is the one owned store object for the application: the book
//! repository, the profile store and the persistence adapter. Every mutation
//! goes through the repository or profile contract and is then written out in
//! full before the call returns.

use std::sync::Arc;
use tracing::{error, info};

use crate::domain::{now_millis, Book, BookPatch, Definition, NewBook, UserProfile};
use crate::persistence::Persistence;
use crate::ports::{KeyValueStore, PortError};
use crate::profile::{ProfileError, ProfileStore};
use crate::repository::{BookRepository, RepositoryError};
use crate::vault::{self, ImportError};
use crate::views::{self, LibraryStats};

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("Could not persist the library: {0}")]
    Storage(#[from] PortError),
}

pub type LibraryResult<T> = Result<T, LibraryError>;

/// Outcome of a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub books_restored: Option<usize>,
    pub profile_restored: bool,
}

pub struct Library {
    repository: BookRepository,
    profile: ProfileStore,
    persistence: Persistence,
}

impl Library {
    /// Loads whatever the store holds. Never fails: bad data becomes defaults.
    pub async fn open(store: Arc<dyn KeyValueStore>) -> Self {
        let persistence = Persistence::new(store);
        let (books, profile) = persistence.load().await;
        Self {
            repository: BookRepository::new(books),
            profile: ProfileStore::new(profile),
            persistence,
        }
    }

    pub fn books(&self) -> &[Book] {
        self.repository.books()
    }

    pub fn book(&self, id: &str) -> Option<&Book> {
        self.repository.get(id)
    }

    pub fn repository(&self) -> &BookRepository {
        &self.repository
    }

    pub fn profile(&self) -> &UserProfile {
        self.profile.get()
    }

    pub fn stats(&self) -> LibraryStats {
        views::compute_stats(self.books(), self.profile().reading_goal)
    }

    pub async fn create_book(&mut self, fields: NewBook) -> LibraryResult<Book> {
        let book = self.apply(|repo, _| Ok(repo.create(fields)?)).await?;
        info!(book_id = %book.id, title = %book.title, "Book added");
        Ok(book)
    }

    pub async fn update_book(&mut self, id: &str, patch: BookPatch) -> LibraryResult<Book> {
        self.apply(|repo, _| Ok(repo.update(id, patch)?)).await
    }

    pub async fn delete_book(&mut self, id: &str) -> LibraryResult<Book> {
        let book = self.apply(|repo, _| Ok(repo.delete(id)?)).await?;
        info!(book_id = %book.id, "Book removed");
        Ok(book)
    }

    pub async fn add_note(&mut self, id: &str, content: &str) -> LibraryResult<Book> {
        self.apply(|repo, _| Ok(repo.add_note(id, content)?)).await
    }

    pub async fn remove_note(&mut self, id: &str, note_id: &str) -> LibraryResult<Book> {
        self.apply(|repo, _| Ok(repo.remove_note(id, note_id)?)).await
    }

    pub async fn add_vocabulary(
        &mut self,
        id: &str,
        word: &str,
        context: Option<&str>,
        definition: Definition,
    ) -> LibraryResult<Book> {
        self.apply(|repo, _| Ok(repo.add_vocabulary(id, word, context, definition)?))
            .await
    }

    pub async fn remove_vocabulary(&mut self, id: &str, vocab_id: &str) -> LibraryResult<Book> {
        self.apply(|repo, _| Ok(repo.remove_vocabulary(id, vocab_id)?)).await
    }

    pub async fn toggle_completion(&mut self, id: &str) -> LibraryResult<Book> {
        self.apply(|repo, _| Ok(repo.toggle_completion(id)?)).await
    }

    pub async fn set_rating(&mut self, id: &str, value: u8) -> LibraryResult<Book> {
        self.apply(|repo, _| Ok(repo.set_rating(id, value)?)).await
    }

    pub async fn set_profile(&mut self, profile: UserProfile) -> LibraryResult<()> {
        self.apply(|_, store| Ok(store.set(profile)?)).await
    }

    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        vault::export_json(self.books(), self.profile())
    }

    pub fn export_file_name(&self) -> String {
        vault::export_file_name(now_millis())
    }

    /// Replaces the sections present in `raw`. A rejected document changes nothing.
    pub async fn import(&mut self, raw: &str) -> LibraryResult<ImportSummary> {
        let restored = vault::parse_import(raw)?;
        let summary = ImportSummary {
            books_restored: restored.books.as_ref().map(Vec::len),
            profile_restored: restored.profile.is_some(),
        };
        self.apply(|repo, store| {
            if let Some(books) = restored.books {
                repo.replace_all(books);
            }
            if let Some(profile) = restored.profile {
                *store = ProfileStore::new(profile);
            }
            Ok(())
        })
        .await?;
        info!(?summary, "Vault imported");
        Ok(summary)
    }

    /// Wipes storage and returns to an empty library with the default profile.
    pub async fn reset(&mut self) -> LibraryResult<()> {
        self.persistence.clear().await?;
        self.repository = BookRepository::default();
        self.profile = ProfileStore::default();
        info!("Library reset");
        Ok(())
    }

    /// Runs `change` on the in-memory stores, then writes the result out.
    /// If either step fails the stores are put back as they were.
    async fn apply<T, F>(&mut self, change: F) -> LibraryResult<T>
    where
        F: FnOnce(&mut BookRepository, &mut ProfileStore) -> LibraryResult<T>,
    {
        let repository = self.repository.clone();
        let profile = self.profile.clone();
        let outcome = match change(&mut self.repository, &mut self.profile) {
            Ok(value) => self.persist().await.map(|()| value),
            Err(e) => Err(e),
        };
        if outcome.is_err() {
            self.repository = repository;
            self.profile = profile;
        }
        outcome
    }

    async fn persist(&self) -> LibraryResult<()> {
        self.persistence
            .save(self.books(), self.profile())
            .await
            .map_err(|e| {
                error!("Failed to persist library: {:?}", e);
                LibraryError::Storage(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup;
    use crate::persistence::{BOOKS_KEY, PROFILE_KEY};
    use crate::test_support::MemoryStore;

    async fn open_empty() -> (Library, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        let library = Library::open(store.clone()).await;
        (library, store)
    }

    #[tokio::test]
    async fn add_and_complete_a_book() {
        let (mut library, _) = open_empty().await;
        let book = library
            .create_book(NewBook::new("Meditations", "Marcus Aurelius"))
            .await
            .unwrap();
        assert!(!book.is_completed);
        assert_eq!(book.rating, 0);
        assert_eq!(book.current_chapter, 1);

        let before = library.stats();
        let toggled = library.toggle_completion(&book.id).await.unwrap();
        let after = library.stats();

        assert!(toggled.is_completed);
        assert_eq!(after.completed, before.completed + 1);
        assert_eq!(after.active, before.active - 1);
    }

    #[tokio::test]
    async fn vocabulary_under_lookup_failure() {
        let (mut library, _) = open_empty().await;
        let book = library
            .create_book(NewBook::new("Meditations", "Marcus Aurelius"))
            .await
            .unwrap();
        let before = library.stats().vocabulary_count;

        let updated = library
            .add_vocabulary(&book.id, "ephemeral", None, lookup::fallback())
            .await
            .unwrap();

        assert_eq!(updated.dictionary.len(), 1);
        assert_eq!(updated.dictionary[0].language, "Unknown");
        assert_eq!(library.stats().vocabulary_count, before + 1);
    }

    #[tokio::test]
    async fn every_mutation_is_written_through() {
        let (mut library, store) = open_empty().await;
        let book = library.create_book(NewBook::new("Dune", "Frank Herbert")).await.unwrap();
        library.add_note(&book.id, "Spice must flow").await.unwrap();

        let reopened = Library::open(store.clone()).await;
        assert_eq!(reopened.books(), library.books());
        assert_eq!(reopened.books()[0].notes[0].content, "Spice must flow");
        assert!(store.contains(BOOKS_KEY) && store.contains(PROFILE_KEY));
    }

    #[tokio::test]
    async fn rejected_mutations_report_and_change_nothing() {
        let (mut library, _) = open_empty().await;
        let book = library.create_book(NewBook::new("Dune", "Frank Herbert")).await.unwrap();

        let err = library.set_rating(&book.id, 7).await.unwrap_err();
        assert!(matches!(
            err,
            LibraryError::Repository(RepositoryError::RatingOutOfRange(7))
        ));
        let err = library.delete_book("ghost").await.unwrap_err();
        assert!(matches!(err, LibraryError::Repository(RepositoryError::NotFound(_))));
        assert_eq!(library.books().len(), 1);
        assert_eq!(library.books()[0], book);
    }

    #[tokio::test]
    async fn invalid_import_leaves_state_untouched() {
        let (mut library, store) = open_empty().await;
        library.create_book(NewBook::new("Dune", "Frank Herbert")).await.unwrap();
        let stored_books = store.value(BOOKS_KEY);
        let stored_profile = store.value(PROFILE_KEY);
        let books_before = library.books().to_vec();

        let err = library.import(r#"{"not_books": []}"#).await.unwrap_err();
        assert!(matches!(err, LibraryError::Import(ImportError::MissingSections)));
        assert_eq!(library.books(), books_before.as_slice());
        assert_eq!(library.profile(), &UserProfile::default());
        assert_eq!(store.value(BOOKS_KEY), stored_books);
        assert_eq!(store.value(PROFILE_KEY), stored_profile);
    }

    #[tokio::test]
    async fn export_import_round_trip_replaces_state() {
        let (mut source, _) = open_empty().await;
        let book = source.create_book(NewBook::new("Dune", "Frank Herbert")).await.unwrap();
        source.add_vocabulary(&book.id, "kwisatz", None, lookup::fallback()).await.unwrap();
        source
            .set_profile(UserProfile {
                name: "Paul".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let exported = source.export_json().unwrap();

        let (mut target, _) = open_empty().await;
        target.create_book(NewBook::new("Replaced", "Soon")).await.unwrap();
        let summary = target.import(&exported).await.unwrap();

        assert_eq!(summary.books_restored, Some(1));
        assert!(summary.profile_restored);
        assert_eq!(target.books(), source.books());
        assert_eq!(target.profile(), source.profile());
    }

    #[tokio::test]
    async fn failed_write_rolls_the_change_back() {
        let (mut library, store) = open_empty().await;
        let book = library.create_book(NewBook::new("Dune", "Frank Herbert")).await.unwrap();
        let books_before = library.books().to_vec();
        let stored_before = store.value(BOOKS_KEY);

        store.fail_writes(true);
        let err = library
            .create_book(NewBook::new("Emma", "Jane Austen"))
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::Storage(_)));
        assert!(library.add_note(&book.id, "lost").await.is_err());
        assert!(library.set_rating(&book.id, 5).await.is_err());
        assert!(library
            .set_profile(UserProfile {
                name: "Paul".into(),
                ..Default::default()
            })
            .await
            .is_err());
        assert!(library.import(r#"{"books":[]}"#).await.is_err());

        assert_eq!(library.books(), books_before.as_slice());
        assert_eq!(library.profile(), &UserProfile::default());
        assert_eq!(store.value(BOOKS_KEY), stored_before);

        store.fail_writes(false);
        library.add_note(&book.id, "kept").await.unwrap();
        let reopened = Library::open(store.clone()).await;
        assert_eq!(reopened.books().len(), 1);
        assert_eq!(reopened.books()[0].notes.len(), 1);
        assert_eq!(reopened.books()[0].notes[0].content, "kept");
    }

    #[tokio::test]
    async fn reset_clears_storage() {
        let (mut library, store) = open_empty().await;
        library.create_book(NewBook::new("Dune", "Frank Herbert")).await.unwrap();
        library.reset().await.unwrap();
        assert!(library.books().is_empty());
        assert!(store.is_empty());
    }
}
