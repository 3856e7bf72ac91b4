//! crates/book_corner_core/src/vault.rs
//!
//! The export/import document: `{ "books": [...], "profile": {...} }`.
//! Import validates every section it finds before anything is applied.

use serde::Serialize;
use serde_json::Value;

use crate::domain::{date_stamp, Book, UserProfile};
use crate::persistence::repair_book;
use crate::profile;
use crate::repository::MAX_RATING;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("The vault is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("The vault must be a JSON object")]
    NotAnObject,
    #[error("The vault contains neither `books` nor `profile`")]
    MissingSections,
    #[error("The `books` section is invalid: {0}")]
    InvalidBooks(String),
    #[error("The `profile` section is invalid: {0}")]
    InvalidProfile(String),
}

/// A full snapshot of the library, as written by an export.
#[derive(Debug, Serialize)]
pub struct VaultDocument<'a> {
    pub books: &'a [Book],
    pub profile: &'a UserProfile,
}

/// What a successful import will restore. Either section may be absent.
#[derive(Debug, Clone, PartialEq)]
pub struct VaultImport {
    pub books: Option<Vec<Book>>,
    pub profile: Option<UserProfile>,
}

pub fn export_json(books: &[Book], profile: &UserProfile) -> Result<String, serde_json::Error> {
    serde_json::to_string(&VaultDocument { books, profile })
}

/// `book_corner_vault_YYYY-MM-DD.json` for the given epoch-millisecond instant.
pub fn export_file_name(now_millis: i64) -> String {
    format!("book_corner_vault_{}.json", date_stamp(now_millis))
}

pub fn parse_import(raw: &str) -> Result<VaultImport, ImportError> {
    let document: Value = serde_json::from_str(raw)?;
    let Value::Object(mut fields) = document else {
        return Err(ImportError::NotAnObject);
    };

    let books = match fields.remove("books") {
        None | Some(Value::Null) => None,
        Some(value @ Value::Array(_)) => Some(decode_books(value)?),
        Some(_) => return Err(ImportError::InvalidBooks("expected an array".into())),
    };
    let profile = match fields.remove("profile") {
        None | Some(Value::Null) => None,
        Some(value @ Value::Object(_)) => Some(
            serde_json::from_value::<UserProfile>(value)
                .map(profile::normalize)
                .map_err(|e| ImportError::InvalidProfile(e.to_string()))?,
        ),
        Some(_) => return Err(ImportError::InvalidProfile("expected an object".into())),
    };

    if books.is_none() && profile.is_none() {
        return Err(ImportError::MissingSections);
    }
    Ok(VaultImport { books, profile })
}

fn decode_books(value: Value) -> Result<Vec<Book>, ImportError> {
    let books: Vec<Book> =
        serde_json::from_value(value).map_err(|e| ImportError::InvalidBooks(e.to_string()))?;
    for (i, book) in books.iter().enumerate() {
        if book.title.trim().is_empty() || book.author.trim().is_empty() {
            return Err(ImportError::InvalidBooks(format!(
                "book {} is missing a title or author",
                book.id
            )));
        }
        if book.rating > MAX_RATING {
            return Err(ImportError::InvalidBooks(format!(
                "book {} has rating {}, expected 0 to {}",
                book.id, book.rating, MAX_RATING
            )));
        }
        if book.notes.iter().any(|n| n.content.trim().is_empty()) {
            return Err(ImportError::InvalidBooks(format!(
                "book {} has an empty note",
                book.id
            )));
        }
        if book.dictionary.iter().any(|v| {
            v.word.trim().is_empty() || v.meaning.trim().is_empty() || v.language.trim().is_empty()
        }) {
            return Err(ImportError::InvalidBooks(format!(
                "book {} has a vocabulary entry without word, meaning or language",
                book.id
            )));
        }
        if books[..i].iter().any(|b| b.id == book.id) {
            return Err(ImportError::InvalidBooks(format!("duplicate id {}", book.id)));
        }
    }
    Ok(books.into_iter().map(repair_book).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewBook;
    use crate::repository::BookRepository;

    fn sample_library() -> (Vec<Book>, UserProfile) {
        let mut repo = BookRepository::default();
        let book = repo.create(NewBook::new("Meditations", "Marcus Aurelius")).unwrap();
        repo.add_note(&book.id, "Begin each day...").unwrap();
        repo.create(NewBook::new("Dune", "Frank Herbert")).unwrap();
        let profile = UserProfile {
            name: "Ada".into(),
            avatar_flip: Some(true),
            ..Default::default()
        };
        (repo.books().to_vec(), profile)
    }

    #[test]
    fn export_then_import_restores_everything() {
        let (books, profile) = sample_library();
        let json = export_json(&books, &profile).unwrap();
        let restored = parse_import(&json).unwrap();
        assert_eq!(restored.books.as_deref(), Some(books.as_slice()));
        assert_eq!(restored.profile, Some(profile));
    }

    #[test]
    fn either_section_may_be_restored_alone() {
        let only_profile = parse_import(r#"{"profile":{"name":"Solo"}}"#).unwrap();
        assert!(only_profile.books.is_none());
        assert_eq!(only_profile.profile.unwrap().name, "Solo");

        let only_books = parse_import(r#"{"books":[]}"#).unwrap();
        assert_eq!(only_books.books, Some(Vec::new()));
        assert!(only_books.profile.is_none());
    }

    #[test]
    fn invalid_documents_are_rejected() {
        assert!(matches!(parse_import("nope"), Err(ImportError::Parse(_))));
        assert!(matches!(parse_import("[]"), Err(ImportError::NotAnObject)));
        assert!(matches!(
            parse_import(r#"{"not_books": []}"#),
            Err(ImportError::MissingSections)
        ));
        assert!(matches!(
            parse_import(r#"{"books": {"a": 1}}"#),
            Err(ImportError::InvalidBooks(_))
        ));
        assert!(matches!(
            parse_import(r#"{"books": [{"id": "1"}]}"#),
            Err(ImportError::InvalidBooks(_))
        ));
        assert!(matches!(
            parse_import(r#"{"books": [], "profile": "me"}"#),
            Err(ImportError::InvalidProfile(_))
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let (books, profile) = sample_library();
        let doubled = vec![books[0].clone(), books[0].clone()];
        let json = export_json(&doubled, &profile).unwrap();
        assert!(matches!(parse_import(&json), Err(ImportError::InvalidBooks(_))));
    }

    fn document_with(book: serde_json::Value) -> String {
        serde_json::json!({ "books": [book] }).to_string()
    }

    fn valid_book() -> serde_json::Value {
        let (books, _) = sample_library();
        serde_json::to_value(&books[1]).unwrap()
    }

    #[test]
    fn out_of_range_rating_is_rejected() {
        let mut book = valid_book();
        book["rating"] = serde_json::json!(200);
        assert!(matches!(
            parse_import(&document_with(book.clone())),
            Err(ImportError::InvalidBooks(_))
        ));

        book["rating"] = serde_json::json!(5);
        let restored = parse_import(&document_with(book)).unwrap();
        assert_eq!(restored.books.unwrap()[0].rating, 5);
    }

    #[test]
    fn blank_notes_and_vocabulary_are_rejected() {
        let mut with_blank_note = valid_book();
        with_blank_note["notes"] =
            serde_json::json!([{ "id": "n1", "content": "   ", "dateAdded": 1 }]);
        assert!(matches!(
            parse_import(&document_with(with_blank_note)),
            Err(ImportError::InvalidBooks(_))
        ));

        let mut with_blank_meaning = valid_book();
        with_blank_meaning["dictionary"] = serde_json::json!([{
            "id": "v1", "word": "logos", "meaning": "", "language": "Greek", "dateAdded": 1
        }]);
        assert!(matches!(
            parse_import(&document_with(with_blank_meaning)),
            Err(ImportError::InvalidBooks(_))
        ));

        let mut with_blank_language = valid_book();
        with_blank_language["dictionary"] = serde_json::json!([{
            "id": "v1", "word": "logos", "meaning": "Word", "language": " ", "dateAdded": 1
        }]);
        assert!(matches!(
            parse_import(&document_with(with_blank_language)),
            Err(ImportError::InvalidBooks(_))
        ));
    }

    #[test]
    fn file_name_carries_the_date() {
        assert_eq!(export_file_name(0), "book_corner_vault_1970-01-01.json");
    }
}
