//! crates/book_corner_core/src/views.rs
//!
//! Derived views over the book collection: statistics, search, sorting and the
//! "recent activity" feeds. Everything here is a pure function of its inputs and
//! is recomputed on every query.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::domain::{Book, Genre, Note, Vocabulary};

/// How many entries the dashboard activity feeds show by default.
pub const RECENT_ACTIVITY_LIMIT: usize = 6;

/// Aggregate figures shown on the dashboard and the stats page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    pub vocabulary_count: usize,
    pub notes_count: usize,
    pub academic_count: usize,
    /// Percentage of books completed, 0..=100.
    pub completion_rate: u8,
    /// Completed books as a percentage of the reading goal, capped at 100.
    pub progress_to_goal: u8,
}

/// Which shelf is being looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    #[default]
    Library,
    #[serde(alias = "college")]
    Academic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Most recently updated first.
    #[default]
    Recent,
    Title,
    Author,
    /// Highest rated first.
    Rating,
}

/// The UI inputs a book listing depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ViewQuery {
    pub section: Section,
    pub search: Option<String>,
    pub sort: SortKey,
}

/// A vocabulary entry together with the book it belongs to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyActivity<'a> {
    pub book_id: &'a str,
    pub book_title: &'a str,
    #[serde(flatten)]
    pub entry: &'a Vocabulary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteActivity<'a> {
    pub book_id: &'a str,
    pub book_title: &'a str,
    #[serde(flatten)]
    pub note: &'a Note,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenreCount {
    pub genre: Genre,
    pub count: usize,
}

pub fn compute_stats(books: &[Book], reading_goal: u32) -> LibraryStats {
    let total = books.len();
    let completed = books.iter().filter(|b| b.is_completed).count();

    LibraryStats {
        total,
        completed,
        active: total - completed,
        vocabulary_count: books.iter().map(|b| b.dictionary.len()).sum(),
        notes_count: books.iter().map(|b| b.notes.len()).sum(),
        academic_count: books.iter().filter(|b| b.is_college_material).count(),
        completion_rate: percentage(completed, total),
        progress_to_goal: percentage(completed, reading_goal.max(1) as usize),
    }
}

/// `round(part / whole * 100)`, 0 for an empty whole, never above 100.
fn percentage(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let pct = (part as f64 / whole as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Restricts to the section, then to books matching `search` in any text field.
pub fn filter_books<'a>(books: &'a [Book], section: Section, search: Option<&str>) -> Vec<&'a Book> {
    // Only an empty query means "no filter"; whitespace is part of the query.
    let needle = search.filter(|s| !s.is_empty()).map(str::to_lowercase);

    books
        .iter()
        .filter(|b| section == Section::Library || b.is_college_material)
        .filter(|b| needle.as_deref().map_or(true, |q| matches_search(b, q)))
        .collect()
}

/// Case-insensitive substring match on title, author, source and subgenre tags.
/// `needle` must already be lowercase.
pub fn matches_search(book: &Book, needle: &str) -> bool {
    let hit = |field: &str| field.to_lowercase().contains(needle);
    hit(&book.title)
        || hit(&book.author)
        || book.source.as_deref().is_some_and(hit)
        || book.subgenres.iter().any(|s| hit(s))
}

/// Stable sort: books with equal keys keep their relative order.
pub fn sort_books(books: &mut [&Book], key: SortKey) {
    match key {
        SortKey::Recent => books.sort_by(|a, b| b.last_updated.cmp(&a.last_updated)),
        SortKey::Title => books.sort_by(|a, b| text_order(&a.title, &b.title)),
        SortKey::Author => books.sort_by(|a, b| text_order(&a.author, &b.author)),
        SortKey::Rating => books.sort_by(|a, b| b.rating.cmp(&a.rating)),
    }
}

fn text_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Filter then sort, the listing shown for a given set of UI inputs.
pub fn project<'a>(books: &'a [Book], query: &ViewQuery) -> Vec<&'a Book> {
    let mut view = filter_books(books, query.section, query.search.as_deref());
    sort_books(&mut view, query.sort);
    view
}

pub fn recent_vocabulary(books: &[Book], limit: Option<usize>) -> Vec<VocabularyActivity<'_>> {
    let mut entries: Vec<_> = books
        .iter()
        .flat_map(|b| {
            b.dictionary.iter().map(move |entry| VocabularyActivity {
                book_id: &b.id,
                book_title: &b.title,
                entry,
            })
        })
        .collect();
    entries.sort_by(|a, b| b.entry.date_added.cmp(&a.entry.date_added));
    truncate(entries, limit)
}

pub fn recent_notes(books: &[Book], limit: Option<usize>) -> Vec<NoteActivity<'_>> {
    let mut entries: Vec<_> = books
        .iter()
        .flat_map(|b| {
            b.notes.iter().map(move |note| NoteActivity {
                book_id: &b.id,
                book_title: &b.title,
                note,
            })
        })
        .collect();
    entries.sort_by(|a, b| b.note.date_added.cmp(&a.note.date_added));
    truncate(entries, limit)
}

fn truncate<T>(mut entries: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    entries
}

/// The first `limit` unfinished books, in collection order.
pub fn currently_reading(books: &[Book], limit: usize) -> Vec<&Book> {
    books.iter().filter(|b| !b.is_completed).take(limit).collect()
}

/// Books per genre, in the order genres are declared. Empty genres are skipped.
pub fn genre_breakdown(books: &[Book]) -> Vec<GenreCount> {
    Genre::ALL
        .into_iter()
        .map(|genre| GenreCount {
            genre,
            count: books.iter().filter(|b| b.genre == genre).count(),
        })
        .filter(|g| g.count > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cover_url_for;

    fn book(id: &str, title: &str, author: &str, updated: i64) -> Book {
        Book {
            id: id.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            genre: Genre::Novel,
            subgenres: Vec::new(),
            source: None,
            current_chapter: 1,
            total_chapters: None,
            rating: 0,
            is_completed: false,
            notes: Vec::new(),
            dictionary: Vec::new(),
            is_college_material: false,
            cover_url: cover_url_for(title),
            last_updated: updated,
            date_started: updated,
            date_completed: None,
            progress_history: Vec::new(),
        }
    }

    fn word(id: &str, added: i64) -> Vocabulary {
        Vocabulary {
            id: id.to_string(),
            word: id.to_string(),
            meaning: "m".to_string(),
            language: "English".to_string(),
            context: None,
            date_added: added,
        }
    }

    fn shelf() -> Vec<Book> {
        let mut dune = book("1", "Dune", "Frank Herbert", 30);
        dune.subgenres = vec!["Space Opera".into()];
        dune.rating = 4;
        let mut calculus = book("2", "Calculus", "Michael Spivak", 20);
        calculus.is_college_material = true;
        calculus.source = Some("University Library".into());
        calculus.is_completed = true;
        calculus.rating = 5;
        let mut solo = book("3", "Solo Leveling", "Chugong", 10);
        solo.genre = Genre::Manhwa;
        vec![dune, calculus, solo]
    }

    #[test]
    fn stats_count_everything() {
        let mut books = shelf();
        books[0].dictionary = vec![word("a", 1), word("b", 2)];
        books[2].dictionary = vec![word("c", 3)];

        let stats = compute_stats(&books, 4);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.vocabulary_count, 3);
        assert_eq!(stats.academic_count, 1);
        assert_eq!(stats.completion_rate, 33);
        assert_eq!(stats.progress_to_goal, 25);
    }

    #[test]
    fn stats_stay_within_bounds() {
        assert_eq!(compute_stats(&[], 0), LibraryStats::default());

        let mut books = shelf();
        for b in books.iter_mut() {
            b.is_completed = true;
        }
        for goal in [0, 1, 2, 3, 1000] {
            let stats = compute_stats(&books, goal);
            assert!(stats.completion_rate <= 100);
            assert!(stats.progress_to_goal <= 100);
        }
        assert_eq!(compute_stats(&books, 0).progress_to_goal, 100);
        assert_eq!(compute_stats(&books, 3).completion_rate, 100);
    }

    #[test]
    fn academic_section_restricts_to_college_material() {
        let books = shelf();
        let view = filter_books(&books, Section::Academic, None);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].title, "Calculus");
    }

    #[test]
    fn search_matches_any_field_case_insensitively() {
        let books = shelf();
        let ids = |q: &str| -> Vec<String> {
            filter_books(&books, Section::Library, Some(q))
                .into_iter()
                .map(|b| b.id.clone())
                .collect()
        };
        assert_eq!(ids("DUNE"), vec!["1"]);
        assert_eq!(ids("spivak"), vec!["2"]);
        assert_eq!(ids("university"), vec!["2"]);
        assert_eq!(ids("opera"), vec!["1"]);
        assert_eq!(ids(""), vec!["1", "2", "3"]);
        assert_eq!(ids("frank "), vec!["1"]);
        assert!(ids(" dune").is_empty());
        assert!(ids("  ").is_empty());
        assert!(ids("tolkien").is_empty());
    }

    #[test]
    fn filtered_result_partitions_the_collection() {
        let books = shelf();
        for query in ["a", "er", "o", "xyz", "Library", "chug", " dune", "dune ", "   ", "a b"] {
            let needle = query.to_lowercase();
            let hits = filter_books(&books, Section::Library, Some(query));
            for b in &books {
                let included = hits.iter().any(|h| h.id == b.id);
                assert_eq!(included, matches_search(b, &needle), "query {query:?} book {}", b.id);
            }
        }
    }

    #[test]
    fn recent_sort_is_stable_for_equal_timestamps() {
        let books = vec![
            book("first", "B", "x", 100),
            book("second", "A", "y", 100),
            book("newer", "C", "z", 200),
        ];
        let mut view: Vec<&Book> = books.iter().collect();
        sort_books(&mut view, SortKey::Recent);
        let ids: Vec<&str> = view.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["newer", "first", "second"]);
    }

    #[test]
    fn sort_keys_order_as_expected() {
        let books = shelf();
        let order = |key| -> Vec<String> {
            let mut view: Vec<&Book> = books.iter().collect();
            sort_books(&mut view, key);
            view.into_iter().map(|b| b.title.clone()).collect()
        };
        assert_eq!(order(SortKey::Title), vec!["Calculus", "Dune", "Solo Leveling"]);
        assert_eq!(order(SortKey::Author), vec!["Solo Leveling", "Dune", "Calculus"]);
        assert_eq!(order(SortKey::Rating), vec!["Calculus", "Dune", "Solo Leveling"]);
        assert_eq!(order(SortKey::Recent), vec!["Dune", "Calculus", "Solo Leveling"]);
    }

    #[test]
    fn project_filters_then_sorts() {
        let books = shelf();
        let query = ViewQuery {
            section: Section::Library,
            search: Some("o".into()),
            sort: SortKey::Title,
        };
        let titles: Vec<&str> = project(&books, &query).iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Dune", "Solo Leveling"]);
    }

    #[test]
    fn recent_vocabulary_flattens_sorts_and_truncates() {
        let mut books = shelf();
        books[0].dictionary = vec![word("old", 1), word("mid", 5)];
        books[1].dictionary = vec![word("new", 9)];

        let feed = recent_vocabulary(&books, Some(2));
        let words: Vec<&str> = feed.iter().map(|v| v.entry.word.as_str()).collect();
        assert_eq!(words, vec!["new", "mid"]);
        assert_eq!(feed[0].book_title, "Calculus");
        assert_eq!(recent_vocabulary(&books, None).len(), 3);
    }

    #[test]
    fn recent_notes_orders_by_date_added() {
        let mut books = shelf();
        books[2].notes = vec![Note { id: "n1".into(), content: "a".into(), date_added: 3 }];
        books[0].notes = vec![Note { id: "n2".into(), content: "b".into(), date_added: 7 }];
        let ids: Vec<&str> = recent_notes(&books, None).iter().map(|n| n.note.id.as_str()).collect();
        assert_eq!(ids, vec!["n2", "n1"]);
    }

    #[test]
    fn currently_reading_skips_finished_books() {
        let books = shelf();
        let titles: Vec<&str> = currently_reading(&books, 4).iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Dune", "Solo Leveling"]);
    }

    #[test]
    fn genre_breakdown_omits_empty_genres() {
        let breakdown = genre_breakdown(&shelf());
        assert_eq!(
            breakdown,
            vec![
                GenreCount { genre: Genre::Novel, count: 2 },
                GenreCount { genre: Genre::Manhwa, count: 1 },
            ]
        );
    }
}
