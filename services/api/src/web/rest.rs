//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use book_corner_core::{
    domain::{BookPatch, Genre, NewBook, UserProfile},
    library::LibraryError,
    profile::avatar_url,
    repository::RepositoryError,
    views::{self, GenreCount, LibraryStats, ViewQuery, RECENT_ACTIVITY_LIMIT},
    Book,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{IntoParams, OpenApi, ToSchema};

/// How many unfinished books the dashboard shelf shows.
const CURRENTLY_READING_LIMIT: usize = 4;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_books_handler,
        create_book_handler,
        get_book_handler,
        update_book_handler,
        delete_book_handler,
        toggle_completion_handler,
        set_rating_handler,
        add_note_handler,
        remove_note_handler,
        add_vocabulary_handler,
        remove_vocabulary_handler,
        stats_handler,
        dashboard_handler,
        vocabulary_feed_handler,
        notes_feed_handler,
        get_profile_handler,
        update_profile_handler,
        export_vault_handler,
        import_vault_handler,
        reset_vault_handler,
    ),
    components(
        schemas(
            CreateBookRequest,
            UpdateBookRequest,
            RatingRequest,
            NoteRequest,
            VocabularyRequest,
            ProfileRequest,
            ImportResponse,
        )
    ),
    tags(
        (name = "Book Corner API", description = "Local endpoints for the personal book tracker.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Request and Response Structs
//=========================================================================================

/// The payload for cataloging a new book. Only `title` and `author` are required.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
    /// One of Novel, Self-Help, Philosophy, Web Novel, Manga, Manhwa, Textbook, Other.
    pub genre: Option<String>,
    #[serde(default)]
    pub subgenres: Vec<String>,
    pub source: Option<String>,
    pub current_chapter: Option<u32>,
    pub total_chapters: Option<u32>,
    #[serde(default)]
    pub is_college_material: bool,
}

impl From<CreateBookRequest> for NewBook {
    fn from(req: CreateBookRequest) -> Self {
        NewBook {
            title: req.title,
            author: req.author,
            genre: req.genre.map(Genre::from),
            subgenres: req.subgenres,
            source: req.source,
            current_chapter: req.current_chapter,
            total_chapters: req.total_chapters,
            is_college_material: req.is_college_material,
        }
    }
}

/// A partial update. Omitted fields are left alone; `null` clears `source` or `totalChapters`.
#[derive(Deserialize, ToSchema, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub subgenres: Option<Vec<String>>,
    #[serde(deserialize_with = "book_corner_core::domain::double_option")]
    #[schema(value_type = Option<String>)]
    pub source: Option<Option<String>>,
    pub current_chapter: Option<u32>,
    #[serde(deserialize_with = "book_corner_core::domain::double_option")]
    #[schema(value_type = Option<u32>)]
    pub total_chapters: Option<Option<u32>>,
    pub rating: Option<u8>,
    pub is_completed: Option<bool>,
    pub is_college_material: Option<bool>,
}

impl From<UpdateBookRequest> for BookPatch {
    fn from(req: UpdateBookRequest) -> Self {
        BookPatch {
            title: req.title,
            author: req.author,
            genre: req.genre.map(Genre::from),
            subgenres: req.subgenres,
            source: req.source,
            current_chapter: req.current_chapter,
            total_chapters: req.total_chapters,
            rating: req.rating,
            is_completed: req.is_completed,
            is_college_material: req.is_college_material,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct RatingRequest {
    /// 0 (unrated) to 5.
    pub rating: u8,
}

#[derive(Deserialize, ToSchema)]
pub struct NoteRequest {
    pub content: String,
}

#[derive(Deserialize, ToSchema)]
pub struct VocabularyRequest {
    pub word: String,
    pub context: Option<String>,
}

/// The full profile. It replaces the stored one wholesale.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub name: String,
    #[serde(default)]
    pub bio: String,
    pub reading_goal: u32,
    #[serde(default)]
    pub favorite_genre: String,
    #[serde(default)]
    pub avatar_seed: String,
    pub avatar_choice: String,
    pub avatar_flip: Option<bool>,
    pub avatar_rotate: Option<i32>,
}

impl From<ProfileRequest> for UserProfile {
    fn from(req: ProfileRequest) -> Self {
        UserProfile {
            name: req.name,
            bio: req.bio,
            reading_goal: req.reading_goal,
            favorite_genre: req.favorite_genre,
            avatar_seed: req.avatar_seed,
            avatar_choice: req.avatar_choice,
            avatar_flip: req.avatar_flip,
            avatar_rotate: req.avatar_rotate,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub avatar_url: String,
}

impl From<&UserProfile> for ProfileResponse {
    fn from(profile: &UserProfile) -> Self {
        Self {
            avatar_url: avatar_url(profile),
            profile: profile.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: LibraryStats,
    pub genres: Vec<GenreCount>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub books_restored: Option<usize>,
    pub profile_restored: bool,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitParams {
    /// Maximum number of entries to return. All entries when omitted.
    pub limit: Option<usize>,
}

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Maps a core failure onto the HTTP status the caller should see.
fn library_error(e: LibraryError) -> (StatusCode, String) {
    let status = match &e {
        LibraryError::Repository(RepositoryError::NotFound(_)) => StatusCode::NOT_FOUND,
        LibraryError::Repository(_) | LibraryError::Profile(_) => StatusCode::BAD_REQUEST,
        LibraryError::Import(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LibraryError::Storage(_) => {
            error!("Storage failure: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}

fn book_not_found(id: &str) -> (StatusCode, String) {
    library_error(RepositoryError::NotFound(id.to_string()).into())
}

//=========================================================================================
// Book Handlers
//=========================================================================================

/// List books for a shelf, filtered by search text and sorted.
#[utoipa::path(
    get,
    path = "/books",
    params(
        ("section" = Option<String>, Query, description = "`library` (default) or `academic`."),
        ("search" = Option<String>, Query, description = "Case-insensitive match on title, author, source and tags."),
        ("sort" = Option<String>, Query, description = "`recent` (default), `title`, `author` or `rating`.")
    ),
    responses((status = 200, description = "Matching books"))
)]
pub async fn list_books_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> impl IntoResponse {
    let library = state.library.lock().await;
    let books: Vec<Book> = views::project(library.books(), &query)
        .into_iter()
        .cloned()
        .collect();
    Json(books)
}

/// Catalog a new book.
#[utoipa::path(
    post,
    path = "/books",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Book created"),
        (status = 400, description = "Missing title or author, or an invalid chapter")
    )
)]
pub async fn create_book_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let book = state
        .library
        .lock()
        .await
        .create_book(req.into())
        .await
        .map_err(library_error)?;
    Ok((StatusCode::CREATED, Json(book)))
}

#[utoipa::path(
    get,
    path = "/books/{id}",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "The book"),
        (status = 404, description = "No such book")
    )
)]
pub async fn get_book_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let library = state.library.lock().await;
    let book = library.book(&id).cloned().ok_or_else(|| book_not_found(&id))?;
    Ok(Json(book))
}

#[utoipa::path(
    patch,
    path = "/books/{id}",
    params(("id" = String, Path, description = "Book id")),
    request_body = UpdateBookRequest,
    responses(
        (status = 200, description = "Updated book"),
        (status = 400, description = "A field failed validation"),
        (status = 404, description = "No such book")
    )
)]
pub async fn update_book_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateBookRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let book = state
        .library
        .lock()
        .await
        .update_book(&id, req.into())
        .await
        .map_err(library_error)?;
    Ok(Json(book))
}

/// Delete a book along with its notes and vocabulary.
#[utoipa::path(
    delete,
    path = "/books/{id}",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "No such book")
    )
)]
pub async fn delete_book_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .library
        .lock()
        .await
        .delete_book(&id)
        .await
        .map_err(library_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/books/{id}/completion",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book with its completion flag flipped"),
        (status = 404, description = "No such book")
    )
)]
pub async fn toggle_completion_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let book = state
        .library
        .lock()
        .await
        .toggle_completion(&id)
        .await
        .map_err(library_error)?;
    Ok(Json(book))
}

#[utoipa::path(
    put,
    path = "/books/{id}/rating",
    params(("id" = String, Path, description = "Book id")),
    request_body = RatingRequest,
    responses(
        (status = 200, description = "Rated book"),
        (status = 400, description = "Rating outside 0..=5"),
        (status = 404, description = "No such book")
    )
)]
pub async fn set_rating_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<RatingRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let book = state
        .library
        .lock()
        .await
        .set_rating(&id, req.rating)
        .await
        .map_err(library_error)?;
    Ok(Json(book))
}

//=========================================================================================
// Note and Vocabulary Handlers
//=========================================================================================

#[utoipa::path(
    post,
    path = "/books/{id}/notes",
    params(("id" = String, Path, description = "Book id")),
    request_body = NoteRequest,
    responses(
        (status = 201, description = "Book with the new note first"),
        (status = 400, description = "Empty note"),
        (status = 404, description = "No such book")
    )
)]
pub async fn add_note_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<NoteRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let book = state
        .library
        .lock()
        .await
        .add_note(&id, &req.content)
        .await
        .map_err(library_error)?;
    Ok((StatusCode::CREATED, Json(book)))
}

#[utoipa::path(
    delete,
    path = "/books/{id}/notes/{note_id}",
    params(
        ("id" = String, Path, description = "Book id"),
        ("note_id" = String, Path, description = "Note id")
    ),
    responses(
        (status = 200, description = "Book without the note"),
        (status = 404, description = "No such book")
    )
)]
pub async fn remove_note_handler(
    State(state): State<Arc<AppState>>,
    Path((id, note_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let book = state
        .library
        .lock()
        .await
        .remove_note(&id, &note_id)
        .await
        .map_err(library_error)?;
    Ok(Json(book))
}

/// Look a word up and save it to the book's vocabulary.
///
/// The lookup runs without holding the library lock. Only one lookup per book
/// may be in flight; a second one is refused with 409 until the first finishes.
#[utoipa::path(
    post,
    path = "/books/{id}/vocabulary",
    params(("id" = String, Path, description = "Book id")),
    request_body = VocabularyRequest,
    responses(
        (status = 201, description = "Book with the new entry first"),
        (status = 400, description = "Empty word"),
        (status = 404, description = "No such book"),
        (status = 409, description = "A lookup for this book is already running")
    )
)]
pub async fn add_vocabulary_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<VocabularyRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.word.trim().is_empty() {
        return Err(library_error(
            RepositoryError::Validation("word must not be empty".to_string()).into(),
        ));
    }
    if state.library.lock().await.book(&id).is_none() {
        return Err(book_not_found(&id));
    }

    let _in_flight = state.begin_lookup(&id).ok_or_else(|| {
        (
            StatusCode::CONFLICT,
            format!("A definition lookup is already running for book {}", id),
        )
    })?;

    info!(book_id = %id, word = %req.word, "Looking up definition");
    let definition = state.lookup.define(&req.word, req.context.as_deref()).await;

    let book = state
        .library
        .lock()
        .await
        .add_vocabulary(&id, &req.word, req.context.as_deref(), definition)
        .await
        .map_err(library_error)?;
    Ok((StatusCode::CREATED, Json(book)))
}

#[utoipa::path(
    delete,
    path = "/books/{id}/vocabulary/{vocab_id}",
    params(
        ("id" = String, Path, description = "Book id"),
        ("vocab_id" = String, Path, description = "Vocabulary entry id")
    ),
    responses(
        (status = 200, description = "Book without the entry"),
        (status = 404, description = "No such book")
    )
)]
pub async fn remove_vocabulary_handler(
    State(state): State<Arc<AppState>>,
    Path((id, vocab_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let book = state
        .library
        .lock()
        .await
        .remove_vocabulary(&id, &vocab_id)
        .await
        .map_err(library_error)?;
    Ok(Json(book))
}

//=========================================================================================
// Derived View Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/stats",
    responses((status = 200, description = "Library statistics and genre breakdown"))
)]
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let library = state.library.lock().await;
    Json(StatsResponse {
        stats: library.stats(),
        genres: views::genre_breakdown(library.books()),
    })
}

/// Everything the landing page shows in one round trip.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses((status = 200, description = "Stats, current reads and recent activity"))
)]
pub async fn dashboard_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let library = state.library.lock().await;
    let books = library.books();
    let body = serde_json::json!({
        "stats": library.stats(),
        "currentlyReading": views::currently_reading(books, CURRENTLY_READING_LIMIT),
        "recentVocabulary": views::recent_vocabulary(books, Some(RECENT_ACTIVITY_LIMIT)),
        "recentNotes": views::recent_notes(books, Some(RECENT_ACTIVITY_LIMIT)),
    });
    Json(body)
}

/// Every vocabulary entry across the library, newest first.
#[utoipa::path(
    get,
    path = "/vocabulary",
    params(LimitParams),
    responses((status = 200, description = "Vocabulary entries with their book"))
)]
pub async fn vocabulary_feed_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParams>,
) -> impl IntoResponse {
    let library = state.library.lock().await;
    let body = serde_json::json!(views::recent_vocabulary(library.books(), params.limit));
    Json(body)
}

#[utoipa::path(
    get,
    path = "/notes",
    params(LimitParams),
    responses((status = 200, description = "Notes with their book, newest first"))
)]
pub async fn notes_feed_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParams>,
) -> impl IntoResponse {
    let library = state.library.lock().await;
    let body = serde_json::json!(views::recent_notes(library.books(), params.limit));
    Json(body)
}

//=========================================================================================
// Profile Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/profile",
    responses((status = 200, description = "The reader profile with its avatar URL"))
)]
pub async fn get_profile_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let library = state.library.lock().await;
    Json(ProfileResponse::from(library.profile()))
}

#[utoipa::path(
    put,
    path = "/profile",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Profile replaced"),
        (status = 400, description = "Invalid goal, empty name or unknown avatar style")
    )
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProfileRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut library = state.library.lock().await;
    library
        .set_profile(req.into())
        .await
        .map_err(library_error)?;
    Ok(Json(ProfileResponse::from(library.profile())))
}

//=========================================================================================
// Vault Handlers
//=========================================================================================

/// Download the full library as a JSON vault. The same body serves clipboard sync.
#[utoipa::path(
    get,
    path = "/vault",
    responses((status = 200, description = "`{ books, profile }` document"))
)]
pub async fn export_vault_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let library = state.library.lock().await;
    let body = library.export_json().map_err(|e| {
        error!("Failed to serialize vault: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to export vault".to_string(),
        )
    })?;
    let disposition = format!("attachment; filename=\"{}\"", library.export_file_name());
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// Restore from a vault document. Present sections replace the current ones;
/// an invalid document changes nothing.
#[utoipa::path(
    post,
    path = "/vault",
    request_body(content = String, content_type = "application/json", description = "A vault document"),
    responses(
        (status = 200, description = "Vault restored", body = ImportResponse),
        (status = 422, description = "Not a valid vault document")
    )
)]
pub async fn import_vault_handler(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let summary = state
        .library
        .lock()
        .await
        .import(&body)
        .await
        .map_err(library_error)?;
    Ok(Json(ImportResponse {
        books_restored: summary.books_restored,
        profile_restored: summary.profile_restored,
    }))
}

/// Remove every book and reset the profile.
#[utoipa::path(
    delete,
    path = "/vault",
    responses((status = 204, description = "All data cleared"))
)]
pub async fn reset_vault_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .library
        .lock()
        .await
        .reset()
        .await
        .map_err(library_error)?;
    Ok(StatusCode::NO_CONTENT)
}
