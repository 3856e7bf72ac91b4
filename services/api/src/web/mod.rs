pub mod rest;
pub mod state;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use rest::*;
use state::AppState;

/// Builds the full REST router. The binary adds CORS and tracing layers on top.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/books", get(list_books_handler).post(create_book_handler))
        .route(
            "/books/{id}",
            get(get_book_handler)
                .patch(update_book_handler)
                .delete(delete_book_handler),
        )
        .route("/books/{id}/completion", post(toggle_completion_handler))
        .route("/books/{id}/rating", put(set_rating_handler))
        .route("/books/{id}/notes", post(add_note_handler))
        .route("/books/{id}/notes/{note_id}", delete(remove_note_handler))
        .route("/books/{id}/vocabulary", post(add_vocabulary_handler))
        .route(
            "/books/{id}/vocabulary/{vocab_id}",
            delete(remove_vocabulary_handler),
        )
        .route("/stats", get(stats_handler))
        .route("/dashboard", get(dashboard_handler))
        .route("/vocabulary", get(vocabulary_feed_handler))
        .route("/notes", get(notes_feed_handler))
        .route("/profile", get(get_profile_handler).put(update_profile_handler))
        .route(
            "/vault",
            get(export_vault_handler)
                .post(import_vault_handler)
                .delete(reset_vault_handler),
        )
        .with_state(state)
}
