//! # Modul Web — Chatskallen
//!
//! Hele weblaget, bygget med **Axum** + **HTMX** + **Maud** + **SSE**.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Browser (HTMX + SSE)                         │
//! ├──────────────────────────────────────────────┤
//! │ Axum Router (dette modul)                    │
//! │  ├── GET  /        → chatsiden (Maud)        │
//! │  ├── GET  /status  → JSON: model klar?       │
//! │  ├── GET  /events  → SSE-strøm (hændelser)   │
//! │  ├── POST /chat    → HTMX-fragment (én tur)  │
//! │  └── POST /reset   → HTMX-fragment           │
//! ├──────────────────────────────────────────────┤
//! │ tower_http::TraceLayer (request-logging)     │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Submoduler
//!
//! | Modul | Ansvar |
//! |-------|--------|
//! | [`state`] | delt tilstand (`AppState`, `ModelReady`) |
//! | [`events`] | SSE-hændelsesenum |
//! | [`handlers`] | Axum-handlers for hver rute |
//! | [`templates`] | Maud-skabeloner |

pub mod events;
pub mod handlers;
pub mod state;
pub mod templates;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Bygger routeren med alle ruter og request-logging.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/status", get(handlers::model_status))
        .route("/events", get(handlers::sse_events))
        .route("/chat", post(handlers::chat))
        .route("/reset", post(handlers::reset))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
