//! # HTTP-Handlers — Chatskallens Endpoints
//!
//! Hver offentlig funktion er en Axum-handler, koblet til en rute i
//! [`super::create_router()`]. Chatflowet følger HTMX-fragment-mønstret:
//! POST `/chat` returnerer et HTML-fragment, som HTMX injicerer i
//! beskedlisten via `hx-swap="beforeend"`.
//!
//! | Handler | Metode | Retur | Formål |
//! |---------|--------|-------|--------|
//! | `index` | GET | HTML | chatsiden |
//! | `model_status` | GET | JSON | readiness-polling |
//! | `sse_events` | GET | SSE | trænings- og indlæringsfeed |
//! | `chat` | POST | fragment | én samtaletur |
//! | `reset` | POST | fragment | nulstil samtalen |
//!
//! ## Model-klar-garde
//!
//! Indtil den første træning er færdig, er `state.model.get()` tom, og
//! chatten svarer med en ventebesked i stedet for at fejle.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::Html;
use axum::Json;
use futures_util::stream::StreamExt;
use maud::html;
use tokio_stream::wrappers::BroadcastStream;

use super::state::AppState;
use super::templates;
use crate::nlu::ClassifierState;
use crate::web::events::SystemEvent;

/// Svaret fra `/status`.
#[derive(serde::Serialize)]
pub struct StatusResponse {
    /// `true` når første træning er færdig og orkestratoren er klar.
    pub ready: bool,
    /// Klassifikatorens livscyklustilstand som tekst.
    pub classifier: String,
}

/// Chatformularens felter.
#[derive(serde::Deserialize)]
pub struct ChatForm {
    /// Brugerens ytring.
    pub message: String,
}

fn markup_to_html(m: maud::Markup) -> Html<String> {
    Html(m.into_string())
}

/// GET `/` — chatsiden.
pub async fn index() -> Html<String> {
    markup_to_html(templates::full_page())
}

/// GET `/status` — readiness til frontendens polling.
pub async fn model_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let classifier = match state.model.get() {
        Some(model) => match model.classifier.state() {
            ClassifierState::Unloaded => "unloaded",
            ClassifierState::Loaded => "loaded",
            ClassifierState::Training => "training",
            ClassifierState::Reloading => "reloading",
        },
        None => "unloaded",
    };
    Json(StatusResponse {
        ready: state.model.get().is_some(),
        classifier: classifier.to_string(),
    })
}

/// GET `/events` — SSE-strøm af systemhændelser.
///
/// Keep-alive hvert 15. sekund holder forbindelsen i live gennem
/// proxyer; bagudhængende abonnenter mister stille de ældste beskeder.
pub async fn sse_events(
    State(state): State<AppState>,
) -> Sse<impl futures_util::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = state.events_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => {
                let data = serde_json::to_string(&event).ok()?;
                Some(Ok(SseEvent::default().data(data)))
            }
            Err(_) => None,
        }
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// POST `/chat` — én samtaletur.
///
/// ```text
/// 1. Læs feltet "message"
/// 2. Model klar? Ellers: ventebesked
/// 3. Tag orkestratorlåsen og kør turen
/// 4. Var det en bekræftet afklaring? → SSE-hændelse
/// 5. Render bruger- + systemfragment
/// ```
pub async fn chat(
    State(state): State<AppState>,
    axum::Form(form): axum::Form<ChatForm>,
) -> Html<String> {
    let user_text = form.message.trim().to_string();
    if user_text.is_empty() {
        return markup_to_html(html! {});
    }

    let Some(model) = state.model.get() else {
        return markup_to_html(templates::loading_message(&user_text));
    };

    let turn = {
        let mut orchestrator = model.orchestrator.lock().await;
        orchestrator.handle_utterance(&user_text).await
    };

    // Bekræftede afklaringer vises i hændelsesfeeden.
    if let Some(intent) = turn.intent.strip_prefix("confirmed_") {
        let _ = state.events_tx.send(SystemEvent::ExampleConfirmed {
            intent: intent.to_string(),
            utterance: user_text.clone(),
        });
    }

    markup_to_html(html! {
        (templates::user_message(&user_text))
        (templates::system_message(&turn.reply, &turn.intent, turn.confidence))
    })
}

/// POST `/reset` — nulstiller samtalen (historik og felter).
pub async fn reset(State(state): State<AppState>) -> Html<String> {
    if let Some(model) = state.model.get() {
        model.orchestrator.lock().await.reset();
    }
    markup_to_html(templates::reset_message())
}
