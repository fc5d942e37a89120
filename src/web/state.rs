//! # Webstaten — Delt Tilstand for Alle Handlers
//!
//! ## Tofaset Initialisering
//!
//! ```text
//! Fase 1 (straks):          Fase 2 (baggrund):
//! ┌────────────────┐        ┌──────────────────┐
//! │ AppState       │        │ ModelReady       │
//! │  ├── events_tx✓│        │  ├── orchestrator│
//! │  └── model: ∅  │◀───────│  └── classifier  │
//! └────────────────┘        └──────────────────┘
//!     ↓ webserver               ↓ første træning
//!   tilgængelig               model klar
//! ```
//!
//! Webserveren svarer fra første sekund; indtil `OnceLock`'en er fyldt,
//! svarer chatten med en ventebesked, og `/status` melder `ready: false`.

use std::sync::{Arc, OnceLock};

use tokio::sync::{broadcast, Mutex};

use crate::nlu::IntentClassifier;
use crate::orchestrator::Orchestrator;
use crate::web::events::SystemEvent;

/// Den fulde pipeline, initialiseret i baggrunden.
///
/// Orkestratoren er bag en `tokio::sync::Mutex` — at tage låsen er det
/// der serialiserer samtalens ture.
pub struct ModelReady {
    /// Dialogorkestratoren (eksklusiv adgang, én tur ad gangen).
    pub orchestrator: Mutex<Orchestrator>,
    /// Klassifikatorsingletonen, delt med gentræningsopgaven.
    pub classifier: Arc<IntentClassifier>,
}

/// Delt Axum-tilstand.
#[derive(Clone)]
pub struct AppState {
    /// Pipelinen, fyldt i baggrunden via `OnceLock::set()`.
    pub model: Arc<OnceLock<ModelReady>>,
    /// Broadcast-kanal for SSE-hændelser.
    pub events_tx: Arc<broadcast::Sender<SystemEvent>>,
}
