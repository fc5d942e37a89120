//! # Kontekstlager — Samtalens Korttidshukommelse
//!
//! Persisteret, afgrænset samtalehukommelse for orkestratoren:
//!
//! | Felt | Indhold | Regel |
//! |------|---------|-------|
//! | `conversation_history` | seneste ture | maks. 20, ældste smides først |
//! | `expected_response` | ventet svartype (f.eks. ja/nej) | udløber efter 30 s, høstes dovent |
//! | `active_context` | aktivt flerturs-emne | intet automatisk udløb |
//!
//! ## Persistens
//!
//! Hele lageret skrives som pretty-printed JSON til `data/context.json`
//! efter hver mutation. Fejler skrivningen, logges den, og tilstanden i
//! hukommelsen forbliver konsistent — samtalen fortsætter.
//!
//! ## Samtidighed
//!
//! Lageret ejes udelukkende af orkestratoren, som selv er serialiseret
//! bag en `tokio::sync::Mutex`. Der er derfor ingen intern låsning.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Én samtaletur: brugerens ytring, systemets svar og den afgjorte intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Brugerens ytring.
    pub user: String,
    /// Systemets svar.
    pub jarvis: String,
    /// Den afgjorte intent for turen.
    pub intent: String,
    /// Klassifikatorkonfidens, hvis en klassifikation indgik.
    pub confidence: Option<f64>,
    /// Unix-tidsstempel (sekunder) for turen.
    pub timestamp: i64,
}

/// Den lukkede mængde af ventede svartyper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedKind {
    /// Næste tur forventes at være et ja/nej-svar.
    YesNo,
}

/// Det forventede-svar-felt: type, sættetidspunkt og metadata.
///
/// Friskhed er en ren funktion af `nu − set_at`; udløbne felter
/// behandles som fraværende og ryddes ved næste læsning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectedResponse {
    /// Svartypen der ventes på.
    #[serde(rename = "type")]
    pub kind: ExpectedKind,
    /// Unix-tidsstempel (sekunder) for hvornår feltet blev sat.
    pub set_at: i64,
    /// Frit metadata-objekt, f.eks. `{original_intent, original_text}`.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Aktivt flerturs-emne. Kun ét ad gangen; intet automatisk udløb.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveContext {
    /// Emnets navn, f.eks. `note_taking`.
    pub name: String,
    /// Frit dataobjekt knyttet til emnet.
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
    /// Unix-tidsstempel (sekunder) for hvornår emnet blev sat.
    pub set_at: i64,
}

/// Diskformatet for `data/context.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ContextDocument {
    #[serde(default)]
    conversation_history: Vec<Turn>,
    #[serde(default)]
    active_context: Option<ActiveContext>,
    #[serde(default)]
    expected_response: Option<ExpectedResponse>,
    session_start: i64,
    last_interaction: i64,
}

/// Kontekstlageret med fast filsti.
#[derive(Debug)]
pub struct ContextStore {
    path: PathBuf,
    doc: ContextDocument,
    max_history: usize,
    ttl: Duration,
}

impl ContextStore {
    /// Indlæser konteksten fra disk, eller starter en frisk session hvis
    /// filen mangler eller er defekt.
    pub fn load(path: impl Into<PathBuf>, max_history: usize, ttl: Duration) -> Self {
        let path = path.into();
        let now = Utc::now().timestamp();
        let doc = match std::fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str::<ContextDocument>(&json) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Defekt kontekstfil, starter frisk session");
                    Self::fresh_document(now)
                }
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "Ingen kontekstfil fundet, starter frisk session");
                Self::fresh_document(now)
            }
        };
        Self {
            path,
            doc,
            max_history,
            ttl,
        }
    }

    fn fresh_document(now: i64) -> ContextDocument {
        ContextDocument {
            conversation_history: Vec::new(),
            active_context: None,
            expected_response: None,
            session_start: now,
            last_interaction: now,
        }
    }

    // ─── Samtalehistorik ───────────────────────────────────────

    /// Tilføjer en tur og beskærer historikken til maks. længde.
    pub fn add_interaction(
        &mut self,
        user: &str,
        reply: &str,
        intent: &str,
        confidence: Option<f64>,
    ) {
        let now = Utc::now().timestamp();
        self.doc.conversation_history.push(Turn {
            user: user.to_string(),
            jarvis: reply.to_string(),
            intent: intent.to_string(),
            confidence,
            timestamp: now,
        });
        while self.doc.conversation_history.len() > self.max_history {
            self.doc.conversation_history.remove(0);
        }
        self.doc.last_interaction = now;
        self.flush_logged();
    }

    /// Seneste `n` ture, ældste først.
    pub fn get_conversation_history(&self, n: usize) -> &[Turn] {
        let len = self.doc.conversation_history.len();
        &self.doc.conversation_history[len.saturating_sub(n)..]
    }

    /// Brugerens seneste ytring, hvis der er nogen.
    pub fn get_last_user_input(&self) -> Option<&str> {
        self.doc
            .conversation_history
            .last()
            .map(|t| t.user.as_str())
    }

    /// Systemets seneste svar, hvis der er noget.
    pub fn get_last_response(&self) -> Option<&str> {
        self.doc
            .conversation_history
            .last()
            .map(|t| t.jarvis.as_str())
    }

    // ─── Forventet svar ────────────────────────────────────────

    /// Sætter det forventede-svar-felt. Kun ét kan være aktivt ad gangen;
    /// et eksisterende felt overskrives.
    pub fn set_expected_response(
        &mut self,
        kind: ExpectedKind,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) {
        self.doc.expected_response = Some(ExpectedResponse {
            kind,
            set_at: Utc::now().timestamp(),
            metadata,
        });
        self.flush_logged();
    }

    /// Rydder det forventede-svar-felt.
    pub fn clear_expected_response(&mut self) {
        if self.doc.expected_response.take().is_some() {
            self.flush_logged();
        }
    }

    /// `true` hvis der ventes på et svar, og feltet stadig er friskt.
    /// Et udløbet felt ryddes som bivirkning.
    pub fn is_awaiting_response(&mut self) -> bool {
        self.reap_expired();
        self.doc.expected_response.is_some()
    }

    /// Den ventede svartype, hvis feltet er sat og friskt.
    pub fn get_expected_response_type(&mut self) -> Option<ExpectedKind> {
        self.reap_expired();
        self.doc.expected_response.as_ref().map(|e| e.kind)
    }

    /// Metadata for det ventede svar, hvis feltet er sat og friskt.
    pub fn get_expected_response_metadata(
        &mut self,
    ) -> Option<serde_json::Map<String, serde_json::Value>> {
        self.reap_expired();
        self.doc
            .expected_response
            .as_ref()
            .map(|e| e.metadata.clone())
    }

    /// Doven høst: et felt ældre end TTL'en behandles som fraværende.
    fn reap_expired(&mut self) {
        let Some(exp) = &self.doc.expected_response else {
            return;
        };
        let age = Utc::now().timestamp() - exp.set_at;
        if age > self.ttl.as_secs() as i64 {
            tracing::debug!(age_s = age, "Forventet svar udløbet, rydder feltet");
            self.doc.expected_response = None;
            self.flush_logged();
        }
    }

    // ─── Aktivt emne ───────────────────────────────────────────

    /// Sætter det aktive emne; et eksisterende emne overskrives.
    pub fn set_active_context(
        &mut self,
        name: &str,
        data: serde_json::Map<String, serde_json::Value>,
    ) {
        self.doc.active_context = Some(ActiveContext {
            name: name.to_string(),
            data,
            set_at: Utc::now().timestamp(),
        });
        self.flush_logged();
    }

    /// Det aktive emne, hvis der er sat et.
    pub fn get_active_context(&self) -> Option<&ActiveContext> {
        self.doc.active_context.as_ref()
    }

    /// Rydder det aktive emne.
    pub fn clear_active_context(&mut self) {
        if self.doc.active_context.take().is_some() {
            self.flush_logged();
        }
    }

    // ─── Session ───────────────────────────────────────────────

    /// Nulstiller hele sessionen: historik, felter og tidsstempler.
    pub fn reset_session(&mut self) {
        self.doc = Self::fresh_document(Utc::now().timestamp());
        self.flush_logged();
    }

    // ─── Persistens ────────────────────────────────────────────

    /// Skriver konteksten til disk. Fejl logges; hukommelsen er allerede
    /// opdateret og forbliver den autoritative tilstand.
    fn flush_logged(&self) {
        if let Err(e) = self.flush() {
            tracing::error!(error = %e, "Kunne ikke gemme kontekstfilen");
        }
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Kunne ikke oprette mappen {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.doc)
            .context("Kunne ikke serialisere konteksten")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Kunne ikke skrive {}", self.path.display()))?;
        Ok(())
    }

    /// Testhjælper: flytter sættetidspunktet bagud, som om feltet blev
    /// sat for `secs` sekunder siden.
    #[cfg(test)]
    pub(crate) fn backdate_expected_response(&mut self, secs: i64) {
        if let Some(exp) = self.doc.expected_response.as_mut() {
            exp.set_at -= secs;
        }
    }
}
