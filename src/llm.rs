//! # LLM-Samarbejdspartner — Sidste Udvej i Pipelinen
//!
//! Sprogmodellen er en ekstern samarbejdspartner: kernen definerer kun
//! kontrakten (tilgængelig? + generér) og falder tilbage på en fast
//! dansk frase når den mangler eller fejler. Hvordan teksten genereres,
//! er bevidst udenfor kernens ansvar.

use anyhow::Result;
use futures_util::future::BoxFuture;

use crate::context::Turn;

/// Kontrakten for LLM-fallback.
///
/// `generate` modtager ytringen og et vindue af de seneste ture, så
/// modellen kan svare i samtalens kontekst. Fejl signaleres med `Err`
/// eller ved at `is_available` svarer `false`; orkestratoren falder i
/// begge tilfælde tilbage på den faste frase.
pub trait LanguageModel: Send + Sync {
    /// Er generatoren klar til at tage imod kald?
    fn is_available(&self) -> bool;

    /// Genererer et svar til ytringen med samtalehistorik som kontekst.
    fn generate<'a>(&'a self, utterance: &'a str, history: &'a [Turn]) -> BoxFuture<'a, Result<String>>;
}

/// Standarden når ingen sprogmodel er koblet til: aldrig tilgængelig.
#[derive(Debug, Default)]
pub struct NoLanguageModel;

impl LanguageModel for NoLanguageModel {
    fn is_available(&self) -> bool {
        false
    }

    fn generate<'a>(&'a self, _utterance: &'a str, _history: &'a [Turn]) -> BoxFuture<'a, Result<String>> {
        Box::pin(async { anyhow::bail!("Ingen sprogmodel er koblet til") })
    }
}

#[cfg(test)]
pub mod testing {
    //! Testdubler til orkestrator-tests.

    use super::*;

    /// Svarer altid med en fast streng.
    pub struct ScriptedModel(pub String);

    impl LanguageModel for ScriptedModel {
        fn is_available(&self) -> bool {
            true
        }

        fn generate<'a>(&'a self, _utterance: &'a str, _history: &'a [Turn]) -> BoxFuture<'a, Result<String>> {
            let reply = self.0.clone();
            Box::pin(async move { Ok(reply) })
        }
    }

    /// Melder sig tilgængelig men fejler ved hvert kald.
    pub struct FailingModel;

    impl LanguageModel for FailingModel {
        fn is_available(&self) -> bool {
            true
        }

        fn generate<'a>(&'a self, _utterance: &'a str, _history: &'a [Turn]) -> BoxFuture<'a, Result<String>> {
            Box::pin(async { anyhow::bail!("Generatoren fejlede") })
        }
    }
}
