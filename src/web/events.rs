//! # SSE-Hændelser — Systemets Livstegn
//!
//! Definerer [`SystemEvent`] — hændelserne der sendes til frontenden
//! via Server-Sent Events, så skallen kan vise træningsstatus og
//! indlæring i realtid.
//!
//! ## Hændelsernes Livscyklus
//!
//! ```text
//! TrainingStarted → TrainingFinished
//!                eller → TrainingFailed
//!
//! ExampleConfirmed (uafhængigt, ved hver bekræftet afklaring)
//! ```
//!
//! ## Serialisering
//!
//! `#[serde(tag = "type")]` giver JSON med diskriminator:
//!
//! ```json
//! { "type": "TrainingFinished", "examples": 347, "labels": 11 }
//! ```

use serde::Serialize;

/// Hændelse sendt til frontenden via SSE.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum SystemEvent {
    /// En gentræning er gået i gang.
    TrainingStarted {
        /// Hvad der udløste den: `"interval"` eller `"confirmations"`.
        trigger: String,
    },

    /// Gentræningen lykkedes, og de nye artefakter er taget i brug.
    TrainingFinished {
        /// Antal træningsytringer i korpusset.
        examples: usize,
        /// Antal intents i mærkatlisten.
        labels: usize,
    },

    /// Gentræningen fejlede; den tidligere model svarer stadig.
    TrainingFailed {
        /// Læsbar fejlbesked.
        message: String,
    },

    /// Brugeren bekræftede en afklaring, og korpusset voksede.
    ExampleConfirmed {
        /// Intent som ytringen blev bekræftet under.
        intent: String,
        /// Den bekræftede ytring.
        utterance: String,
    },
}
