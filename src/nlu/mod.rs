//! # Modul NLU — Dansk Sprogforståelse
//!
//! Den statistiske halvdel af kommandoopløsningen:
//!
//! ```text
//! ytring ──▶ preprocess ──▶ vectorizer ──▶ model ──▶ Prediction
//!            (tokens)       (TF-IDF)       (softmax)  {intent, konfidens,
//!                                                      fordeling}
//! ```
//!
//! ## Submoduler
//!
//! | Modul | Ansvar |
//! |-------|--------|
//! | [`preprocess`] | dansk tokenisering og stopord |
//! | [`vectorizer`] | TF-IDF over uni- og bigrammer |
//! | [`model`] | multinomial logistisk regression |
//! | [`classifier`] | livscyklus, artefakter, forudsigelse |
//! | [`trainer`] | korpus → artefakt-trippel med holdout-metrikker |
//! | [`seed`] | indbygget dansk startkorpus |

pub mod classifier;
pub mod model;
pub mod preprocess;
pub mod seed;
pub mod trainer;
pub mod vectorizer;

pub use classifier::{ClassifierState, IntentClassifier, Prediction};
