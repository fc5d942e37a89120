//! # Intent-Klassifikatoren — Tilstand, Artefakter og Forudsigelse
//!
//! Pakker den trænede pipeline ind i en proces-bred komponent med
//! eksplicit livscyklus:
//!
//! ```text
//!            load() ok
//! unloaded ───────────────▶ loaded ◀──────────┐
//!    │  ▲                     │               │
//!    │  │ load() fejl         │ reload()      │ swap ok
//!    │  └────────────┐        ▼               │
//!    │               │    reloading ──────────┘
//!    └── predict() = None (advarsel, aldrig crash)
//! ```
//!
//! ## De Tre Artefakter
//!
//! | Fil | Indhold |
//! |-----|---------|
//! | `vectorizer.json` | TF-IDF-ordforråd og IDF-vægte |
//! | `intent_model.json` | logistisk regression (vægte + intercept) |
//! | `labels.json` | ordnet intent-liste (indeks → mærkat) |
//!
//! Alle tre bærer samme trænings-kørsels-uuid. Indlæsning af et sæt med
//! forskellige kørsels-id'er afvises som [`ArtifactError::RunMismatch`] —
//! en klassifikator i utakt med sit ordforråd giver meningsløse svar.
//!
//! ## Samtidighed
//!
//! Artefakterne ligger bag `Arc<RwLock<Option<Arc<…>>>>`. `predict()`
//! klonerne en `Arc` under read-låsen og arbejder derefter låsefrit;
//! `reload()` bytter hele trippelen med én write-låsning. Ingen læser
//! kan observere en halvt indlæst tilstand.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::LogisticRegression;
use super::preprocess::preprocess;
use super::vectorizer::TfidfVectorizer;

/// Fejl ved indlæsning af klassifikator-artefakter.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artefaktfilen {0} mangler")]
    Missing(PathBuf),
    #[error("artefaktfilen {path} kunne ikke læses: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("artefaktfilen {path} er defekt: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("artefakterne stammer fra forskellige træningskørsler")]
    RunMismatch,
}

/// Klassifikatorens livscyklustilstand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierState {
    /// Ingen artefakter i hukommelsen; forudsigelse giver `None`.
    Unloaded,
    /// Artefakter indlæst og klar.
    Loaded,
    /// En træning er i gang; den gamle tilstand betjener stadig kald.
    Training,
    /// Et artefaktskifte er i gang; læsere ser den gamle trippel.
    Reloading,
}

/// Resultatet af en forudsigelse: bedste intent, dens konfidens og den
/// fulde fordeling over alle kendte mærkater.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub intent: String,
    pub confidence: f64,
    pub distribution: Vec<(String, f64)>,
}

/// Én indlæst artefakt-trippel. Uforanderlig efter indlæsning; deles
/// via `Arc` så et skifte aldrig trækker tæppet væk under en læser.
#[derive(Debug)]
pub struct Artifacts {
    pub run_id: Uuid,
    pub vectorizer: TfidfVectorizer,
    pub model: LogisticRegression,
    pub labels: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct VectorizerFile {
    run_id: Uuid,
    vectorizer: TfidfVectorizer,
}

#[derive(Serialize, Deserialize)]
struct ModelFile {
    run_id: Uuid,
    model: LogisticRegression,
}

#[derive(Serialize, Deserialize)]
struct LabelsFile {
    run_id: Uuid,
    labels: Vec<String>,
}

/// Én linje i lavkonfidens-loggen.
#[derive(Serialize)]
struct LowConfidenceLine<'a> {
    text: &'a str,
    guess: &'a str,
    confidence: f64,
}

/// Den proces-brede klassifikator-singleton.
pub struct IntentClassifier {
    model_dir: PathBuf,
    low_confidence_log: PathBuf,
    state: RwLock<ClassifierState>,
    artifacts: RwLock<Option<Arc<Artifacts>>>,
}

impl IntentClassifier {
    /// Opretter en klassifikator i tilstanden `unloaded`.
    pub fn new(model_dir: impl Into<PathBuf>, low_confidence_log: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            low_confidence_log: low_confidence_log.into(),
            state: RwLock::new(ClassifierState::Unloaded),
            artifacts: RwLock::new(None),
        }
    }

    /// Nuværende livscyklustilstand.
    pub fn state(&self) -> ClassifierState {
        *self.state.read()
    }

    /// `true` når en artefakt-trippel er i hukommelsen.
    pub fn is_loaded(&self) -> bool {
        self.artifacts.read().is_some()
    }

    /// Den ordnede mærkatliste, hvis klassifikatoren er indlæst.
    pub fn labels(&self) -> Option<Vec<String>> {
        self.artifacts.read().as_ref().map(|a| a.labels.clone())
    }

    /// Mappen artefakterne læses fra og skrives til.
    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    // ─── Indlæsning og skifte ──────────────────────────────────

    /// Forsøger at indlæse artefakterne fra disk.
    ///
    /// Ved succes går tilstanden til `loaded`; ved fejl forbliver den
    /// `unloaded`, og fejlen gives videre til kalderen.
    pub fn load(&self) -> Result<(), ArtifactError> {
        let artifacts = Arc::new(read_artifacts(&self.model_dir)?);
        tracing::info!(
            run_id = %artifacts.run_id,
            labels = artifacts.labels.len(),
            features = artifacts.vectorizer.dim(),
            "Klassifikator-artefakter indlæst"
        );
        *self.artifacts.write() = Some(artifacts);
        *self.state.write() = ClassifierState::Loaded;
        Ok(())
    }

    /// Bytter den indlæste trippel ud med en frisk indlæsning fra disk.
    ///
    /// Skiftet er atomisk: læsere ser enten den gamle eller den nye
    /// trippel, aldrig en blanding. Fejler indlæsningen, forbliver den
    /// gamle trippel i kraft.
    pub fn reload(&self) -> Result<(), ArtifactError> {
        let previous_state = *self.state.read();
        *self.state.write() = ClassifierState::Reloading;
        match read_artifacts(&self.model_dir) {
            Ok(fresh) => {
                let fresh = Arc::new(fresh);
                tracing::info!(run_id = %fresh.run_id, "Klassifikator genindlæst");
                *self.artifacts.write() = Some(fresh);
                *self.state.write() = ClassifierState::Loaded;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Genindlæsning fejlede, beholder den gamle model");
                *self.state.write() = previous_state;
                Err(e)
            }
        }
    }

    /// Markerer at en træning er begyndt. Den indlæste trippel betjener
    /// fortsat forudsigelser imens.
    pub fn begin_training(&self) {
        *self.state.write() = ClassifierState::Training;
    }

    /// Afslutter træningstilstanden uden at røre artefakterne.
    /// Bruges efter en fejlet træning; en vellykket træning afsluttes
    /// med [`IntentClassifier::reload`].
    pub fn end_training(&self) {
        let loaded = self.artifacts.read().is_some();
        *self.state.write() = if loaded {
            ClassifierState::Loaded
        } else {
            ClassifierState::Unloaded
        };
    }

    // ─── Forudsigelse ──────────────────────────────────────────

    /// Klassificerer en ytring.
    ///
    /// Returnerer `None` hvis klassifikatoren er `unloaded` (advarsel i
    /// loggen) eller hvis forbehandlingen giver en tom tokenstrøm
    /// (ytringen logges til lavkonfidens-loggen). Ellers returneres
    /// altid en [`Prediction`]; er konfidensen under `threshold`,
    /// logges ytringen, og kalderen forventes at behandle svaret som
    /// "ukendt".
    pub fn predict(&self, utterance: &str, threshold: f64) -> Option<Prediction> {
        let artifacts = match self.artifacts.read().as_ref() {
            Some(a) => Arc::clone(a),
            None => {
                tracing::warn!(utterance, "Forudsigelse på uindlæst klassifikator");
                return None;
            }
        };

        let tokens = preprocess(utterance);
        if tokens.is_empty() {
            tracing::debug!(utterance, "Tom tokenstrøm efter forbehandling");
            self.log_low_confidence(utterance, "unknown", 0.0);
            return None;
        }

        let features = artifacts.vectorizer.transform(&tokens);
        let probs = artifacts.model.predict_proba(&features);

        // Intet overlap med ordforrådet: klassifikatoren har bogstaveligt
        // talt intet at have sit svar i. Svar "unknown" med konfidens 0
        // frem for at gætte ud fra interceptleddene alene.
        if features.iter().all(|&v| v == 0.0) {
            tracing::debug!(utterance, "Ingen featuredækning i ordforrådet");
            self.log_low_confidence(utterance, "unknown", 0.0);
            return Some(Prediction {
                intent: "unknown".to_string(),
                confidence: 0.0,
                distribution: artifacts
                    .labels
                    .iter()
                    .cloned()
                    .zip(probs.iter().copied())
                    .collect(),
            });
        }

        // Argmax med først-vinder ved lighed — mærkatlistens rækkefølge
        // er bindende.
        let mut best = 0;
        for (i, &p) in probs.iter().enumerate() {
            if p > probs[best] {
                best = i;
            }
        }
        let intent = artifacts.labels[best].clone();
        let confidence = probs[best];
        let distribution = artifacts
            .labels
            .iter()
            .cloned()
            .zip(probs.iter().copied())
            .collect();

        if confidence < threshold {
            tracing::info!(utterance, guess = %intent, confidence, "Konfidens under tærsklen");
            self.log_low_confidence(utterance, &intent, confidence);
        }

        Some(Prediction {
            intent,
            confidence,
            distribution,
        })
    }

    /// Tilføjer en linje til lavkonfidens-loggen (NDJSON). Fejl logges
    /// og sluges — loggen er kuratering, ikke kontrakt.
    fn log_low_confidence(&self, text: &str, guess: &str, confidence: f64) {
        let line = LowConfidenceLine {
            text,
            guess,
            confidence,
        };
        let result = (|| -> std::io::Result<()> {
            if let Some(parent) = self.low_confidence_log.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.low_confidence_log)?;
            let json = serde_json::to_string(&line)?;
            writeln!(file, "{json}")?;
            Ok(())
        })();
        if let Err(e) = result {
            tracing::error!(error = %e, "Kunne ikke skrive til lavkonfidens-loggen");
        }
    }
}

/// Læser og validerer de tre artefaktfiler.
fn read_artifacts(dir: &Path) -> Result<Artifacts, ArtifactError> {
    let vec_file: VectorizerFile = read_json(&dir.join("vectorizer.json"))?;
    let model_file: ModelFile = read_json(&dir.join("intent_model.json"))?;
    let labels_file: LabelsFile = read_json(&dir.join("labels.json"))?;

    if vec_file.run_id != model_file.run_id || model_file.run_id != labels_file.run_id {
        return Err(ArtifactError::RunMismatch);
    }

    let mut vectorizer = vec_file.vectorizer;
    vectorizer.rebuild_index();

    Ok(Artifacts {
        run_id: vec_file.run_id,
        vectorizer,
        model: model_file.model,
        labels: labels_file.labels,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::Missing(path.to_path_buf()));
    }
    let json = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| ArtifactError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Skriver de tre artefakter atomisk (temp-fil + rename per fil) med et
/// fælles kørsels-id. Kaldes af træneren efter en vellykket kørsel.
pub fn write_artifacts(dir: &Path, artifacts: &Artifacts) -> anyhow::Result<()> {
    use anyhow::Context as _;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Kunne ikke oprette modelmappen {}", dir.display()))?;

    write_json(
        &dir.join("vectorizer.json"),
        &VectorizerFile {
            run_id: artifacts.run_id,
            vectorizer: artifacts.vectorizer.clone(),
        },
    )?;
    write_json(
        &dir.join("intent_model.json"),
        &ModelFile {
            run_id: artifacts.run_id,
            model: artifacts.model.clone(),
        },
    )?;
    write_json(
        &dir.join("labels.json"),
        &LabelsFile {
            run_id: artifacts.run_id,
            labels: artifacts.labels.clone(),
        },
    )?;
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    use anyhow::Context as _;

    let json = serde_json::to_string(value).context("Kunne ikke serialisere artefakt")?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).with_context(|| format!("Kunne ikke skrive {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Kunne ikke omdøbe til {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlu::trainer;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("jarvis-model-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Lille tokorpus der kan trænes deterministisk.
    fn train_into(dir: &Path) {
        let texts: Vec<String> = [
            "hvad er klokken",
            "hvad er klokken lige nu",
            "fortæl mig hvad klokken er",
            "hvad viser uret",
            "hvad er uret",
            "fortæl mig en joke",
            "fortæl en vittighed",
            "fortæl en god joke",
            "kender du en joke",
            "har du en vittighed",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let labels: Vec<String> = ["get_time"; 5]
            .iter()
            .chain(["tell_joke"; 5].iter())
            .map(|s| s.to_string())
            .collect();
        let artifacts = trainer::train(&texts, &labels).unwrap();
        write_artifacts(dir, &artifacts).unwrap();
    }

    // ─── tilstandsmaskinen ─────────────────────────────────────

    #[test]
    fn starts_unloaded_and_predicts_none() {
        let dir = temp_dir();
        let c = IntentClassifier::new(&dir, dir.join("lav.ndjson"));
        assert_eq!(c.state(), ClassifierState::Unloaded);
        assert!(c.predict("hej", 0.55).is_none());
    }

    #[test]
    fn load_transitions_to_loaded() {
        let dir = temp_dir();
        train_into(&dir);
        let c = IntentClassifier::new(&dir, dir.join("lav.ndjson"));
        c.load().unwrap();
        assert_eq!(c.state(), ClassifierState::Loaded);
        assert!(c.is_loaded());
    }

    #[test]
    fn failed_load_stays_unloaded() {
        let dir = temp_dir();
        let c = IntentClassifier::new(&dir, dir.join("lav.ndjson"));
        assert!(matches!(c.load(), Err(ArtifactError::Missing(_))));
        assert_eq!(c.state(), ClassifierState::Unloaded);
    }

    #[test]
    fn failed_reload_keeps_old_artifacts() {
        let dir = temp_dir();
        train_into(&dir);
        let c = IntentClassifier::new(&dir, dir.join("lav.ndjson"));
        c.load().unwrap();
        // Fjern én artefaktfil så genindlæsningen fejler.
        std::fs::remove_file(dir.join("labels.json")).unwrap();
        assert!(c.reload().is_err());
        assert_eq!(c.state(), ClassifierState::Loaded);
        assert!(c.predict("hvad er klokken", 0.55).is_some());
    }

    // ─── artefakt-lukning ──────────────────────────────────────

    #[test]
    fn run_id_mismatch_is_rejected() {
        let dir = temp_dir();
        train_into(&dir);
        // Ombyt labels.json med en fil fra en "anden kørsel".
        let other = LabelsFile {
            run_id: Uuid::new_v4(),
            labels: vec!["get_time".into(), "tell_joke".into()],
        };
        std::fs::write(
            dir.join("labels.json"),
            serde_json::to_string(&other).unwrap(),
        )
        .unwrap();
        let c = IntentClassifier::new(&dir, dir.join("lav.ndjson"));
        assert!(matches!(c.load(), Err(ArtifactError::RunMismatch)));
        assert_eq!(c.state(), ClassifierState::Unloaded);
    }

    // ─── forudsigelse ──────────────────────────────────────────

    #[test]
    fn predicts_known_intent() {
        let dir = temp_dir();
        train_into(&dir);
        let c = IntentClassifier::new(&dir, dir.join("lav.ndjson"));
        c.load().unwrap();
        let p = c.predict("hvad er klokken", 0.55).unwrap();
        assert_eq!(p.intent, "get_time");
        assert!(p.confidence > 0.5, "konfidens var {}", p.confidence);
    }

    #[test]
    fn distribution_sums_to_one_and_labels_are_closed() {
        let dir = temp_dir();
        train_into(&dir);
        let c = IntentClassifier::new(&dir, dir.join("lav.ndjson"));
        c.load().unwrap();
        let labels = c.labels().unwrap();
        let p = c.predict("fortæl en vittighed", 0.55).unwrap();
        let sum: f64 = p.distribution.iter().map(|(_, v)| v).sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(labels.contains(&p.intent));
    }

    #[test]
    fn empty_tokens_logged_and_none() {
        let dir = temp_dir();
        train_into(&dir);
        let log = dir.join("lav.ndjson");
        let c = IntentClassifier::new(&dir, &log);
        c.load().unwrap();
        assert!(c.predict("?!", 0.55).is_none());
        let content = std::fs::read_to_string(&log).unwrap();
        let line: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(line["text"], "?!");
        assert_eq!(line["guess"], "unknown");
    }

    #[test]
    fn low_confidence_appends_log_line() {
        let dir = temp_dir();
        train_into(&dir);
        let log = dir.join("lav.ndjson");
        let c = IntentClassifier::new(&dir, &log);
        c.load().unwrap();
        // Ord uden overlap med korpusset → "unknown" med konfidens 0.
        let p = c.predict("solskin regnbue", 0.99).unwrap();
        assert_eq!(p.intent, "unknown");
        assert!(p.confidence < 0.99);
        let content = std::fs::read_to_string(&log).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
