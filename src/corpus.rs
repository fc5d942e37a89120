//! # Træningskorpus — Kilden til Klassifikatorens Viden
//!
//! Ejer det mærkede datasæt som intent-klassifikatoren trænes fra.
//! Korpusset er en append-only JSON-fil med formatet:
//!
//! ```json
//! {
//!   "intents": [
//!     { "tag": "greeting", "patterns": ["hej", "goddag"], "responses": ["Hej!"] }
//!   ]
//! }
//! ```
//!
//! ## Invarianter
//!
//! - Inden for én intent ignoreres dublerede ytringer stille (nøjagtig
//!   strenglighed, versalfølsom).
//! - Samme ytring må gerne optræde under flere intents — korpusset
//!   dedupleres aldrig på tværs.
//! - Ukendte topniveau-nøgler i filen bevares ved genskrivning.
//!
//! ## Atomicitet
//!
//! Hver vellykket `append` skyller korpusset til disk via
//! write-temp-then-rename. Fejler skrivningen, rulles den interne
//! tilstand tilbage, og fejlen gives videre til kalderen.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Én intent-gruppe: tag, træningsytringer og svarfraser.
///
/// `responses` forbruges ikke af klassifikatoren selv, men bruges som
/// svarpulje af handlingstabellen for intents uden dedikeret handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentGroup {
    /// Intent-mærkat, f.eks. `get_time`.
    pub tag: String,
    /// Træningsytringer for denne intent.
    pub patterns: Vec<String>,
    /// Danske svarfraser (bevares, roteres af handlingstabellen).
    #[serde(default)]
    pub responses: Vec<String>,
}

/// Selve korpusdokumentet som det ligger på disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CorpusDocument {
    #[serde(default)]
    intents: Vec<IntentGroup>,
    /// Ukendte topniveau-nøgler — tolereres og bevares ved genskrivning.
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

/// Træningskorpus med fast filsti.
///
/// Orkestratoren er den eneste skriver (afklaringsbekræftelser);
/// gentræningsopgaven læser via [`TrainingCorpus::load_all`].
#[derive(Debug)]
pub struct TrainingCorpus {
    path: PathBuf,
    doc: CorpusDocument,
}

impl TrainingCorpus {
    /// Indlæser korpusset fra disk.
    ///
    /// Manglende eller defekt fil giver et tomt korpus plus en advarsel
    /// i loggen — aldrig en fejl. Første `append` opretter en gyldig fil.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let doc = match std::fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str::<CorpusDocument>(&json) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Defekt korpusfil, starter med tomt korpus");
                    CorpusDocument::default()
                }
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "Ingen korpusfil fundet, starter med tomt korpus");
                CorpusDocument::default()
            }
        };
        Self { path, doc }
    }

    /// Opretter et korpus fra eksisterende grupper og skriver det til disk.
    ///
    /// Bruges ved første start til at så korpusset med det indbyggede
    /// danske datasæt.
    pub fn seed(path: impl Into<PathBuf>, groups: Vec<IntentGroup>) -> Result<Self> {
        let corpus = Self {
            path: path.into(),
            doc: CorpusDocument {
                intents: groups,
                extra: serde_json::Map::new(),
            },
        };
        corpus.flush()?;
        Ok(corpus)
    }

    /// `true` hvis korpusfilen findes på disk.
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    /// Tilføjer en ytring under en intent og skyller til disk.
    ///
    /// Opretter intent-gruppen hvis den ikke findes (med tom svarliste).
    /// Returnerer `true` hvis ytringen blev tilføjet, `false` hvis parret
    /// allerede fandtes (så skrives der heller ikke til disk).
    ///
    /// ## Fejl
    ///
    /// Ved I/O-fejl rulles den interne tilstand tilbage, så hukommelse
    /// og disk forbliver konsistente.
    pub fn append(&mut self, intent: &str, utterance: &str) -> Result<bool> {
        let group_idx = self.doc.intents.iter().position(|g| g.tag == intent);
        let created_group = group_idx.is_none();
        let idx = match group_idx {
            Some(i) => i,
            None => {
                self.doc.intents.push(IntentGroup {
                    tag: intent.to_string(),
                    patterns: Vec::new(),
                    responses: Vec::new(),
                });
                self.doc.intents.len() - 1
            }
        };

        if self.doc.intents[idx].patterns.iter().any(|p| p == utterance) {
            // Dublet inden for samme intent — ignoreres stille.
            if created_group {
                self.doc.intents.pop();
            }
            return Ok(false);
        }

        self.doc.intents[idx].patterns.push(utterance.to_string());

        if let Err(e) = self.flush() {
            // Rul tilbage så hukommelsen matcher disken.
            self.doc.intents[idx].patterns.pop();
            if created_group {
                self.doc.intents.pop();
            }
            return Err(e);
        }

        tracing::info!(intent, utterance, "Træningseksempel tilføjet til korpus");
        Ok(true)
    }

    /// Producerer to parallelle lister (ytringer, intents) klar til
    /// vektorisering. Rækkefølgen inden for en intent bevares; på tværs
    /// følges gruppernes deklarationsrækkefølge.
    pub fn load_all(&self) -> (Vec<String>, Vec<String>) {
        let mut texts = Vec::new();
        let mut labels = Vec::new();
        for group in &self.doc.intents {
            for pattern in &group.patterns {
                texts.push(pattern.clone());
                labels.push(group.tag.clone());
            }
        }
        (texts, labels)
    }

    /// Alle intent-grupper i deklarationsrækkefølge.
    pub fn groups(&self) -> &[IntentGroup] {
        &self.doc.intents
    }

    /// Svarfraserne for en given intent, hvis den findes.
    pub fn responses_for(&self, intent: &str) -> Option<&[String]> {
        self.doc
            .intents
            .iter()
            .find(|g| g.tag == intent)
            .map(|g| g.responses.as_slice())
    }

    /// Antal træningsytringer i alt.
    pub fn example_count(&self) -> usize {
        self.doc.intents.iter().map(|g| g.patterns.len()).sum()
    }

    /// Skriver korpusset atomisk: temp-fil i samme mappe, derefter rename.
    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Kunne ikke oprette mappen {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.doc)
            .context("Kunne ikke serialisere korpusset")?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Kunne ikke skrive {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Kunne ikke omdøbe til {}", self.path.display()))?;
        Ok(())
    }
}
