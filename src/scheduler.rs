//! # Gentræningsopgaven — Natligt og Behovsdrevet Vedligehold
//!
//! Én langlivet tokio-opgave der holder klassifikatoren frisk:
//!
//! - **Interval**: fuld gentræning hvert døgn (konfigurerbart).
//! - **Bekræftelser**: når antallet af bekræftede afklaringer siden
//!   sidste kørsel når tærsklen, trækkes en ekstra kørsel i gang.
//!
//! Tælleren deles med orkestratoren som en `Arc<AtomicU32>` og nulstilles
//! efter hver vellykket kørsel. Selve træningen er CPU-tung og kører i
//! `spawn_blocking`; korpusset læses frisk fra disk, så opgaven aldrig
//! behøver orkestratorlåsen.
//!
//! ## Fejl
//!
//! En fejlet kørsel logges og meldes via SSE; den indlæste model bliver
//! stående, og opgaven prøver igen ved næste anledning.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use tokio::sync::broadcast;

use crate::corpus::TrainingCorpus;
use crate::nlu::classifier::write_artifacts;
use crate::nlu::{trainer, IntentClassifier};
use crate::web::events::SystemEvent;

/// Hvor ofte tælleren over bekræftelser kontrolleres.
const COUNTER_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Parametre for gentræningsopgaven.
pub struct RetrainTask {
    /// Sti til korpusfilen; læses frisk ved hver kørsel.
    pub corpus_path: PathBuf,
    /// Mappe hvor artefakt-triplen skrives.
    pub model_dir: PathBuf,
    /// Klassifikatorsingletonen der genindlæses efter hver kørsel.
    pub classifier: Arc<IntentClassifier>,
    /// Tid mellem fulde gentræninger.
    pub interval: Duration,
    /// Bekræftelser der udløser en ekstra kørsel.
    pub confirmation_threshold: u32,
    /// Delt tæller, skrevet af orkestratoren.
    pub confirmed_count: Arc<AtomicU32>,
    /// SSE-kanal for trænings-hændelser.
    pub events_tx: Arc<broadcast::Sender<SystemEvent>>,
}

impl RetrainTask {
    /// Kører opgaven for evigt. Spawnes fra `main` efter første træning.
    pub async fn run(self) {
        let mut last_run = tokio::time::Instant::now();
        loop {
            tokio::time::sleep(COUNTER_POLL_INTERVAL).await;

            let confirmations = self.confirmed_count.load(Ordering::Relaxed);
            let trigger = if last_run.elapsed() >= self.interval {
                "interval"
            } else if confirmations >= self.confirmation_threshold {
                "confirmations"
            } else {
                continue;
            };

            tracing::info!(trigger, confirmations, "Gentræning udløst");
            let _ = self.events_tx.send(SystemEvent::TrainingStarted {
                trigger: trigger.to_string(),
            });

            match self.retrain().await {
                Ok((examples, labels)) => {
                    last_run = tokio::time::Instant::now();
                    self.confirmed_count.store(0, Ordering::Relaxed);
                    let _ = self
                        .events_tx
                        .send(SystemEvent::TrainingFinished { examples, labels });
                }
                Err(e) => {
                    tracing::error!(error = %e, "Gentræning fejlede, den gamle model svarer videre");
                    let _ = self.events_tx.send(SystemEvent::TrainingFailed {
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    /// Én fuld kørsel: korpus fra disk, træn i blocking-tråd, skriv
    /// artefakter, genindlæs. Returnerer (eksempler, mærkater).
    async fn retrain(&self) -> Result<(usize, usize)> {
        self.classifier.begin_training();
        let result = self.retrain_inner().await;
        self.classifier.end_training();
        result
    }

    async fn retrain_inner(&self) -> Result<(usize, usize)> {
        let corpus = TrainingCorpus::load(&self.corpus_path);
        let (texts, labels) = corpus.load_all();
        let examples = texts.len();

        let artifacts = tokio::task::spawn_blocking(move || trainer::train(&texts, &labels))
            .await
            .context("Træningstråden crashede")??;
        let label_count = artifacts.labels.len();

        write_artifacts(&self.model_dir, &artifacts)?;
        self.classifier
            .reload()
            .context("Kunne ikke genindlæse de nye artefakter")?;

        tracing::info!(examples, labels = label_count, "Gentræning gennemført og indlæst");
        Ok((examples, label_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_fixture(threshold: u32) -> (RetrainTask, PathBuf) {
        let dir = std::env::temp_dir().join(format!("jarvis-sched-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let corpus_path = dir.join("intents.json");
        let mut corpus = TrainingCorpus::load(&corpus_path);
        for u in ["hej", "goddag", "hallo", "hej med dig"] {
            corpus.append("greeting", u).unwrap();
        }
        for u in ["farvel", "vi ses", "hej hej", "god aften"] {
            corpus.append("goodbye", u).unwrap();
        }
        let (tx, _) = broadcast::channel(16);
        let task = RetrainTask {
            corpus_path,
            model_dir: dir.join("models"),
            classifier: Arc::new(IntentClassifier::new(
                dir.join("models"),
                dir.join("lav_konfidens.ndjson"),
            )),
            interval: Duration::from_secs(24 * 3600),
            confirmation_threshold: threshold,
            confirmed_count: Arc::new(AtomicU32::new(0)),
            events_tx: Arc::new(tx),
        };
        (task, dir)
    }

    #[tokio::test]
    async fn retrain_writes_and_loads_artifacts() {
        let (task, dir) = task_fixture(10);
        let (examples, labels) = task.retrain().await.unwrap();
        assert_eq!(examples, 8);
        assert_eq!(labels, 2);
        assert!(dir.join("models").join("intent_model.json").exists());
        assert!(task.classifier.is_loaded());
    }

    #[tokio::test]
    async fn retrain_failure_leaves_classifier_untouched() {
        let (mut task, _dir) = task_fixture(10);
        // Indlæs en fungerende model først.
        task.retrain().await.unwrap();
        // Peg derefter korpusset på en tom fil — træning fejler.
        task.corpus_path = std::env::temp_dir().join(format!("tom-{}.json", uuid::Uuid::new_v4()));
        assert!(task.retrain().await.is_err());
        // Den gamle model er stadig indlæst og svarer.
        assert!(task.classifier.is_loaded());
        assert!(task.classifier.predict("hej", 0.55).is_some());
    }

    #[tokio::test]
    async fn training_events_are_emitted() {
        let (task, _dir) = task_fixture(10);
        let mut rx = task.events_tx.subscribe();
        let _ = task.events_tx.send(SystemEvent::TrainingStarted {
            trigger: "interval".to_string(),
        });
        task.retrain().await.unwrap();
        let first = rx.recv().await.unwrap();
        assert!(matches!(first, SystemEvent::TrainingStarted { .. }));
    }
}
