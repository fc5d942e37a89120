#![allow(dead_code)]
//! # Jarvis — Dansk Stemmeassistent-Kerne
//!
//! **Indgangspunktet** for dialogkernen: en dansksproget assistent med
//! selvforbedrende intent-klassifikation.
//!
//! Opstarten er tofaset:
//!
//! 1. **Straks**: webserveren (Axum) binder og tager imod forbindelser
//!    med det samme; chatten svarer med en ventebesked.
//! 2. **Baggrund**: korpusset sås/indlæses, klassifikatoren trænes
//!    eller indlæses fra artefakter, og orkestratoren publiceres via
//!    `OnceLock` — derefter melder `/status` klar.
//!
//! ```text
//! main()
//!   ├── tracing/logging
//!   ├── Config fra miljøet
//!   ├── broadcast-kanal til SSE
//!   ├── AppState + Router, TCP-bind
//!   ├── spawn_blocking:
//!   │     ├── så/indlæs korpus (data/intents.json)
//!   │     ├── indlæs artefakter eller træn fra korpus
//!   │     ├── byg orkestrator (kontekst, mønstre, handlinger)
//!   │     └── publicér ModelReady i OnceLock
//!   └── spawn: gentræningsopgaven (interval + bekræftelsestærskel)
//! ```
//!
//! ```bash
//! cargo run                      # logniveau info
//! RUST_LOG=debug cargo run       # detaljerede logs
//! JARVIS_CONFIDENCE_THRESHOLD=0.7 cargo run
//! ```

/// Modul `actions` — afsendelse af handlinger og den indbyggede danske tabel.
mod actions;

/// Modul `config` — stier og tunbare parametre.
mod config;

/// Modul `context` — persisteret, afgrænset samtalehukommelse.
mod context;

/// Modul `corpus` — det mærkede træningskorpus.
mod corpus;

/// Modul `llm` — kontrakten for LLM-fallback.
mod llm;

/// Modul `nlu` — TF-IDF, logistisk regression, træner og klassifikator.
mod nlu;

/// Modul `orchestrator` — firtrins-pipelinen fra ytring til svar.
mod orchestrator;

/// Modul `patterns` — YAML-deklarerede kommandoskabeloner.
mod patterns;

/// Modul `scheduler` — natlig og behovsdrevet gentræning.
mod scheduler;

/// Modul `web` — Axum-server, handlers, skabeloner og SSE.
mod web;

use std::sync::atomic::AtomicU32;
use std::sync::{Arc, OnceLock};

use anyhow::{Context as _, Result};
use tokio::sync::{broadcast, Mutex};
use tracing_subscriber::EnvFilter;

use crate::actions::{ActionDispatcher, BuiltinActions};
use crate::config::Config;
use crate::context::ContextStore;
use crate::corpus::TrainingCorpus;
use crate::llm::NoLanguageModel;
use crate::nlu::classifier::write_artifacts;
use crate::nlu::seed::seed_groups;
use crate::nlu::{trainer, IntentClassifier};
use crate::orchestrator::Orchestrator;
use crate::patterns::PatternResolver;
use crate::scheduler::RetrainTask;
use crate::web::events::SystemEvent;
use crate::web::state::{AppState, ModelReady};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(Config::from_env());
    tracing::info!(data_dir = %config.data_dir.display(), "Jarvis starter");

    let classifier = Arc::new(IntentClassifier::new(
        config.model_dir(),
        config.low_confidence_log_path(),
    ));

    // OnceLock'en fyldes når baggrundsinitialiseringen er færdig.
    let model: Arc<OnceLock<ModelReady>> = Arc::new(OnceLock::new());

    // Broadcast-kanal til SSE; langsomme abonnenter mister de ældste.
    let (events_tx, _) = broadcast::channel::<SystemEvent>(256);
    let events_tx = Arc::new(events_tx);

    let state = AppState {
        model: model.clone(),
        events_tx: events_tx.clone(),
    };
    let app = web::create_router(state);

    // Serveren er tilgængelig med det samme, også før modellen er klar.
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Kunne ikke binde til {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "Webserveren lytter");

    // Deles mellem orkestratoren (skriver) og gentræningsopgaven (læser).
    let confirmed_count = Arc::new(AtomicU32::new(0));

    {
        let config = config.clone();
        let classifier = classifier.clone();
        let model = model.clone();
        let confirmed_count = confirmed_count.clone();
        tokio::task::spawn_blocking(move || {
            match initialize(&config, classifier, confirmed_count) {
                Ok(ready) => {
                    let _ = model.set(ready);
                    tracing::info!("Systemet er klar");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Initialiseringen fejlede, chatten forbliver utilgængelig");
                }
            }
        });
    }

    let retrain = RetrainTask {
        corpus_path: config.corpus_path(),
        model_dir: config.model_dir(),
        classifier,
        interval: config.retrain_interval,
        confirmation_threshold: config.retrain_threshold,
        confirmed_count,
        events_tx,
    };
    tokio::spawn(retrain.run());

    axum::serve(listener, app).await?;
    Ok(())
}

/// Baggrundsinitialiseringen: korpus, artefakter, orkestrator.
///
/// Kører i `spawn_blocking` fordi en fuld træning er CPU-tung.
fn initialize(
    config: &Config,
    classifier: Arc<IntentClassifier>,
    confirmed_count: Arc<AtomicU32>,
) -> Result<ModelReady> {
    // Korpus: så med det indbyggede danske datasæt ved første start.
    let corpus_path = config.corpus_path();
    let corpus = if TrainingCorpus::exists(&corpus_path) {
        TrainingCorpus::load(&corpus_path)
    } else {
        tracing::info!(path = %corpus_path.display(), "Sår korpusset med det indbyggede datasæt");
        TrainingCorpus::seed(&corpus_path, seed_groups())?
    };
    tracing::info!(examples = corpus.example_count(), "Korpus klar");

    // Artefakter: genbrug en gyldig trippel, ellers træn forfra.
    if let Err(e) = classifier.load() {
        tracing::info!(reason = %e, "Ingen brugbare artefakter, træner fra korpusset");
        let (texts, labels) = corpus.load_all();
        let artifacts = trainer::train(&texts, &labels)?;
        write_artifacts(&config.model_dir(), &artifacts)?;
        classifier.load()?;
    }

    let context = ContextStore::load(
        config.context_path(),
        config.max_history,
        config.expected_response_ttl,
    );
    let patterns = PatternResolver::load(&config.patterns_path());
    let builtins = BuiltinActions::new(config.notes_path());
    let dispatcher = build_dispatcher(config);

    let orchestrator = Orchestrator::new(
        corpus,
        context,
        patterns,
        dispatcher,
        builtins,
        classifier.clone(),
        Arc::new(NoLanguageModel),
        config.confidence_threshold,
        confirmed_count,
    );

    Ok(ModelReady {
        orchestrator: Mutex::new(orchestrator),
        classifier,
    })
}

/// Bygger funktionsregistret som YAML-kommandoer med `action_type:
/// function` kan pege på. Kaldene uddelegerer til den indbyggede tabel.
fn build_dispatcher(config: &Config) -> ActionDispatcher {
    let builtins = Arc::new(BuiltinActions::new(config.notes_path()));
    let mut dispatcher = ActionDispatcher::new();

    {
        let builtins = builtins.clone();
        dispatcher.register(
            "open_website",
            Arc::new(move |slots| {
                let builtins = builtins.clone();
                Box::pin(async move {
                    let site = slots
                        .first()
                        .map(|(_, v)| v.clone())
                        .unwrap_or_default();
                    Ok(builtins
                        .execute("open_website", &site, 0)
                        .unwrap_or_default())
                })
            }),
        );
    }
    {
        let builtins = builtins.clone();
        dispatcher.register(
            "save_note",
            Arc::new(move |slots| {
                let builtins = builtins.clone();
                Box::pin(async move {
                    let text = slots
                        .first()
                        .map(|(_, v)| v.clone())
                        .unwrap_or_default();
                    Ok(builtins.execute("save_note", &text, 0).unwrap_or_default())
                })
            }),
        );
    }

    dispatcher
}
