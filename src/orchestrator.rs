//! # Dialogorkestratoren — Fra Ytring til Svar
//!
//! Det eneste indgangspunkt for en tur. Pipelinen kører fire trin i
//! fast rækkefølge og stopper ved første afgørelse:
//!
//! ```text
//! ytring
//!   │
//!   ├─ 1. Venter vi på et ja/nej? ──▶ afklaringsprotokol (lær/annuller)
//!   │
//!   ├─ 2. Mønsteropløser ───────────▶ ActionDispatcher (script/funktion/app)
//!   │
//!   ├─ 3. Intent-klassifikator
//!   │      ├─ konfidens ≥ τ ────────▶ indbygget handlingstabel
//!   │      ├─ konfidens < τ ────────▶ afklaringsspørgsmål (ja/nej)
//!   │      └─ ukendt/uindlæst ──────▶ trin 4
//!   │
//!   └─ 4. LLM-fallback ─────────────▶ genereret svar, ellers fast frase
//! ```
//!
//! Hver tur ender med præcis én [`ContextStore::add_interaction`], og
//! ingen fejl slipper ud af [`Orchestrator::handle_utterance`] — det
//! værste svar er den faste ikke-forstået-frase.
//!
//! ## Afklaringsprotokollen
//!
//! Et svar under tærsklen udløser et ja/nej-spørgsmål med metadata
//! `{original_intent, original_text}`. Bekræfter brugeren, føjes parret
//! til træningskorpusset, og klassifikatoren genindlæses — begge dele
//! fuldføres før bekræftelsessvaret registreres. Tælleren over
//! bekræftelser driver gentræningsopgavens ekstra kørsel.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::actions::{ActionDispatcher, BuiltinActions, FALLBACK_REPLY};
use crate::context::{ContextStore, ExpectedKind, Turn};
use crate::corpus::TrainingCorpus;
use crate::llm::LanguageModel;
use crate::nlu::IntentClassifier;
use crate::patterns::PatternResolver;

/// Hvor mange ture LLM-fallbacken får som kontekstvindue.
const LLM_HISTORY_WINDOW: usize = 5;

/// Leksikalsk klassifikation af et ja/nej-svar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum YesNo {
    Affirmative,
    Negative,
    Unclear,
}

/// Faste nøgleord for bekræftelse og afvisning.
const AFFIRMATIVE_WORDS: &[&str] = &[
    "ja", "jo", "jep", "yes", "ok", "okay", "gerne", "selvfølgelig", "klart",
];
const NEGATIVE_WORDS: &[&str] = &["nej", "næh", "nix", "nope", "ikke", "annuller", "glem"];

/// Klassificerer et svar leksikalsk i {bekræftende, afvisende, uklart}.
fn classify_yes_no(text: &str) -> YesNo {
    let lower = text.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    let affirmative = tokens.iter().any(|t| AFFIRMATIVE_WORDS.contains(t));
    let negative = tokens.iter().any(|t| NEGATIVE_WORDS.contains(t));
    match (affirmative, negative) {
        (true, false) => YesNo::Affirmative,
        (false, true) => YesNo::Negative,
        _ => YesNo::Unclear,
    }
}

/// Resultatet af én tur, klar til visning i skallen.
#[derive(Debug, Clone)]
pub struct TurnReply {
    /// Svarteksten til brugeren (og til TTS-samarbejdspartneren).
    pub reply: String,
    /// Den afgjorte intent som den står i historikken.
    pub intent: String,
    /// Klassifikatorkonfidens, hvis en klassifikation indgik.
    pub confidence: Option<f64>,
}

/// Dialogorkestratoren. Ejes af én `tokio::sync::Mutex` i webstaten —
/// at tage låsen er serialiseringspunktet der giver tur-for-tur-orden.
pub struct Orchestrator {
    corpus: TrainingCorpus,
    context: ContextStore,
    patterns: PatternResolver,
    dispatcher: ActionDispatcher,
    builtins: BuiltinActions,
    classifier: Arc<IntentClassifier>,
    llm: Arc<dyn LanguageModel>,
    confidence_threshold: f64,
    /// Turtæller — driver den deterministiske rotation af svarpuljer.
    turn_counter: u64,
    /// Bekræftede afklaringer siden sidste fulde gentræning; læses af
    /// gentræningsopgaven.
    confirmed_count: Arc<AtomicU32>,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        corpus: TrainingCorpus,
        context: ContextStore,
        patterns: PatternResolver,
        dispatcher: ActionDispatcher,
        builtins: BuiltinActions,
        classifier: Arc<IntentClassifier>,
        llm: Arc<dyn LanguageModel>,
        confidence_threshold: f64,
        confirmed_count: Arc<AtomicU32>,
    ) -> Self {
        Self {
            corpus,
            context,
            patterns,
            dispatcher,
            builtins,
            classifier,
            llm,
            confidence_threshold,
            turn_counter: 0,
            confirmed_count,
        }
    }

    /// Behandler én ytring og giver altid et svar. Alle bivirkninger
    /// (kontekst, korpus, genindlæsning) sker her.
    pub async fn handle_utterance(&mut self, text: &str) -> TurnReply {
        let text = text.trim();
        self.turn_counter += 1;

        if text.is_empty() {
            let reply = "Jeg kunne ikke forstå, hvad du sagde. Kan du prøve igen?".to_string();
            return self.record(text, reply, "unknown", None);
        }

        // Trin 1: venter vi på et ja/nej-svar?
        if self.context.is_awaiting_response()
            && self.context.get_expected_response_type() == Some(ExpectedKind::YesNo)
        {
            return self.handle_clarification_reply(text);
        }

        // Trin 2: mønsteropløseren.
        if let Some(action) = self.patterns.resolve(text) {
            tracing::info!(command = %action.command, kind = ?action.kind, "Mønstermatch");
            let reply = self.dispatcher.dispatch(&action).await;
            let command = action.command;
            return self.record(text, reply, &command, None);
        }

        // Trin 3: klassifikatoren.
        if let Some(prediction) = self.classifier.predict(text, self.confidence_threshold) {
            if prediction.intent != "unknown" {
                if prediction.confidence < self.confidence_threshold {
                    return self.request_clarification(text, &prediction.intent, prediction.confidence);
                }
                tracing::info!(
                    intent = %prediction.intent,
                    confidence = prediction.confidence,
                    "Intent klassificeret"
                );
                let reply = self.reply_for_intent(&prediction.intent, text);
                let intent = prediction.intent;
                return self.record(text, reply, &intent, Some(prediction.confidence));
            }
        }

        // Trin 4: LLM-fallback.
        self.llm_fallback(text).await
    }

    /// Nulstiller samtalen: historik, felter og turtæller.
    pub fn reset(&mut self) {
        self.context.reset_session();
        self.turn_counter = 0;
        tracing::info!("Samtalen er nulstillet");
    }

    /// Seneste `n` ture til visning i skallen.
    pub fn history(&self, n: usize) -> Vec<Turn> {
        self.context.get_conversation_history(n).to_vec()
    }

    // ─── Trin 1: afklaringsprotokollen ─────────────────────────

    fn handle_clarification_reply(&mut self, text: &str) -> TurnReply {
        let metadata = self.context.get_expected_response_metadata().unwrap_or_default();
        self.context.clear_expected_response();

        let original_intent = metadata
            .get("original_intent")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        let original_text = metadata
            .get("original_text")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        match classify_yes_no(text) {
            YesNo::Affirmative => {
                let (Some(intent), Some(utterance)) = (original_intent, original_text) else {
                    let reply = "Godt!".to_string();
                    return self.record(text, reply, "confirmation", None);
                };
                self.learn_confirmed_example(text, &intent, &utterance)
            }
            YesNo::Negative => {
                let label = match original_intent {
                    Some(intent) => format!("cancelled_{intent}"),
                    None => "cancelled".to_string(),
                };
                let reply =
                    "Okay, jeg har annulleret det. Hvad kan jeg ellers hjælpe med?".to_string();
                self.record(text, reply, &label, None)
            }
            YesNo::Unclear => {
                let reply =
                    "Det fangede jeg ikke — var det et ja eller et nej? Prøv igen.".to_string();
                self.record(text, reply, "clarification_response_unclear", None)
            }
        }
    }

    /// Bekræftet afklaring: korpus-append og genindlæsning fuldføres
    /// begge før bekræftelsessvaret registreres.
    fn learn_confirmed_example(&mut self, text: &str, intent: &str, utterance: &str) -> TurnReply {
        let reply = match self.corpus.append(intent, utterance) {
            Ok(added) => {
                // Dubletter vokser ikke korpusset og tæller derfor
                // heller ikke mod gentræningstærsklen.
                if added {
                    if let Err(e) = self.classifier.reload() {
                        tracing::error!(error = %e, "Genindlæsning efter bekræftelse fejlede");
                    }
                    self.confirmed_count.fetch_add(1, Ordering::Relaxed);
                }
                format!("Tak! Nu ved jeg, at '{utterance}' betyder {intent}.")
            }
            Err(e) => {
                tracing::error!(error = %e, intent, "Kunne ikke gemme det bekræftede eksempel");
                "Tak! Jeg prøvede at gemme det, men det lykkedes ikke — så det overlever \
                 muligvis ikke en genstart."
                    .to_string()
            }
        };
        let label = format!("confirmed_{intent}");
        self.record(text, reply, &label, None)
    }

    // ─── Trin 3: afklaringsspørgsmål og handlingstabel ─────────

    fn request_clarification(&mut self, text: &str, intent: &str, confidence: f64) -> TurnReply {
        tracing::info!(intent, confidence, "Beder om afklaring");
        let mut metadata = serde_json::Map::new();
        metadata.insert(
            "original_intent".to_string(),
            serde_json::Value::String(intent.to_string()),
        );
        metadata.insert(
            "original_text".to_string(),
            serde_json::Value::String(text.to_string()),
        );
        self.context.set_expected_response(ExpectedKind::YesNo, metadata);
        let reply =
            format!("Jeg er ikke helt sikker — mente du noget med {intent}? Svar ja eller nej.");
        self.record(text, reply, "clarification_request", Some(confidence))
    }

    /// Slår intenten op i den indbyggede tabel; kender tabellen den
    /// ikke, roteres korpussets svarfraser; findes de heller ikke,
    /// indrømmes det pænt.
    fn reply_for_intent(&self, intent: &str, utterance: &str) -> String {
        if let Some(reply) = self.builtins.execute(intent, utterance, self.turn_counter) {
            return reply;
        }
        if let Some(responses) = self.corpus.responses_for(intent) {
            if !responses.is_empty() {
                return responses[(self.turn_counter as usize) % responses.len()].clone();
            }
        }
        format!("Jeg forstår din forespørgsel, men kan ikke håndtere '{intent}' lige nu.")
    }

    // ─── Trin 4: LLM-fallback ──────────────────────────────────

    async fn llm_fallback(&mut self, text: &str) -> TurnReply {
        if self.llm.is_available() {
            let history = self
                .context
                .get_conversation_history(LLM_HISTORY_WINDOW)
                .to_vec();
            match self.llm.generate(text, &history).await {
                Ok(reply) => {
                    tracing::info!("LLM-fallback leverede svaret");
                    return self.record(text, reply, "llm_fallback", None);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "LLM-fallback fejlede");
                    let reply = self
                        .builtins
                        .execute("unknown", text, self.turn_counter)
                        .unwrap_or_else(|| FALLBACK_REPLY.to_string());
                    return self.record(text, reply, "unknown", None);
                }
            }
        }
        self.record(text, FALLBACK_REPLY.to_string(), "unknown", None)
    }

    // ─── Fælles afslutning ─────────────────────────────────────

    /// Registrerer turen i kontekstlageret og bygger svaret. Hver sti
    /// gennem pipelinen ender her præcis én gang.
    fn record(
        &mut self,
        user: &str,
        reply: String,
        intent: &str,
        confidence: Option<f64>,
    ) -> TurnReply {
        self.context.add_interaction(user, &reply, intent, confidence);
        TurnReply {
            reply,
            intent: intent.to_string(),
            confidence,
        }
    }

    #[cfg(test)]
    pub(crate) fn context_mut(&mut self) -> &mut ContextStore {
        &mut self.context
    }

    #[cfg(test)]
    pub(crate) fn corpus_ref(&self) -> &TrainingCorpus {
        &self.corpus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{FailingModel, ScriptedModel};
    use crate::llm::NoLanguageModel;
    use crate::nlu::{classifier::write_artifacts, trainer};
    use std::path::PathBuf;
    use std::time::Duration;

    // ─── classify_yes_no ───────────────────────────────────────

    #[test]
    fn yes_no_lexicon() {
        assert_eq!(classify_yes_no("ja"), YesNo::Affirmative);
        assert_eq!(classify_yes_no("Ja, gem den"), YesNo::Affirmative);
        assert_eq!(classify_yes_no("nej tak"), YesNo::Negative);
        assert_eq!(classify_yes_no("måske"), YesNo::Unclear);
        // Begge nøgleord til stede → uklart.
        assert_eq!(classify_yes_no("ja og nej"), YesNo::Unclear);
    }

    // ─── testopstilling ────────────────────────────────────────

    struct Fixture {
        dir: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = std::env::temp_dir().join(format!("jarvis-orch-{}", uuid::Uuid::new_v4()));
            std::fs::create_dir_all(&dir).unwrap();
            Self { dir }
        }

        /// Lille tokorpus: greeting og get_weather.
        fn seeded_corpus(&self) -> TrainingCorpus {
            let mut corpus = TrainingCorpus::load(self.dir.join("intents.json"));
            for u in ["hej", "hej med dig", "goddag", "hej jarvis", "godmorgen", "hallo"] {
                corpus.append("greeting", u).unwrap();
            }
            for u in [
                "hvordan er vejret",
                "vejret i dag",
                "hvordan bliver vejret",
                "bliver det regn i dag",
                "hvordan er vejret i morgen",
                "hvad siger vejrudsigten",
            ] {
                corpus.append("get_weather", u).unwrap();
            }
            corpus
        }

        fn trained_classifier(&self, corpus: &TrainingCorpus) -> Arc<IntentClassifier> {
            let (texts, labels) = corpus.load_all();
            let artifacts = trainer::train(&texts, &labels).unwrap();
            let model_dir = self.dir.join("models");
            write_artifacts(&model_dir, &artifacts).unwrap();
            let classifier = Arc::new(IntentClassifier::new(
                &model_dir,
                self.dir.join("lav_konfidens.ndjson"),
            ));
            classifier.load().unwrap();
            classifier
        }

        fn orchestrator_with(
            &self,
            patterns_yaml: &str,
            llm: Arc<dyn LanguageModel>,
            threshold: f64,
        ) -> Orchestrator {
            let corpus = self.seeded_corpus();
            let classifier = self.trained_classifier(&corpus);
            let context =
                ContextStore::load(self.dir.join("context.json"), 20, Duration::from_secs(30));
            Orchestrator::new(
                corpus,
                context,
                PatternResolver::from_yaml(patterns_yaml),
                ActionDispatcher::new(),
                BuiltinActions::new(self.dir.join("noter.txt")),
                classifier,
                llm,
                threshold,
                Arc::new(AtomicU32::new(0)),
            )
        }

        fn orchestrator(&self) -> Orchestrator {
            self.orchestrator_with("commands: []", Arc::new(NoLanguageModel), 0.55)
        }
    }

    // ─── trin 2: mønstermatch ──────────────────────────────────

    #[cfg(unix)]
    #[tokio::test]
    async fn known_pattern_runs_script() {
        use std::os::unix::fs::PermissionsExt;
        let f = Fixture::new();
        let script = f.dir.join("lights_on.sh");
        std::fs::write(&script, "#!/bin/sh\necho lyset er taendt\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        let yaml = format!(
            "commands:\n  - name: lights_on\n    phrases: [\"tænd lyset\"]\n    action_type: script\n    action_details: \"{}\"\n    parameters: []\n",
            script.display()
        );
        let mut orch = f.orchestrator_with(&yaml, Arc::new(NoLanguageModel), 0.55);

        let turn = orch.handle_utterance("tænd lyset").await;
        assert_eq!(turn.intent, "lights_on");
        assert!(
            turn.reply.contains("lights_on") || turn.reply.contains("lyset er taendt"),
            "svar: {}",
            turn.reply
        );
        assert_eq!(orch.history(1)[0].intent, "lights_on");
    }

    // ─── trin 3: høj konfidens ─────────────────────────────────

    #[tokio::test]
    async fn high_confidence_greeting() {
        let f = Fixture::new();
        let mut orch = f.orchestrator();
        let turn = orch.handle_utterance("hej").await;
        assert_eq!(turn.intent, "greeting");
        assert!(turn.confidence.unwrap() >= 0.55, "konfidens: {:?}", turn.confidence);
        assert!(!turn.reply.is_empty());
        assert_eq!(orch.history(1)[0].intent, "greeting");
    }

    // ─── afklaringsprotokollen ─────────────────────────────────

    #[tokio::test]
    async fn low_confidence_clarification_then_yes() {
        let f = Fixture::new();
        // Kunstigt høj tærskel, så selv et pænt match kræver afklaring.
        let mut orch = f.orchestrator_with("commands: []", Arc::new(NoLanguageModel), 0.999);

        let turn = orch.handle_utterance("vejret").await;
        assert_eq!(turn.intent, "clarification_request");
        assert!(turn.reply.contains("get_weather"), "svar: {}", turn.reply);

        let followup = orch.handle_utterance("ja").await;
        assert_eq!(followup.intent, "confirmed_get_weather");
        assert!(followup.reply.contains("vejret"));
        // Korpusset er vokset med præcis det bekræftede par.
        let (texts, labels) = orch.corpus_ref().load_all();
        let added = texts
            .iter()
            .zip(&labels)
            .any(|(t, l)| t == "vejret" && l == "get_weather");
        assert!(added);
    }

    #[tokio::test]
    async fn low_confidence_clarification_then_no() {
        let f = Fixture::new();
        let mut orch = f.orchestrator_with("commands: []", Arc::new(NoLanguageModel), 0.999);
        let before = orch.corpus_ref().example_count();

        orch.handle_utterance("vejret").await;
        let followup = orch.handle_utterance("nej").await;
        assert_eq!(followup.intent, "cancelled_get_weather");
        assert_eq!(orch.corpus_ref().example_count(), before);
    }

    #[tokio::test]
    async fn unclear_clarification_reply() {
        let f = Fixture::new();
        let mut orch = f.orchestrator_with("commands: []", Arc::new(NoLanguageModel), 0.999);
        orch.handle_utterance("vejret").await;
        let followup = orch.handle_utterance("tja, måske").await;
        assert_eq!(followup.intent, "clarification_response_unclear");
        // Feltet er ryddet — næste ytring går gennem den normale pipeline.
        let next = orch.handle_utterance("hej").await;
        assert_ne!(next.intent, "clarification_response_unclear");
    }

    // ─── intet match, ingen LLM ────────────────────────────────

    #[tokio::test]
    async fn gibberish_without_llm_gives_fixed_phrase() {
        let f = Fixture::new();
        let mut orch = f.orchestrator();
        let turn = orch.handle_utterance("xyzzy").await;
        assert_eq!(turn.intent, "unknown");
        assert_eq!(turn.reply, FALLBACK_REPLY);
        // Lavkonfidens-loggen har fået én linje.
        let log = std::fs::read_to_string(f.dir.join("lav_konfidens.ndjson")).unwrap();
        assert_eq!(log.lines().count(), 1);
    }

    // ─── udløbet forventning ───────────────────────────────────

    #[tokio::test]
    async fn expired_clarification_routes_normally() {
        let f = Fixture::new();
        let mut orch = f.orchestrator_with("commands: []", Arc::new(NoLanguageModel), 0.999);
        let before = orch.corpus_ref().example_count();

        orch.handle_utterance("vejret").await;
        orch.context_mut().backdate_expected_response(31);

        let turn = orch.handle_utterance("ja").await;
        // "ja" har intet ordforrådsoverlap → normal pipeline ender i unknown.
        assert_eq!(turn.intent, "unknown");
        assert_eq!(orch.corpus_ref().example_count(), before);
    }

    // ─── LLM-fallback ──────────────────────────────────────────

    #[tokio::test]
    async fn llm_fallback_used_when_available() {
        let f = Fixture::new();
        let llm = Arc::new(ScriptedModel("Det ved jeg faktisk godt.".to_string()));
        let mut orch = f.orchestrator_with("commands: []", llm, 0.55);
        let turn = orch.handle_utterance("xyzzy").await;
        assert_eq!(turn.intent, "llm_fallback");
        assert_eq!(turn.reply, "Det ved jeg faktisk godt.");
    }

    #[tokio::test]
    async fn llm_error_degrades_politely() {
        let f = Fixture::new();
        let mut orch = f.orchestrator_with("commands: []", Arc::new(FailingModel), 0.55);
        let turn = orch.handle_utterance("xyzzy").await;
        assert_eq!(turn.intent, "unknown");
        assert!(!turn.reply.is_empty());
    }

    // ─── diverse ───────────────────────────────────────────────

    #[tokio::test]
    async fn empty_utterance() {
        let f = Fixture::new();
        let mut orch = f.orchestrator();
        let turn = orch.handle_utterance("   ").await;
        assert_eq!(turn.intent, "unknown");
        assert!(turn.reply.contains("prøve igen"));
    }

    #[tokio::test]
    async fn confirmed_count_increments() {
        let f = Fixture::new();
        let counter = Arc::new(AtomicU32::new(0));
        let corpus = f.seeded_corpus();
        let classifier = f.trained_classifier(&corpus);
        let context =
            ContextStore::load(f.dir.join("context.json"), 20, Duration::from_secs(30));
        let mut orch = Orchestrator::new(
            corpus,
            context,
            PatternResolver::from_yaml("commands: []"),
            ActionDispatcher::new(),
            BuiltinActions::new(f.dir.join("noter.txt")),
            classifier,
            Arc::new(NoLanguageModel),
            0.999,
            counter.clone(),
        );
        orch.handle_utterance("vejret").await;
        orch.handle_utterance("ja").await;
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn duplicate_confirmation_does_not_advance_counter() {
        let f = Fixture::new();
        let counter = Arc::new(AtomicU32::new(0));
        let corpus = f.seeded_corpus();
        let classifier = f.trained_classifier(&corpus);
        let context =
            ContextStore::load(f.dir.join("context.json"), 20, Duration::from_secs(30));
        let mut orch = Orchestrator::new(
            corpus,
            context,
            PatternResolver::from_yaml("commands: []"),
            ActionDispatcher::new(),
            BuiltinActions::new(f.dir.join("noter.txt")),
            classifier,
            Arc::new(NoLanguageModel),
            0.999,
            counter.clone(),
        );
        let before = orch.corpus_ref().example_count();

        orch.handle_utterance("vejret").await;
        orch.handle_utterance("ja").await;
        // Samme par bekræftes igen; dubletten afvises af korpusset.
        orch.handle_utterance("vejret").await;
        let followup = orch.handle_utterance("ja").await;

        assert_eq!(followup.intent, "confirmed_get_weather");
        assert_eq!(orch.corpus_ref().example_count(), before + 1);
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }
}
