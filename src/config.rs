//! # Konfiguration — Stier og Tærskler
//!
//! Samler alle filstier og tunbare parametre ét sted, så resten af
//! applikationen aldrig hardkoder en sti.
//!
//! ## Standardværdier
//!
//! | Parameter | Standard | Miljøvariabel |
//! |-----------|----------|---------------|
//! | datamappe | `data/` | `JARVIS_DATA_DIR` |
//! | konfidenstærskel τ | 0.55 | `JARVIS_CONFIDENCE_THRESHOLD` |
//! | historiklængde | 20 ture | — |
//! | ja/nej-udløb | 30 s | — |
//! | gentræn efter N bekræftelser | 10 | — |
//! | gentræningsinterval | 24 timer | — |
//! | serveradresse | `0.0.0.0:3000` | `JARVIS_ADDR` |

use std::path::PathBuf;
use std::time::Duration;

/// Samlet konfiguration for hele applikationen.
///
/// Oprettes én gang i `main()` og deles som `Arc<Config>` mellem
/// orkestrator, klassifikator og gentræningsopgave.
#[derive(Debug, Clone)]
pub struct Config {
    /// Rodmappe for al persisteret tilstand.
    pub data_dir: PathBuf,
    /// Konfidenstærskel τ — under denne værdi udløses afklaringsprotokollen.
    pub confidence_threshold: f64,
    /// Maksimalt antal ture i samtalehistorikken.
    pub max_history: usize,
    /// Hvor længe et forventet ja/nej-svar er gyldigt.
    pub expected_response_ttl: Duration,
    /// Fuld gentræning efter så mange bekræftede afklaringer.
    pub retrain_threshold: u32,
    /// Interval mellem planlagte gentræninger.
    pub retrain_interval: Duration,
    /// Adresse webserveren binder til.
    pub bind_addr: String,
}

impl Config {
    /// Bygger konfigurationen fra miljøvariabler med fornuftige standarder.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("JARVIS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        let confidence_threshold = std::env::var("JARVIS_CONFIDENCE_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.55);
        let bind_addr =
            std::env::var("JARVIS_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        Self {
            data_dir,
            confidence_threshold,
            max_history: 20,
            expected_response_ttl: Duration::from_secs(30),
            retrain_threshold: 10,
            retrain_interval: Duration::from_secs(24 * 60 * 60),
            bind_addr,
        }
    }

    /// Træningskorpus: `data/intents.json`.
    pub fn corpus_path(&self) -> PathBuf {
        self.data_dir.join("intents.json")
    }

    /// Samtalekontekst: `data/context.json`.
    pub fn context_path(&self) -> PathBuf {
        self.data_dir.join("context.json")
    }

    /// Mappe med de tre klassifikator-artefakter.
    pub fn model_dir(&self) -> PathBuf {
        self.data_dir.join("models")
    }

    /// Lavkonfidens-log (NDJSON, én linje per ytring).
    pub fn low_confidence_log_path(&self) -> PathBuf {
        self.data_dir.join("lav_konfidens.ndjson")
    }

    /// Mønsterkonfiguration (YAML) med kommandoskabeloner.
    pub fn patterns_path(&self) -> PathBuf {
        self.data_dir.join("commands.yaml")
    }

    /// Notesfil som `save_note`-handlingen skriver til.
    pub fn notes_path(&self) -> PathBuf {
        self.data_dir.join("notes").join("noter.txt")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
