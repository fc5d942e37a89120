//! # Mønsteropløser — Første Trin i Kommandoopløsning
//!
//! Matcher ytringer mod deklarerede frase-skabeloner fra en YAML-fil og
//! giver højst én handlingsbeskrivelse tilbage.
//!
//! ## Konfigurationsformat
//!
//! ```yaml
//! commands:
//!   - name: lights_on
//!     phrases: ["tænd lyset"]
//!     action_type: script
//!     action_details: "smarthome/lights_on.sh"
//!     parameters: []
//!   - name: open_site
//!     phrases: ["åbn {site}", "gå til {site}"]
//!     action_type: function
//!     action_details: "open_website"
//!     parameters:
//!       - name: site
//! ```
//!
//! ## Matchningsalgoritme
//!
//! 1. Normalisér ytringen: små bogstaver, trim.
//! 2. Skabelon uden pladser: nøjagtig lighed med den normaliserede skabelon.
//! 3. Skabelon med `{plads}`: kompileres ved indlæsning til et forankret
//!    regulært udtryk, hvor hver plads bliver en ikke-grådig fangstgruppe
//!    og alt andet escapes.
//! 4. Første match vinder: ydre løkke er kommandorækkefølgen, indre løkke
//!    er fraserækkefølgen.
//!
//! ## Fejl
//!
//! Manglende eller defekt konfiguration giver "intet match" for alle
//! ytringer plus én advarsel ved indlæsning — aldrig fatalt.

use std::path::Path;

use regex::Regex;
use serde::Deserialize;

/// Handlingens art: hvad målet i `action_details` peger på.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Kør et script som underproces.
    Script,
    /// Kald en navngiven funktion i processens register.
    Function,
    /// Bed styresystemet åbne et program eller en URL.
    Application,
}

/// Resultatet af et mønstermatch: kommandonavn, art, mål og pladser.
///
/// Pladserne står i den rækkefølge de optrådte i den matchede frase,
/// så underproces-handlinger kan sende dem positionelt.
#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    /// Kommandoens navn — registreres som intent i historikken.
    pub command: String,
    /// Handlingens art.
    pub kind: ActionKind,
    /// Funktionsnavn, scriptsti eller programnavn.
    pub target: String,
    /// (pladsnavn, udtrukket værdi) i fraserækkefølge, trimmet.
    pub slots: Vec<(String, String)>,
}

/// Rå YAML-former.
#[derive(Debug, Deserialize)]
struct PatternConfig {
    #[serde(default)]
    commands: Vec<RawCommand>,
}

#[derive(Debug, Deserialize)]
struct RawCommand {
    name: String,
    phrases: Vec<String>,
    action_type: ActionKind,
    action_details: String,
    #[serde(default)]
    parameters: Vec<RawParameter>,
}

#[derive(Debug, Deserialize)]
struct RawParameter {
    name: String,
}

/// En frase kompileret til matchbar form.
#[derive(Debug)]
enum CompiledPhrase {
    /// Ingen pladser: nøjagtig strenglighed mod den normaliserede ytring.
    Literal(String),
    /// Mindst én plads: forankret regex med navngivne fangstgrupper.
    Template { regex: Regex, slot_names: Vec<String> },
}

#[derive(Debug)]
struct CompiledCommand {
    name: String,
    kind: ActionKind,
    target: String,
    phrases: Vec<CompiledPhrase>,
}

/// Mønsteropløseren med den kompilerede kommandotabel.
#[derive(Debug, Default)]
pub struct PatternResolver {
    commands: Vec<CompiledCommand>,
}

/// Finder `{plads}`-markører i en fraseskabelon.
fn slot_marker_regex() -> Regex {
    Regex::new(r"\{([a-zA-Z_][a-zA-Z0-9_]*)\}").unwrap()
}

impl PatternResolver {
    /// Indlæser og kompilerer mønsterkonfigurationen.
    ///
    /// Manglende eller defekt fil giver en tom opløser (alle opslag
    /// svarer "intet match") og én advarsel i loggen.
    pub fn load(path: &Path) -> Self {
        let yaml = match std::fs::read_to_string(path) {
            Ok(y) => y,
            Err(_) => {
                tracing::warn!(path = %path.display(), "Ingen mønsterkonfiguration fundet, mønsteropløseren er tom");
                return Self::default();
            }
        };
        match serde_yaml::from_str::<PatternConfig>(&yaml) {
            Ok(config) => Self::from_config(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Defekt mønsterkonfiguration, mønsteropløseren er tom");
                Self::default()
            }
        }
    }

    /// Kompilerer en opløser direkte fra YAML-tekst. Bruges af tests.
    pub fn from_yaml(yaml: &str) -> Self {
        match serde_yaml::from_str::<PatternConfig>(yaml) {
            Ok(config) => Self::from_config(config),
            Err(e) => {
                tracing::warn!(error = %e, "Defekt mønster-YAML, mønsteropløseren er tom");
                Self::default()
            }
        }
    }

    fn from_config(config: PatternConfig) -> Self {
        let marker = slot_marker_regex();
        let mut commands = Vec::with_capacity(config.commands.len());
        for raw in config.commands {
            let mut phrases = Vec::with_capacity(raw.phrases.len());
            for phrase in &raw.phrases {
                let normalized = phrase.trim().to_lowercase();
                match compile_phrase(&normalized, &marker) {
                    Some(compiled) => phrases.push(compiled),
                    None => {
                        tracing::warn!(command = %raw.name, phrase = %phrase, "Frase kunne ikke kompileres, springes over");
                    }
                }
            }
            let _ = &raw.parameters; // pladsnavne valideres implicit af fraserne
            commands.push(CompiledCommand {
                name: raw.name,
                kind: raw.action_type,
                target: raw.action_details,
                phrases,
            });
        }
        tracing::info!(commands = commands.len(), "Mønsterkonfiguration indlæst");
        Self { commands }
    }

    /// Antal indlæste kommandoer.
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Opløser en ytring til højst én handlingsbeskrivelse.
    /// Første match vinder; intet match giver `None`, og orkestratoren
    /// går videre til klassifikatoren.
    pub fn resolve(&self, utterance: &str) -> Option<ActionDescriptor> {
        let normalized = utterance.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        for command in &self.commands {
            for phrase in &command.phrases {
                match phrase {
                    CompiledPhrase::Literal(template) => {
                        if *template == normalized {
                            return Some(ActionDescriptor {
                                command: command.name.clone(),
                                kind: command.kind,
                                target: command.target.clone(),
                                slots: Vec::new(),
                            });
                        }
                    }
                    CompiledPhrase::Template { regex, slot_names } => {
                        if let Some(caps) = regex.captures(&normalized) {
                            let slots = slot_names
                                .iter()
                                .enumerate()
                                .map(|(i, name)| {
                                    let value = caps
                                        .get(i + 1)
                                        .map(|m| m.as_str().trim().to_string())
                                        .unwrap_or_default();
                                    (name.clone(), value)
                                })
                                .collect();
                            return Some(ActionDescriptor {
                                command: command.name.clone(),
                                kind: command.kind,
                                target: command.target.clone(),
                                slots,
                            });
                        }
                    }
                }
            }
        }
        None
    }
}

/// Kompilerer én normaliseret frase.
///
/// Uden pladser: literal. Med pladser: hvert `{navn}` bliver `(.*?)`,
/// alt andet escapes, og udtrykket forankres i begge ender.
fn compile_phrase(normalized: &str, marker: &Regex) -> Option<CompiledPhrase> {
    if !marker.is_match(normalized) {
        return Some(CompiledPhrase::Literal(normalized.to_string()));
    }
    let mut pattern = String::from("^");
    let mut slot_names = Vec::new();
    let mut last_end = 0;
    for caps in marker.captures_iter(normalized) {
        let whole = caps.get(0).unwrap();
        pattern.push_str(&regex::escape(&normalized[last_end..whole.start()]));
        pattern.push_str("(.*?)");
        slot_names.push(caps[1].to_string());
        last_end = whole.end();
    }
    pattern.push_str(&regex::escape(&normalized[last_end..]));
    pattern.push('$');
    match Regex::new(&pattern) {
        Ok(regex) => Some(CompiledPhrase::Template { regex, slot_names }),
        Err(e) => {
            tracing::warn!(error = %e, "Regexkompilering fejlede for fraseskabelon");
            None
        }
    }
}
