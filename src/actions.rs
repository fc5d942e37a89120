//! # Handlinger — Afsendelse og den Indbyggede Danske Handlingstabel
//!
//! To lag:
//!
//! 1. [`ActionDispatcher`] — udfører en [`ActionDescriptor`] fra
//!    mønsteropløseren, efter art:
//!
//!    | Art | Udførelse |
//!    |-----|-----------|
//!    | `function` | opslag i et eksplicit register af navngivne kald |
//!    | `script` | underproces med pladsværdier som positionelle argumenter |
//!    | `application` | styresystemets åbner (`xdg-open`/`open`) |
//!
//!    Mål navngives ved streng i konfigurationen, men opløses mod et
//!    register bygget ved opstart — aldrig ved refleksion — så mængden
//!    af opnåelige handlinger kan efterses ét sted.
//!
//! 2. [`BuiltinActions`] — den indbyggede tabel af danske intents
//!    (klokken, dato, joke, hjemmeside, note, hilsen, …) som
//!    orkestratoren sender klassificerede intents til.
//!
//! Ingen undtagelse slipper ud af nogen af lagene: enhver fejl bliver
//! til en dansk fejlfrase plus en loglinje.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use chrono::{Datelike, Local, Timelike};
use futures_util::future::BoxFuture;

use crate::patterns::{ActionDescriptor, ActionKind};

/// Maks. ventetid på en underproces; overskridelse behandles som fejl.
const SUBPROCESS_TIMEOUT: Duration = Duration::from_secs(30);

/// Maks. længde af den stdout-linje der citeres i svaret.
const STDOUT_SNIPPET_LEN: usize = 120;

/// Et navngivet kald i registret: pladsværdier ind, svartekst ud.
/// Returnerer en future så både almindelige og ventende kald kan
/// udtrykkes ensartet — afsenderen awaiter altid.
pub type ActionFn =
    Arc<dyn Fn(Vec<(String, String)>) -> BoxFuture<'static, Result<String>> + Send + Sync>;

/// Afsenderen af mønsteropløste handlinger.
pub struct ActionDispatcher {
    registry: HashMap<String, ActionFn>,
}

impl ActionDispatcher {
    /// Tomt register; kaldene registreres eksplicit ved opstart.
    pub fn new() -> Self {
        Self {
            registry: HashMap::new(),
        }
    }

    /// Registrerer et navngivet kald. Navnet er det konfigurationen
    /// peger på i `action_details`.
    pub fn register(&mut self, name: &str, action: ActionFn) {
        self.registry.insert(name.to_string(), action);
    }

    /// Udfører en handlingsbeskrivelse og giver altid en svartekst —
    /// fejl konverteres til danske fejlfraser og logges.
    pub async fn dispatch(&self, action: &ActionDescriptor) -> String {
        match action.kind {
            ActionKind::Function => self.dispatch_function(action).await,
            ActionKind::Script => self.dispatch_script(action).await,
            ActionKind::Application => dispatch_application(&action.target),
        }
    }

    async fn dispatch_function(&self, action: &ActionDescriptor) -> String {
        let Some(callable) = self.registry.get(&action.target) else {
            tracing::warn!(target = %action.target, command = %action.command, "Funktionsmål ikke registreret");
            return "Den handling kender jeg ikke endnu.".to_string();
        };
        match callable(action.slots.clone()).await {
            Ok(reply) if reply.trim().is_empty() => "Det er gjort.".to_string(),
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(target = %action.target, error = ?e, "Funktionskald fejlede");
                "Der gik noget galt, da jeg prøvede at udføre handlingen.".to_string()
            }
        }
    }

    async fn dispatch_script(&self, action: &ActionDescriptor) -> String {
        self.dispatch_script_with_timeout(action, SUBPROCESS_TIMEOUT)
            .await
    }

    async fn dispatch_script_with_timeout(
        &self,
        action: &ActionDescriptor,
        timeout: Duration,
    ) -> String {
        let path = Path::new(&action.target);
        if !path.exists() {
            tracing::warn!(script = %action.target, "Scriptet findes ikke");
            return "Jeg kunne ikke finde scriptet til den kommando.".to_string();
        }

        let mut command = tokio::process::Command::new(path);
        // Ved timeout droppes output-futuren; uden kill_on_drop ville
        // underprocessen leve videre som forældreløs.
        command.kill_on_drop(true);
        for (_, value) in &action.slots {
            command.arg(value);
        }

        let output = match tokio::time::timeout(timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::error!(script = %action.target, error = %e, "Kunne ikke starte scriptet");
                return "Kommandoen fejlede. Jeg har noteret fejlen i loggen.".to_string();
            }
            Err(_) => {
                tracing::error!(script = %action.target, timeout_s = timeout.as_secs(), "Script-timeout");
                return "Kommandoen tog for lang tid og blev afbrudt.".to_string();
            }
        };

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let snippet = stdout
                .lines()
                .next()
                .map(|line| truncate(line.trim(), STDOUT_SNIPPET_LEN))
                .unwrap_or_default();
            if snippet.is_empty() {
                format!("Kommandoen {} blev udført.", action.command)
            } else {
                format!("Kommandoen {} blev udført. {}", action.command, snippet)
            }
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(
                script = %action.target,
                code = output.status.code().unwrap_or(-1),
                stderr = %stderr.trim(),
                "Script afsluttede med fejl"
            );
            "Kommandoen fejlede. Jeg har noteret fejlen i loggen.".to_string()
        }
    }
}

impl Default for ActionDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Beder styresystemet åbne et program eller en URL. Svaret afgives
/// straks; selve åbningen sker i baggrunden.
fn dispatch_application(target: &str) -> String {
    if let Err(e) = open_with_os(target) {
        tracing::error!(target, error = %e, "Kunne ikke åbne programmet");
        return "Jeg kunne ikke åbne det. Der opstod en fejl.".to_string();
    }
    format!("Jeg prøver at åbne {target}.")
}

#[cfg(target_os = "macos")]
fn open_with_os(target: &str) -> Result<()> {
    std::process::Command::new("open")
        .arg(target)
        .spawn()
        .context("Kunne ikke starte 'open'")?;
    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn open_with_os(target: &str) -> Result<()> {
    std::process::Command::new("xdg-open")
        .arg(target)
        .spawn()
        .context("Kunne ikke starte 'xdg-open'")?;
    Ok(())
}

/// Klipper en streng ved tegngrænse.
fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

// ─── Den indbyggede handlingstabel ───────────────────────────────

/// Ti danske jokes, roteret deterministisk med turtælleren.
const JOKES: &[&str] = &[
    "Hvorfor gik computeren til lægen? Den havde en virus!",
    "Hvad kalder man en gruppe musikalske hvaler? Et orkester!",
    "Hvorfor kunne skelettet ikke gå til festen? Det havde ingen krop at gå med!",
    "Hvorfor er bier så gode til at lave honning? Fordi de er bie-specialister!",
    "Hvad kaldte vikingerne deres e-mails? Plyndr-e-mails!",
    "Hvad sagde den ene væg til den anden væg? Vi mødes i hjørnet!",
    "Hvorfor var tallerkenerne så trætte? Fordi de havde været oppe hele natten!",
    "Hvad får man hvis man krydser en elefant med en kænguru? Store huller i hele Australien!",
    "Hvad laver en citron når den keder sig? Den sur-fer på internettet!",
    "Hvorfor var blæksprutten så god til at træne? Den havde mange arme at løfte med!",
];

const ABOUT_YOU: &[&str] = &[
    "Jeg er Jarvis, din danske AI-assistent. Jeg kan hjælpe dig med at svare på spørgsmål, finde information og udføre simple opgaver.",
    "Mit navn er Jarvis, og jeg er en assistent, der kører lokalt på din computer. Jeg er designet til at svare på dansk og hjælpe med forskellige opgaver.",
    "Jeg hedder Jarvis og er din personlige assistent. Jeg forstår dansk og kan hjælpe med daglige opgaver og svare på spørgsmål.",
    "Jeg er en dansk assistent ved navn Jarvis. Jeg kan hjælpe med tidsstyring, noter, jokes og samtaler.",
];

const UNKNOWN_REPLIES: &[&str] = &[
    "Det forstod jeg ikke helt. Kan du omformulere dit spørgsmål?",
    "Jeg er ikke sikker på, hvad du mener. Prøv at spørge på en anden måde.",
    "Beklager, men jeg forstod ikke det. Kan du prøve at formulere det anderledes?",
    "Hmm, det er jeg ikke helt med på. Kan du være mere specifik?",
];

/// Den faste frase når hverken klassifikator eller sprogmodel kan
/// hjælpe — pipelinens absolutte bund.
pub const FALLBACK_REPLY: &str =
    "Jeg forstod desværre ikke det. Prøv at spørge mig om noget andet, f.eks. tiden, vejret eller en joke.";

/// Danske månedsnavne, indekseret 1–12.
const MONTHS: &[&str] = &[
    "januar", "februar", "marts", "april", "maj", "juni", "juli", "august", "september",
    "oktober", "november", "december",
];

/// Danske ugedagsnavne, mandag først.
const WEEKDAYS: &[&str] = &[
    "mandag", "tirsdag", "onsdag", "torsdag", "fredag", "lørdag", "søndag",
];

/// Den indbyggede tabel af intent-handlers med danske svar.
pub struct BuiltinActions {
    notes_path: PathBuf,
}

impl BuiltinActions {
    pub fn new(notes_path: impl Into<PathBuf>) -> Self {
        Self {
            notes_path: notes_path.into(),
        }
    }

    /// Udfører en klassificeret intent. `turn` driver den deterministiske
    /// rotation af svarpuljer. `None` betyder at tabellen ikke kender
    /// intenten — orkestratoren prøver så korpussets svarfraser.
    pub fn execute(&self, intent: &str, utterance: &str, turn: u64) -> Option<String> {
        let reply = match intent {
            "get_time" => get_time(),
            "get_date" => get_date(),
            "tell_joke" => rotate(JOKES, turn),
            "greeting" => greeting(),
            "about_you" => rotate(ABOUT_YOU, turn),
            "goodbye" => {
                "Farvel! Det var hyggeligt at snakke med dig. Vi ses igen senere.".to_string()
            }
            "get_help" => {
                "Jeg kan fortælle dig klokken og datoen, åbne hjemmesider som YouTube og Google, \
                 gemme noter, fortælle jokes og have en samtale med dig. Hvad vil du gerne have \
                 hjælp med?"
                    .to_string()
            }
            "open_website" => self.open_website(utterance),
            "save_note" => self.save_note(utterance),
            "unknown" => rotate(UNKNOWN_REPLIES, turn),
            _ => return None,
        };
        Some(reply)
    }

    /// Gemmer en tidsstemplet note. Fejl bliver til en dansk fejlfrase —
    /// brugeren skal vide at noten måske ikke overlever en genstart.
    fn save_note(&self, text: &str) -> String {
        match self.append_note(text) {
            Ok(()) => format!("Jeg har gemt din note: '{text}'."),
            Err(e) => {
                tracing::error!(error = %e, "Kunne ikke gemme noten");
                "Jeg kunne ikke gemme noten. Prøv igen.".to_string()
            }
        }
    }

    fn append_note(&self, text: &str) -> Result<()> {
        use std::io::Write as _;
        if let Some(parent) = self.notes_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Kunne ikke oprette {}", parent.display()))?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.notes_path)
            .with_context(|| format!("Kunne ikke åbne {}", self.notes_path.display()))?;
        let stamp = Local::now().format("%Y-%m-%d %H:%M");
        writeln!(file, "[{stamp}] {text}").context("Kunne ikke skrive noten")?;
        Ok(())
    }

    /// Åbner en kendt hjemmeside nævnt i ytringen.
    fn open_website(&self, utterance: &str) -> String {
        let Some((url, reply)) = website_for(utterance) else {
            return "Jeg ved ikke, hvordan jeg skal åbne den side. Prøv 'youtube' eller 'google'."
                .to_string();
        };
        if let Err(e) = open_with_os(url) {
            tracing::error!(url, error = %e, "Kunne ikke åbne hjemmesiden");
            return "Jeg kunne ikke åbne hjemmesiden. Der opstod en fejl.".to_string();
        }
        reply.to_string()
    }
}

/// Mapper en ytring til (URL, dansk svar) for de kendte sider.
/// "dr" matches kun som selvstændigt ord — som delstreng rammer det
/// almindelige danske ord ("adressen", "hvordan").
fn website_for(utterance: &str) -> Option<(&'static str, &'static str)> {
    let lower = utterance.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.contains(&"youtube") {
        Some((
            "https://www.youtube.com",
            "Jeg åbner YouTube for dig. Hvad vil du se?",
        ))
    } else if tokens.contains(&"google") {
        Some((
            "https://www.google.com",
            "Jeg åbner Google. Hvad vil du søge efter?",
        ))
    } else if tokens.contains(&"dr") || lower.contains("nyheder") {
        Some((
            "https://www.dr.dk",
            "Jeg åbner DR for dig. Vil du se nyheder eller noget andet?",
        ))
    } else {
        None
    }
}

fn rotate(pool: &[&str], turn: u64) -> String {
    pool[(turn as usize) % pool.len()].to_string()
}

fn get_time() -> String {
    let now = Local::now();
    let (hour, minute) = (now.hour(), now.minute());
    if minute == 0 {
        format!("Klokken er præcis {hour}")
    } else {
        format!("Klokken er {hour} og {minute} minutter")
    }
}

fn get_date() -> String {
    let now = Local::now();
    let weekday = WEEKDAYS[now.weekday().num_days_from_monday() as usize];
    let month = MONTHS[now.month0() as usize];
    format!(
        "I dag er det {weekday} den {}. {month} {}",
        now.day(),
        now.year()
    )
}

fn greeting() -> String {
    match Local::now().hour() {
        5..=9 => "Godmorgen! Hvordan har du det i dag?",
        10..=11 => "God formiddag! Hvordan går det?",
        12..=17 => "God eftermiddag! Hvordan kan jeg hjælpe dig?",
        18..=21 => "Godaften! Hvordan går det med dig?",
        _ => "Godaften! Det er sent. Hvad kan jeg hjælpe med?",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::ActionKind;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{name}-{}", uuid::Uuid::new_v4()))
    }

    // ─── indbygget tabel ───────────────────────────────────────

    #[test]
    fn time_reply_mentions_the_clock() {
        let b = BuiltinActions::new(temp_path("noter"));
        let reply = b.execute("get_time", "hvad er klokken", 0).unwrap();
        assert!(reply.starts_with("Klokken er"));
    }

    #[test]
    fn date_reply_is_danish() {
        let b = BuiltinActions::new(temp_path("noter"));
        let reply = b.execute("get_date", "hvad er datoen", 0).unwrap();
        assert!(reply.starts_with("I dag er det"));
        assert!(MONTHS.iter().any(|m| reply.contains(m)));
        assert!(WEEKDAYS.iter().any(|d| reply.contains(d)));
    }

    #[test]
    fn jokes_rotate_deterministically() {
        let b = BuiltinActions::new(temp_path("noter"));
        let first = b.execute("tell_joke", "fortæl en joke", 0).unwrap();
        let second = b.execute("tell_joke", "fortæl en joke", 1).unwrap();
        let wrapped = b.execute("tell_joke", "fortæl en joke", 10).unwrap();
        assert_ne!(first, second);
        assert_eq!(first, wrapped);
    }

    #[test]
    fn unknown_intent_gives_none() {
        let b = BuiltinActions::new(temp_path("noter"));
        assert!(b.execute("get_weather", "bliver det regn", 0).is_none());
    }

    #[test]
    fn save_note_appends_timestamped_line() {
        let path = temp_path("noter").join("noter.txt");
        let b = BuiltinActions::new(&path);
        let reply = b.execute("save_note", "købe mælk", 0).unwrap();
        assert!(reply.contains("købe mælk"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("købe mælk"));
        assert!(content.starts_with('['));
    }

    #[test]
    fn website_mapping() {
        assert!(website_for("åbn youtube").unwrap().0.contains("youtube.com"));
        assert!(website_for("kan du åbne google").unwrap().0.contains("google.com"));
        assert!(website_for("vis mig nyhederne").unwrap().0.contains("dr.dk"));
        assert!(website_for("åbn altavista").is_none());
    }

    #[test]
    fn website_dr_requires_whole_word() {
        assert!(website_for("åbn dr").unwrap().0.contains("dr.dk"));
        assert!(website_for("hvad er adressen").is_none());
        assert!(website_for("hvordan åbner jeg en side").is_none());
    }

    // ─── afsenderen ────────────────────────────────────────────

    fn descriptor(kind: ActionKind, target: &str, slots: Vec<(&str, &str)>) -> ActionDescriptor {
        ActionDescriptor {
            command: "test_cmd".to_string(),
            kind,
            target: target.to_string(),
            slots: slots
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[tokio::test]
    async fn function_dispatch_passes_slots() {
        let mut d = ActionDispatcher::new();
        d.register(
            "echo_site",
            Arc::new(|slots: Vec<(String, String)>| {
                Box::pin(async move {
                    let site = slots
                        .iter()
                        .find(|(name, _)| name == "site")
                        .map(|(_, v)| v.clone())
                        .unwrap_or_default();
                    Ok(format!("Åbner {site}"))
                })
            }),
        );
        let action = descriptor(ActionKind::Function, "echo_site", vec![("site", "youtube")]);
        assert_eq!(d.dispatch(&action).await, "Åbner youtube");
    }

    #[tokio::test]
    async fn unregistered_function_degrades() {
        let d = ActionDispatcher::new();
        let action = descriptor(ActionKind::Function, "findes_ikke", vec![]);
        let reply = d.dispatch(&action).await;
        assert_eq!(reply, "Den handling kender jeg ikke endnu.");
    }

    #[tokio::test]
    async fn failing_function_becomes_danish_error() {
        let mut d = ActionDispatcher::new();
        d.register(
            "fejler",
            Arc::new(|_| Box::pin(async { anyhow::bail!("kaput") })),
        );
        let action = descriptor(ActionKind::Function, "fejler", vec![]);
        let reply = d.dispatch(&action).await;
        assert!(reply.contains("gik noget galt"));
    }

    #[tokio::test]
    async fn empty_function_reply_gets_default() {
        let mut d = ActionDispatcher::new();
        d.register("stum", Arc::new(|_| Box::pin(async { Ok(String::new()) })));
        let action = descriptor(ActionKind::Function, "stum", vec![]);
        assert_eq!(d.dispatch(&action).await, "Det er gjort.");
    }

    #[tokio::test]
    async fn missing_script_degrades() {
        let d = ActionDispatcher::new();
        let action = descriptor(ActionKind::Script, "/findes/ikke/script.sh", vec![]);
        let reply = d.dispatch(&action).await;
        assert!(reply.contains("kunne ikke finde scriptet"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn script_success_quotes_first_stdout_line() {
        use std::os::unix::fs::PermissionsExt;
        let path = temp_path("script");
        std::fs::write(&path, "#!/bin/sh\necho lyset er taendt\necho linje to\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        let d = ActionDispatcher::new();
        let action = descriptor(ActionKind::Script, path.to_str().unwrap(), vec![]);
        let reply = d.dispatch(&action).await;
        assert!(reply.contains("test_cmd"));
        assert!(reply.contains("lyset er taendt"));
        assert!(!reply.contains("linje to"));
        let _ = std::fs::remove_file(&path);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn script_failure_becomes_danish_error() {
        use std::os::unix::fs::PermissionsExt;
        let path = temp_path("script");
        std::fs::write(&path, "#!/bin/sh\necho fejl >&2\nexit 1\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        let d = ActionDispatcher::new();
        let action = descriptor(ActionKind::Script, path.to_str().unwrap(), vec![]);
        let reply = d.dispatch(&action).await;
        assert!(reply.contains("Kommandoen fejlede"));
        let _ = std::fs::remove_file(&path);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timed_out_script_is_killed() {
        use std::os::unix::fs::PermissionsExt;
        let dir = temp_path("script-dir");
        std::fs::create_dir_all(&dir).unwrap();
        let marker = dir.join("markoer");
        let path = dir.join("langsom.sh");
        std::fs::write(
            &path,
            format!("#!/bin/sh\nsleep 2\ntouch {}\n", marker.display()),
        )
        .unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        let d = ActionDispatcher::new();
        let action = descriptor(ActionKind::Script, path.to_str().unwrap(), vec![]);
        let reply = d
            .dispatch_script_with_timeout(&action, Duration::from_millis(200))
            .await;
        assert!(reply.contains("for lang tid"));
        // Et overlevende script ville nå at skrive markøren her.
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!marker.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("blæksprutte", 4), "blæk");
        assert_eq!(truncate("kort", 120), "kort");
    }
}
