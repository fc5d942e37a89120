//! # Forbehandling — Dansk Tokenisering og Stopord
//!
//! Ren funktion fra rå ytring til tokenstrøm:
//!
//! 1. Unicode-normalisering (NFC) så komponerede og dekomponerede
//!    æ/ø/å-varianter behandles ens.
//! 2. Små bogstaver.
//! 3. Opdeling på alt der ikke er alfanumerisk.
//! 4. Fjernelse af danske stopord.
//!
//! Samme input giver altid samme output — forbehandlingen er begrebsligt
//! en del af klassifikator-artefakterne, så en genindlæst klassifikator
//! anvender nøjagtig samme trin som den blev trænet med.

use unicode_normalization::UnicodeNormalization;

/// Danske stopord. Fjernes før vektorisering — de bærer ingen
/// intent-information men dominerer frekvensstatistikken.
pub const DANISH_STOPWORDS: &[&str] = &[
    "ad", "af", "alle", "alt", "anden", "at", "blev", "blive", "bliver", "da", "de", "dem", "den",
    "denne", "der", "deres", "det", "dette", "dig", "din", "disse", "dog", "du", "efter", "eller",
    "en", "end", "er", "et", "for", "fra", "ham", "han", "hans", "har", "havde", "have", "hende",
    "hendes", "her", "hos", "hun", "hvis", "hvor", "i", "ikke", "ind", "jeg", "jer", "jo", "kunne",
    "man", "mange", "med", "meget", "men", "mig", "min", "mine", "mit", "mod", "ned", "noget",
    "nogle", "nu", "når", "og", "også", "om", "op", "os", "over", "selv", "sig", "sin", "sine",
    "sit", "skulle", "som", "sådan", "thi", "til", "ud", "under", "var", "vi", "vil", "ville",
    "vor", "været",
];

/// Forbehandler en ytring til en tokenstrøm.
///
/// Returnerer en tom liste hvis ytringen kun består af stopord,
/// tegnsætning eller ingenting — kalderen afgør hvad det betyder
/// (klassifikatoren logger den og svarer "ukendt").
pub fn preprocess(text: &str) -> Vec<String> {
    let normalized: String = text.nfc().collect::<String>().to_lowercase();
    normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .filter(|token| !DANISH_STOPWORDS.contains(token))
        .map(|token| token.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_splits() {
        assert_eq!(preprocess("Hvad ER Klokken?"), vec!["hvad", "klokken"]);
    }

    #[test]
    fn removes_stopwords() {
        // "er", "det", "i" er stopord; "hvordan", "vejret", "dag" bevares.
        assert_eq!(
            preprocess("hvordan er vejret i dag"),
            vec!["hvordan", "vejret", "dag"]
        );
    }

    #[test]
    fn danish_letters_survive() {
        assert_eq!(preprocess("Åbn sætningen"), vec!["åbn", "sætningen"]);
    }

    #[test]
    fn punctuation_only_yields_empty() {
        assert!(preprocess("?!...").is_empty());
        assert!(preprocess("").is_empty());
    }

    #[test]
    fn stopwords_only_yields_empty() {
        assert!(preprocess("og det er jo").is_empty());
    }

    #[test]
    fn deterministic() {
        let a = preprocess("Gem en note om købe mælk");
        let b = preprocess("Gem en note om købe mælk");
        assert_eq!(a, b);
    }

    #[test]
    fn nfc_normalization_unifies_variants() {
        // "å" komponeret vs. "a" + kombinerende ring.
        let composed = "\u{00e5}bn";
        let decomposed = "a\u{030a}bn";
        assert_eq!(preprocess(composed), preprocess(decomposed));
    }
}
