//! # TF-IDF Vektorisering
//!
//! Omsætter tokenstrømme til vægtede featurevektorer:
//!
//! - **Termer**: unigrammer og bigrammer.
//! - **Dokumentfrekvens**: termer i færre end 2 dokumenter eller i mere
//!   end 90 % af dokumenterne forkastes.
//! - **Termfrekvens**: sublineær, `1 + ln(tf)`.
//! - **IDF**: udglattet, `ln((1+n)/(1+df)) + 1`.
//! - **Norm**: L2 per dokument.
//!
//! Ordforrådet sorteres alfabetisk efter tilpasning, så samme korpus
//! altid giver samme featureindeks — determinisme er et krav for at
//! artefakterne kan genindlæses og sammenlignes på tværs af kørsler.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Tilpasset TF-IDF-vektorisering. Serialiseres som et af de tre
/// klassifikator-artefakter; `index` genopbygges efter indlæsning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// Ordforrådet i alfabetisk rækkefølge; positionen er featureindekset.
    vocabulary: Vec<String>,
    /// IDF-vægt per term, parallelt med `vocabulary`.
    idf: Vec<f64>,
    /// Opslagsindeks term → position. Genopbygges efter deserialisering.
    #[serde(skip)]
    index: HashMap<String, usize>,
}

/// Unigrammer plus bigrammer (bigrammer sammenføjet med mellemrum,
/// samme form som de står i ordforrådet).
fn ngrams(tokens: &[String]) -> Vec<String> {
    let mut terms = Vec::with_capacity(tokens.len() * 2);
    terms.extend(tokens.iter().cloned());
    for pair in tokens.windows(2) {
        terms.push(format!("{} {}", pair[0], pair[1]));
    }
    terms
}

impl TfidfVectorizer {
    /// Tilpasser vektoriseringen til et korpus af tokenstrømme.
    ///
    /// `min_df` og `max_df_ratio` beskærer ordforrådet; et korpus hvor
    /// intet term overlever beskæringen giver et tomt ordforråd, og alle
    /// featurevektorer bliver tomme (klassifikatoren falder da tilbage
    /// på sine interceptled).
    pub fn fit(documents: &[Vec<String>], min_df: usize, max_df_ratio: f64) -> Self {
        let n_docs = documents.len();

        // Dokumentfrekvens: i hvor mange dokumenter optræder termen?
        let mut df: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            let unique: HashSet<String> = ngrams(doc).into_iter().collect();
            for term in unique {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        let max_df = (max_df_ratio * n_docs as f64).floor() as usize;
        let mut vocabulary: Vec<String> = df
            .iter()
            .filter(|(_, &count)| count >= min_df && count <= max_df.max(min_df))
            .map(|(term, _)| term.clone())
            .collect();
        vocabulary.sort();

        let idf = vocabulary
            .iter()
            .map(|term| {
                let count = df[term] as f64;
                ((1.0 + n_docs as f64) / (1.0 + count)).ln() + 1.0
            })
            .collect();

        let mut vectorizer = Self {
            vocabulary,
            idf,
            index: HashMap::new(),
        };
        vectorizer.rebuild_index();
        tracing::debug!(
            vocab = vectorizer.vocabulary.len(),
            docs = n_docs,
            "TF-IDF tilpasset"
        );
        vectorizer
    }

    /// Genopbygger opslagsindekset. Skal kaldes efter deserialisering.
    pub fn rebuild_index(&mut self) {
        self.index = self
            .vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();
    }

    /// Antal features (ordforrådets størrelse).
    pub fn dim(&self) -> usize {
        self.vocabulary.len()
    }

    /// Vektoriserer én tokenstrøm: sublineær tf × idf, L2-normaliseret.
    pub fn transform(&self, tokens: &[String]) -> Vec<f64> {
        let mut vector = vec![0.0; self.vocabulary.len()];
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for term in ngrams(tokens) {
            if let Some(&i) = self.index.get(&term) {
                *counts.entry(i).or_insert(0) += 1;
            }
        }
        for (i, count) in counts {
            vector[i] = (1.0 + (count as f64).ln()) * self.idf[i];
        }
        let norm: f64 = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }

    /// Vektoriserer et helt korpus parallelt.
    pub fn transform_batch(&self, documents: &[Vec<String>]) -> Vec<Vec<f64>> {
        documents.par_iter().map(|doc| self.transform(doc)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn small_corpus() -> Vec<Vec<String>> {
        vec![
            toks(&["hvad", "klokken"]),
            toks(&["hvad", "klokken", "lige"]),
            toks(&["fortæl", "joke"]),
            toks(&["fortæl", "sjov", "joke"]),
        ]
    }

    #[test]
    fn min_df_prunes_rare_terms() {
        let v = TfidfVectorizer::fit(&small_corpus(), 2, 0.9);
        // "hvad", "klokken", "fortæl", "joke" og bigrammet "hvad klokken"
        // optræder i ≥ 2 dokumenter; "lige", "sjov" m.fl. forkastes.
        let vec_rare = v.transform(&toks(&["lige"]));
        assert!(vec_rare.iter().all(|&x| x == 0.0));
        let vec_common = v.transform(&toks(&["klokken"]));
        assert!(vec_common.iter().any(|&x| x > 0.0));
    }

    #[test]
    fn l2_normalized() {
        let v = TfidfVectorizer::fit(&small_corpus(), 2, 0.9);
        let vec = v.transform(&toks(&["hvad", "klokken"]));
        let norm: f64 = vec.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9, "norm var {norm}");
    }

    #[test]
    fn bigrams_are_features() {
        let v = TfidfVectorizer::fit(&small_corpus(), 2, 0.9);
        let with_bigram = v.transform(&toks(&["hvad", "klokken"]));
        let without = v.transform(&toks(&["klokken", "hvad"]));
        // Ombyttet rækkefølge mister bigrammet "hvad klokken".
        assert_ne!(with_bigram, without);
    }

    #[test]
    fn deterministic_vocabulary() {
        let a = TfidfVectorizer::fit(&small_corpus(), 2, 0.9);
        let b = TfidfVectorizer::fit(&small_corpus(), 2, 0.9);
        assert_eq!(a.vocabulary, b.vocabulary);
        assert_eq!(a.idf, b.idf);
    }

    #[test]
    fn serde_roundtrip_matches_after_reindex() {
        let v = TfidfVectorizer::fit(&small_corpus(), 2, 0.9);
        let json = serde_json::to_string(&v).unwrap();
        let mut reloaded: TfidfVectorizer = serde_json::from_str(&json).unwrap();
        reloaded.rebuild_index();
        assert_eq!(
            v.transform(&toks(&["hvad", "klokken"])),
            reloaded.transform(&toks(&["hvad", "klokken"]))
        );
    }

    #[test]
    fn empty_vocabulary_gives_empty_vectors() {
        // Alle termer optræder i netop ét dokument → min_df 2 tømmer alt.
        let docs = vec![toks(&["hej"]), toks(&["farvel"])];
        let v = TfidfVectorizer::fit(&docs, 2, 0.9);
        assert_eq!(v.dim(), 0);
        assert!(v.transform(&toks(&["hej"])).is_empty());
    }
}
