//! # Træneren — Fra Korpus til Artefakter
//!
//! Én deterministisk funktion: to parallelle lister (ytringer, mærkater)
//! ind, en artefakt-trippel ud.
//!
//! ## Holdout og Metrikker
//!
//! Når mere end én mærkat er til stede med mindst to eksempler hver,
//! holdes ~20 % ud stratificeret per mærkat (de sidste `max(1, n/5)`
//! eksempler af hver — fast udvælgelse, ingen tilfældighed), modellen
//! tilpasses resten, og per-mærkat præcision/recall/F1 logges til
//! offline-inspektion. Kan der ikke stratificeres (én mærkat i alt,
//! eller en mærkat med ét eksempel), tilpasses hele korpusset, og der
//! logges en advarsel.
//!
//! Træningsfejl efterlader altid en eventuel allerede indlæst
//! klassifikator urørt — træneren rører aldrig selv ved singletonen.

use anyhow::{bail, Result};
use uuid::Uuid;

use super::classifier::Artifacts;
use super::model::LogisticRegression;
use super::preprocess::preprocess;
use super::vectorizer::TfidfVectorizer;

/// TF-IDF-beskæring, jf. modulets dokumentation.
const MIN_DF: usize = 2;
const MAX_DF_RATIO: f64 = 0.9;

/// Træner en ny artefakt-trippel fra to parallelle lister.
///
/// ## Fejl
///
/// Fejler på et tomt korpus eller lister af forskellig længde.
pub fn train(texts: &[String], labels: &[String]) -> Result<Artifacts> {
    if texts.is_empty() {
        bail!("Korpusset er tomt, intet at træne på");
    }
    if texts.len() != labels.len() {
        bail!(
            "Parallelle lister i utakt: {} ytringer mod {} mærkater",
            texts.len(),
            labels.len()
        );
    }

    // Ordnet mærkatliste: sorteret og dedupleret. Rækkefølgen her er
    // bindende for argmax-ligebrud i forudsigelsen.
    let mut label_list: Vec<String> = labels.to_vec();
    label_list.sort();
    label_list.dedup();
    let label_index = |label: &str| label_list.iter().position(|l| l == label).unwrap();

    let documents: Vec<Vec<String>> = texts.iter().map(|t| preprocess(t)).collect();
    let y: Vec<usize> = labels.iter().map(|l| label_index(l)).collect();

    // Stratificeret holdout, hvis det kan lade sig gøre.
    let mut class_counts = vec![0usize; label_list.len()];
    for &label in &y {
        class_counts[label] += 1;
    }
    let stratifiable = label_list.len() > 1 && class_counts.iter().all(|&c| c >= 2);

    let (train_idx, holdout_idx) = if stratifiable {
        split_stratified(&y, label_list.len())
    } else {
        tracing::warn!(
            labels = label_list.len(),
            examples = texts.len(),
            "Kan ikke stratificere, tilpasser hele korpusset uden holdout"
        );
        ((0..texts.len()).collect(), Vec::new())
    };

    let train_docs: Vec<Vec<String>> = train_idx.iter().map(|&i| documents[i].clone()).collect();
    let train_y: Vec<usize> = train_idx.iter().map(|&i| y[i]).collect();

    let mut vectorizer = TfidfVectorizer::fit(&train_docs, MIN_DF, MAX_DF_RATIO);
    if vectorizer.dim() == 0 {
        // Så lille et korpus at intet term når dokumentfrekvens 2.
        tracing::warn!("Tomt ordforråd ved min_df 2, falder tilbage til min_df 1");
        vectorizer = TfidfVectorizer::fit(&train_docs, 1, MAX_DF_RATIO);
    }
    let features = vectorizer.transform_batch(&train_docs);
    let model = LogisticRegression::fit(&features, &train_y, label_list.len());

    if !holdout_idx.is_empty() {
        log_holdout_report(&vectorizer, &model, &documents, &y, &holdout_idx, &label_list);
    }

    let run_id = Uuid::new_v4();
    tracing::info!(
        run_id = %run_id,
        examples = train_idx.len(),
        holdout = holdout_idx.len(),
        labels = label_list.len(),
        features = vectorizer.dim(),
        "Træning gennemført"
    );

    Ok(Artifacts {
        run_id,
        vectorizer,
        model,
        labels: label_list,
    })
}

/// Deler indekserne i (træning, holdout): de sidste `max(1, n/5)`
/// eksempler af hver mærkat går i holdout. Fast og reproducerbart.
fn split_stratified(y: &[usize], n_classes: usize) -> (Vec<usize>, Vec<usize>) {
    let mut per_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (i, &label) in y.iter().enumerate() {
        per_class[label].push(i);
    }
    let mut train = Vec::new();
    let mut holdout = Vec::new();
    for indices in per_class {
        let k = (indices.len() / 5).max(1);
        let cut = indices.len() - k;
        train.extend_from_slice(&indices[..cut]);
        holdout.extend_from_slice(&indices[cut..]);
    }
    train.sort();
    holdout.sort();
    (train, holdout)
}

/// Evaluerer på holdout-sættet og logger per-mærkat metrikker.
fn log_holdout_report(
    vectorizer: &TfidfVectorizer,
    model: &LogisticRegression,
    documents: &[Vec<String>],
    y: &[usize],
    holdout_idx: &[usize],
    label_list: &[String],
) {
    let n = label_list.len();
    // Forvirringstællere: [sand][forudsagt].
    let mut confusion = vec![vec![0usize; n]; n];
    for &i in holdout_idx {
        let features = vectorizer.transform(&documents[i]);
        let probs = model.predict_proba(&features);
        let mut best = 0;
        for (c, &p) in probs.iter().enumerate() {
            if p > probs[best] {
                best = c;
            }
        }
        confusion[y[i]][best] += 1;
    }

    let mut correct = 0;
    for (c, label) in label_list.iter().enumerate() {
        let tp = confusion[c][c];
        correct += tp;
        let support: usize = confusion[c].iter().sum();
        let predicted: usize = (0..n).map(|t| confusion[t][c]).sum();
        let precision = if predicted > 0 {
            tp as f64 / predicted as f64
        } else {
            0.0
        };
        let recall = if support > 0 {
            tp as f64 / support as f64
        } else {
            0.0
        };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        tracing::info!(
            label = %label,
            precision = format!("{precision:.2}"),
            recall = format!("{recall:.2}"),
            f1 = format!("{f1:.2}"),
            support,
            "Holdout-metrik"
        );
    }
    let accuracy = correct as f64 / holdout_idx.len() as f64;
    tracing::info!(
        holdout = holdout_idx.len(),
        accuracy = format!("{accuracy:.2}"),
        "Holdout-evaluering færdig"
    );
}
