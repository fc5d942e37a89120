//! # Multinomial Logistisk Regression
//!
//! Lineær flerkasse-klassifikator over TF-IDF-featurevektorer:
//!
//! - **Sandsynligheder**: softmax over alle kendte intents — summen er
//!   altid 1 inden for numerisk tolerance.
//! - **Klassebalancering**: hver prøve vægtes med `n / (k · n_c)` så
//!   underrepræsenterede intents ikke drukner.
//! - **Determinisme**: nul-initialisering, fuld-batch gradientnedstigning
//!   med fast epokantal og fast akkumuleringsrækkefølge. Samme korpus
//!   giver bitvis samme model.
//!
//! Per-prøve-beregningen i hver epoke paralleliseres med rayon;
//! gradientakkumuleringen sker sekventielt netop for determinismens skyld.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Faste træningsparametre. Ikke tunbare udefra — korpusset er signalet.
const EPOCHS: usize = 200;
const LEARNING_RATE: f64 = 1.0;
const L2_PENALTY: f64 = 1e-4;

/// Trænet lineær model: én vægtrække og ét interceptled per klasse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Vægte `[klasse][feature]`.
    weights: Vec<Vec<f64>>,
    /// Interceptled per klasse.
    intercepts: Vec<f64>,
    /// Forventet featuredimension.
    n_features: usize,
}

/// Numerisk stabil softmax (maksimum trækkes fra før eksponentiering).
fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

impl LogisticRegression {
    /// Træner modellen på featurevektorer og klasseindekser.
    ///
    /// `labels[i]` er klasseindekset for `features[i]`; `n_classes` er
    /// antallet af kendte intents. Et enkelt-klasse-korpus er gyldigt og
    /// giver en model der altid svarer den ene klasse med sandsynlighed 1.
    pub fn fit(features: &[Vec<f64>], labels: &[usize], n_classes: usize) -> Self {
        let n_samples = features.len();
        let n_features = features.first().map(|f| f.len()).unwrap_or(0);

        // Balancerede klassevægte: n / (k · n_c).
        let mut class_counts = vec![0usize; n_classes];
        for &label in labels {
            class_counts[label] += 1;
        }
        let sample_weights: Vec<f64> = labels
            .iter()
            .map(|&label| n_samples as f64 / (n_classes as f64 * class_counts[label] as f64))
            .collect();

        let mut model = Self {
            weights: vec![vec![0.0; n_features]; n_classes],
            intercepts: vec![0.0; n_classes],
            n_features,
        };

        for _ in 0..EPOCHS {
            // Fremadpas parallelt; rækkefølgen bevares af collect.
            let probs: Vec<Vec<f64>> = features
                .par_iter()
                .map(|x| softmax(&model.scores(x)))
                .collect();

            // Sekventiel akkumulering holder flydende-tals-rækkefølgen fast.
            let mut grad_w = vec![vec![0.0; n_features]; n_classes];
            let mut grad_b = vec![0.0; n_classes];
            for (i, x) in features.iter().enumerate() {
                let w = sample_weights[i];
                for c in 0..n_classes {
                    let target = if labels[i] == c { 1.0 } else { 0.0 };
                    let err = w * (probs[i][c] - target);
                    grad_b[c] += err;
                    if err != 0.0 {
                        for (j, &xj) in x.iter().enumerate() {
                            grad_w[c][j] += err * xj;
                        }
                    }
                }
            }

            let step = LEARNING_RATE / n_samples.max(1) as f64;
            for c in 0..n_classes {
                for j in 0..n_features {
                    model.weights[c][j] -=
                        step * (grad_w[c][j] + L2_PENALTY * model.weights[c][j]);
                }
                model.intercepts[c] -= step * grad_b[c];
            }
        }

        model
    }

    /// Rå klassescorer `Wx + b`.
    fn scores(&self, x: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| {
                let dot: f64 = row.iter().zip(x).map(|(w, xi)| w * xi).sum();
                dot + b
            })
            .collect()
    }

    /// Sandsynlighedsfordeling over alle klasser for én featurevektor.
    ///
    /// En vektor med forkert dimension behandles som nulvektoren, så kun
    /// interceptleddene taler — det sker kun hvis artefakterne er i
    /// utakt, hvilket indlæsningen i øvrigt afviser.
    pub fn predict_proba(&self, x: &[f64]) -> Vec<f64> {
        if x.len() != self.n_features {
            return softmax(&self.intercepts);
        }
        softmax(&self.scores(x))
    }

    /// Antal klasser modellen er trænet over.
    pub fn n_classes(&self) -> usize {
        self.weights.len()
    }

    /// Forventet featuredimension.
    pub fn n_features(&self) -> usize {
        self.n_features
    }
}
