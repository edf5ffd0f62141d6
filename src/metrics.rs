//! Retrieval quality metrics
//!
//! Precision, recall and F1 of a retrieved id set against a reference set.

use serde::{Deserialize, Serialize};

use crate::catalog::IdSet;

/// Precision / recall / F1 for one trial, each in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl Scores {
    /// All three metrics equal to `value`
    pub const fn uniform(value: f64) -> Self {
        Self {
            precision: value,
            recall: value,
            f1: value,
        }
    }
}

/// Score `retrieved` against `relevant`
///
/// An empty reference set is vacuously satisfied only by an empty result:
/// `(∅, ∅)` scores 1 everywhere, anything retrieved against `∅` scores 0.
pub fn score(retrieved: &IdSet, relevant: &IdSet) -> Scores {
    if relevant.is_empty() {
        return if retrieved.is_empty() {
            Scores::uniform(1.0)
        } else {
            Scores::uniform(0.0)
        };
    }

    let true_positives = retrieved.intersection(relevant).count() as f64;

    let precision = if retrieved.is_empty() {
        0.0
    } else {
        true_positives / retrieved.len() as f64
    };
    let recall = true_positives / relevant.len() as f64;
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    Scores {
        precision,
        recall,
        f1,
    }
}
