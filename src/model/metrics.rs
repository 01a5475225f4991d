//! Validation metrics for the delay classifier.

use serde::{Deserialize, Serialize};

/// Decision thresholds reported for operational tuning.
pub const REPORT_THRESHOLDS: [f64; 3] = [0.3, 0.5, 0.7];

/// Headline metrics at the default 0.5 decision threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub roc_auc: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdMetrics {
    pub threshold: f64,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
}

/// Per-class line of a classification report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassReport {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Confusion {
    tp: usize,
    fp: usize,
    tn: usize,
    fn_: usize,
}

impl Confusion {
    fn from_predictions(truth: &[bool], predicted: impl Iterator<Item = bool>) -> Self {
        let mut c = Confusion::default();
        for (&t, p) in truth.iter().zip(predicted) {
            match (t, p) {
                (true, true) => c.tp += 1,
                (false, true) => c.fp += 1,
                (false, false) => c.tn += 1,
                (true, false) => c.fn_ += 1,
            }
        }
        c
    }

    fn total(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }

    fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    /// The same matrix seen from the negative class.
    fn flipped(&self) -> Self {
        Confusion {
            tp: self.tn,
            fp: self.fn_,
            tn: self.tp,
            fn_: self.fp,
        }
    }
}

/// `part / total`, or 0.0 when the denominator is zero.
fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

fn confusion_at(truth: &[bool], proba: &[f64], threshold: f64) -> Confusion {
    Confusion::from_predictions(truth, proba.iter().map(|p| *p >= threshold))
}

pub fn threshold_metrics(truth: &[bool], proba: &[f64], threshold: f64) -> ThresholdMetrics {
    let c = confusion_at(truth, proba, threshold);
    ThresholdMetrics {
        threshold,
        accuracy: c.accuracy(),
        precision: c.precision(),
        recall: c.recall(),
    }
}

/// Area under the ROC curve via the rank-sum statistic, with average ranks
/// for tied scores. Returns 0.5 when either class is absent.
pub fn roc_auc(truth: &[bool], proba: &[f64]) -> f64 {
    let positives = truth.iter().filter(|t| **t).count();
    let negatives = truth.len() - positives;
    if positives == 0 || negatives == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..proba.len()).collect();
    order.sort_by(|&a, &b| proba[a].total_cmp(&proba[b]));

    let mut positive_rank_sum = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && proba[order[j + 1]] == proba[order[i]] {
            j += 1;
        }
        // ranks are 1-based; ties share the mean rank
        let rank = (i + j) as f64 / 2.0 + 1.0;
        positive_rank_sum += rank * order[i..=j].iter().filter(|&&k| truth[k]).count() as f64;
        i = j + 1;
    }

    let p = positives as f64;
    (positive_rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64)
}

pub fn validation_metrics(truth: &[bool], proba: &[f64]) -> ValidationMetrics {
    let at_default = threshold_metrics(truth, proba, 0.5);
    ValidationMetrics {
        accuracy: at_default.accuracy,
        precision: at_default.precision,
        recall: at_default.recall,
        roc_auc: roc_auc(truth, proba),
    }
}

/// Precision, recall, F1 and support for both classes at the 0.5 threshold.
pub fn classification_report(truth: &[bool], proba: &[f64]) -> Vec<ClassReport> {
    let delayed = confusion_at(truth, proba, 0.5);
    let on_time = delayed.flipped();

    [("on_time", on_time), ("delayed", delayed)]
        .into_iter()
        .map(|(label, c)| {
            let (precision, recall) = (c.precision(), c.recall());
            ClassReport {
                label: label.to_string(),
                precision,
                recall,
                f1: f1(precision, recall),
                support: c.tp + c.fn_,
            }
        })
        .collect()
}
