//! L2-regularised binary logistic regression fitted by full-batch gradient descent.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::encoding::SparseRow;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticConfig {
    pub max_iter: usize,
    /// Inverse regularisation strength.
    pub c: f64,
    /// Stop once every gradient component is below this.
    pub tol: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            c: 1.0,
            tol: 1e-4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    /// Fits on encoded rows of `width` columns with labels `y`.
    ///
    /// Minimises mean log-loss plus `|w|^2 / (2 C n)`; the intercept is not
    /// penalised. The step size is the inverse of a Lipschitz bound of the
    /// gradient, so every step decreases the objective.
    pub fn fit(x: &[SparseRow], y: &[bool], width: usize, config: &LogisticConfig) -> Result<Self> {
        if x.len() != y.len() {
            return Err(Error::invalid(format!(
                "{} rows but {} labels",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(Error::insufficient("no rows to fit"));
        }
        if config.c <= 0.0 {
            return Err(Error::invalid("regularisation C must be positive"));
        }

        let n = x.len() as f64;
        let l2 = 1.0 / (config.c * n);
        let mean_sq_norm = x
            .iter()
            .map(|row| 1.0 + row.iter().map(|(_, v)| v * v).sum::<f64>())
            .sum::<f64>()
            / n;
        let step = 1.0 / (0.25 * mean_sq_norm + l2);

        let mut model = Self {
            weights: vec![0.0; width],
            intercept: 0.0,
        };
        let mut grad_w = vec![0.0; width];
        let mut iterations = 0;

        for _ in 0..config.max_iter {
            iterations += 1;
            grad_w.iter_mut().for_each(|g| *g = 0.0);
            let mut grad_b = 0.0;

            for (row, &label) in x.iter().zip(y) {
                let residual = model.predict_proba(row) - if label { 1.0 } else { 0.0 };
                grad_b += residual;
                for &(j, v) in row {
                    grad_w[j] += residual * v;
                }
            }

            grad_b /= n;
            let mut max_grad = grad_b.abs();
            for (g, w) in grad_w.iter_mut().zip(&model.weights) {
                *g = *g / n + l2 * w;
                max_grad = max_grad.max(g.abs());
            }

            if max_grad < config.tol {
                break;
            }

            model.intercept -= step * grad_b;
            for (w, g) in model.weights.iter_mut().zip(&grad_w) {
                *w -= step * g;
            }
        }

        debug!(iterations, width, rows = x.len(), "Logistic regression fitted");
        Ok(model)
    }

    pub fn width(&self) -> usize {
        self.weights.len()
    }

    pub fn decision_function(&self, row: &SparseRow) -> f64 {
        self.intercept
            + row
                .iter()
                .filter_map(|&(j, v)| self.weights.get(j).map(|w| w * v))
                .sum::<f64>()
    }

    /// Probability of the positive class.
    pub fn predict_proba(&self, row: &SparseRow) -> f64 {
        sigmoid(self.decision_function(row))
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
