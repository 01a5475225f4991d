//! Preprocessing stage: one-hot encoding for categorical columns and
//! standard scaling for numeric columns.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::features::{FeatureSchema, FeatureVector};
use crate::stats::moments;

/// An encoded row as `(column, value)` pairs in ascending column order.
pub type SparseRow = Vec<(usize, f64)>;

/// One-hot encoder with sorted categories per column.
///
/// Values unseen during fitting encode as all zeros, so they add no signal
/// instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    pub fn fit(rows: &[Vec<String>], n_columns: usize) -> Self {
        let mut seen: Vec<BTreeSet<&str>> = vec![BTreeSet::new(); n_columns];
        for row in rows {
            for (set, value) in seen.iter_mut().zip(row) {
                set.insert(value.as_str());
            }
        }

        Self {
            categories: seen
                .into_iter()
                .map(|set| set.into_iter().map(String::from).collect())
                .collect(),
        }
    }

    pub fn n_columns(&self) -> usize {
        self.categories.len()
    }

    pub fn width(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    pub fn categories(&self, column: usize) -> Option<&[String]> {
        self.categories.get(column).map(Vec::as_slice)
    }

    /// Appends the hot positions of `row`, offset by `offset`.
    pub fn transform_into(&self, row: &[String], offset: usize, out: &mut SparseRow) {
        let mut base = offset;
        for (cats, value) in self.categories.iter().zip(row) {
            if let Ok(i) = cats.binary_search(value) {
                out.push((base + i, 1.0));
            }
            base += cats.len();
        }
    }
}

/// Centers numeric columns on their mean and scales to unit population variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>], n_columns: usize) -> Self {
        let mut mean = Vec::with_capacity(n_columns);
        let mut scale = Vec::with_capacity(n_columns);
        let mut column = Vec::with_capacity(rows.len());

        for c in 0..n_columns {
            column.clear();
            column.extend(rows.iter().map(|r| r[c]));
            let (m, s) = moments(&column);
            mean.push(m);
            // constant columns are only centered
            scale.push(if s == 0.0 { 1.0 } else { s });
        }

        Self { mean, scale }
    }

    pub fn n_columns(&self) -> usize {
        self.mean.len()
    }

    pub fn transform_into(&self, row: &[f64], offset: usize, out: &mut SparseRow) {
        out.extend(
            row.iter()
                .zip(self.mean.iter().zip(&self.scale))
                .enumerate()
                .map(|(i, (x, (m, s)))| (offset + i, (x - m) / s)),
        );
    }
}

/// Column-wise preprocessing of [`FeatureVector`]s under a fixed [`FeatureSchema`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    schema: FeatureSchema,
    encoder: OneHotEncoder,
    scaler: StandardScaler,
}

impl Preprocessor {
    pub fn fit(rows: &[FeatureVector], schema: FeatureSchema) -> Result<Self> {
        let categorical = rows
            .iter()
            .map(|r| schema.categorical_values(r))
            .collect::<Result<Vec<_>>>()?;
        let numeric = rows
            .iter()
            .map(|r| schema.numeric_values(r))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            encoder: OneHotEncoder::fit(&categorical, schema.categorical.len()),
            scaler: StandardScaler::fit(&numeric, schema.numeric.len()),
            schema,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Length of an encoded row.
    pub fn width(&self) -> usize {
        self.encoder.width() + self.scaler.n_columns()
    }

    /// Encodes `row` as `(column, value)` pairs; one-hot zeros are omitted.
    pub fn transform(&self, row: &FeatureVector) -> Result<SparseRow> {
        let categorical = self.schema.categorical_values(row)?;
        let numeric = self.schema.numeric_values(row)?;
        let expected = (self.encoder.n_columns(), self.scaler.n_columns());
        if (categorical.len(), numeric.len()) != expected {
            return Err(Error::SchemaDrift(
                "fitted encoder width disagrees with its schema".into(),
            ));
        }

        let mut out = Vec::with_capacity(categorical.len() + numeric.len());
        self.encoder.transform_into(&categorical, 0, &mut out);
        self.scaler.transform_into(&numeric, self.encoder.width(), &mut out);
        Ok(out)
    }
}
