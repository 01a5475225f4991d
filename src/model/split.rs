//! Seeded, label-stratified train/validation split.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{Error, Result};

/// Row indices of the two partitions, each ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// Splits `labels` into train/validation index sets, keeping the class
/// balance of both partitions close to that of the whole set.
///
/// Each class contributes `round(count * validation_fraction)` rows to the
/// validation partition, clamped so that both partitions receive at least
/// one row of every class. The same seed and input always give the same split.
///
/// # Errors
///
/// [`Error::InvalidInput`] for a fraction outside (0, 1);
/// [`Error::InsufficientData`] if a class has fewer than two rows.
pub fn stratified_split(labels: &[bool], validation_fraction: f64, seed: u64) -> Result<Split> {
    if !(validation_fraction > 0.0 && validation_fraction < 1.0) {
        return Err(Error::invalid(format!(
            "validation fraction must be in (0, 1), got {}",
            validation_fraction
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut validation = Vec::new();

    for class in [false, true] {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == class)
            .map(|(i, _)| i)
            .collect();

        if members.len() < 2 {
            return Err(Error::insufficient(format!(
                "class {} has {} row(s); at least 2 are needed to stratify",
                u8::from(class),
                members.len()
            )));
        }

        members.shuffle(&mut rng);
        let n_valid = ((members.len() as f64 * validation_fraction).round() as usize)
            .clamp(1, members.len() - 1);

        validation.extend_from_slice(&members[..n_valid]);
        train.extend_from_slice(&members[n_valid..]);
    }

    train.sort_unstable();
    validation.sort_unstable();
    Ok(Split { train, validation })
}
