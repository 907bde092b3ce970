//! Determinism utilities: stable ordering for tokens and scores.
//!
//! This module is **I/O-free**. It provides:
//! - A stable total order for registry tokens
//! - A descending score comparator that treats equal values as ties
//! - Stable descending ranking (ties keep input order)

use core::cmp::Ordering;

use crate::ids::{ProgramKey, SubjectName};

/* -------------------------------------------------------------------------- */
/*                               Stable Ordering                              */
/* -------------------------------------------------------------------------- */

/// Provide a **total**, stable order for values that must sort canonically.
pub trait StableOrd {
    fn stable_cmp(&self, other: &Self) -> Ordering;
}

impl StableOrd for SubjectName {
    #[inline]
    fn stable_cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl StableOrd for ProgramKey {
    #[inline]
    fn stable_cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

/// Sort tokens **in place** into canonical order.
#[inline]
pub fn sort_canonical<T: StableOrd>(xs: &mut [T]) {
    xs.sort_by(|a, b| a.stable_cmp(b));
}

/* -------------------------------------------------------------------------- */
/*                                Score ranking                               */
/* -------------------------------------------------------------------------- */

/// Larger score first; `0.0` and `-0.0` (and any NaN) compare equal.
#[inline]
pub fn cmp_score_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Indices of `values` ordered by descending value; equal values keep input order.
pub fn rank_desc_stable(values: &[f64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    // `sort_by` is stable.
    idx.sort_by(|&i, &j| cmp_score_desc(values[i], values[j]));
    idx
}
