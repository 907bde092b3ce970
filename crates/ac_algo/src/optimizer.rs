//! Combination Optimizer: exhaustive search over elective subsets.
//!
//! Subsets are visited in lexicographic index order. Every subset is scored
//! by the caller's closure; failures are recorded, never dropped. The first
//! subset reaching the maximum wins, so results are deterministic.

use core::fmt;

/// All `k`-element index subsets of `0..n`, lexicographic. `k = 0` yields one empty subset.
pub fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if k > n {
        return out;
    }
    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        out.push(idx.clone());
        // rightmost position that can still advance
        let Some(pos) = (0..k).rev().find(|&i| idx[i] != i + n - k) else {
            return out;
        };
        idx[pos] += 1;
        for j in pos + 1..k {
            idx[j] = idx[j - 1] + 1;
        }
    }
}

/// One considered subset; `score` is `None` when the subset was rejected.
#[derive(Clone, Debug, PartialEq)]
pub struct SubsetScore {
    pub subset: Vec<usize>,
    pub score: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Optimum<T> {
    pub subset: Vec<usize>,
    pub score: f64,
    pub best: T,
    pub considered: Vec<SubsetScore>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum OptimizeError<E> {
    TooFewCandidates { candidates: usize, required: usize },
    /// Every subset failed; carries the first subset's error.
    NoLegalSubset(E),
}

impl<E: fmt::Display> fmt::Display for OptimizeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizeError::TooFewCandidates { candidates, required } => {
                write!(f, "{required} electives required, only {candidates} available")
            }
            OptimizeError::NoLegalSubset(e) => write!(f, "no legal elective subset: {e}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for OptimizeError<E> {}

/// Score every `choose`-subset of `candidates` items and keep the best.
pub fn optimize<T, E, F>(candidates: usize, choose: usize, mut eval: F) -> Result<Optimum<T>, OptimizeError<E>>
where
    F: FnMut(&[usize]) -> Result<(f64, T), E>,
{
    if choose > candidates {
        return Err(OptimizeError::TooFewCandidates { candidates, required: choose });
    }
    let mut best: Option<(Vec<usize>, f64, T)> = None;
    let mut first_err: Option<E> = None;
    let mut considered = Vec::new();

    for subset in combinations(candidates, choose) {
        match eval(&subset) {
            Ok((score, payload)) => {
                considered.push(SubsetScore { subset: subset.clone(), score: Some(score) });
                let better = best.as_ref().map_or(true, |(_, b, _)| score > *b);
                if better {
                    best = Some((subset, score, payload));
                }
            }
            Err(e) => {
                considered.push(SubsetScore { subset, score: None });
                first_err.get_or_insert(e);
            }
        }
    }

    match (best, first_err) {
        (Some((subset, score, best)), _) => Ok(Optimum { subset, score, best, considered }),
        (None, Some(e)) => Err(OptimizeError::NoLegalSubset(e)),
        // combinations() always yields at least one subset when choose <= candidates
        (None, None) => Err(OptimizeError::TooFewCandidates { candidates, required: choose }),
    }
}
