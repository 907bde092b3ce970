//! Best elective subset for one program, by exhaustive search.

use ac_algo::{check_selection, optimize, ConvertedElective, OptimizeError};
use ac_core::{rounding::round2, ElectiveRef, StudentScoreSet};
use serde::Serialize;
use tracing::{debug, info};

use crate::convert::{candidates, convert_elective, finish, prepare, Conversion};
use crate::result::ConversionError;
use crate::EngineData;

/// A subset the optimizer looked at; `score` is `None` when it was rejected.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConsideredSubset {
    pub electives: Vec<String>,
    pub score: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OptimizedConversion {
    pub conversion: Conversion,
    /// Every subset in lexicographic order of the candidate list.
    pub considered: Vec<ConsideredSubset>,
}

impl OptimizedConversion {
    pub fn best_electives(&self) -> Vec<String> {
        self.conversion.electives_used.iter().map(|n| n.to_string()).collect()
    }
}

pub fn find_best_score(
    data: &EngineData,
    student: &StudentScoreSet,
    program: &str,
) -> Result<OptimizedConversion, ConversionError> {
    let prepared = prepare(data, student, program)?;
    let pattern = &prepared.rule.pattern;
    let pool: Vec<ElectiveRef<'_>> = candidates(student, prepared.rule);
    // a candidate without table data only sinks the subsets containing it
    let converted: Vec<Result<ConvertedElective, ConversionError>> =
        pool.iter().map(|e| convert_elective(data, e, program)).collect();

    let outcome = optimize(pool.len(), usize::from(pattern.elective_count), |subset: &[usize]| -> Result<(f64, Conversion), ConversionError> {
        let selection: Vec<ElectiveRef<'_>> = subset.iter().map(|&i| pool[i]).collect();
        check_selection(&selection, pattern)?;
        let electives = subset.iter().map(|&i| converted[i].clone()).collect::<Result<Vec<_>, _>>()?;
        let c = finish(&prepared, student, program, electives);
        Ok((c.final_score, c))
    });

    let optimum = match outcome {
        Ok(o) => o,
        Err(e @ OptimizeError::TooFewCandidates { .. }) => return Err(ConversionError::IneligibleProgram(e.to_string())),
        Err(OptimizeError::NoLegalSubset(e)) => return Err(e),
    };

    let considered: Vec<ConsideredSubset> = optimum
        .considered
        .iter()
        .map(|s| ConsideredSubset {
            electives: s.subset.iter().map(|&i| pool[i].name.to_string()).collect(),
            score: s.score.map(round2),
        })
        .collect();
    for c in &considered {
        debug!(program, electives = ?c.electives, score = ?c.score, "subset considered");
    }
    info!(program, subsets = considered.len(), best = optimum.score, "optimizer finished");

    Ok(OptimizedConversion { conversion: optimum.best, considered })
}
