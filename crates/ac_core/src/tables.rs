//! Immutable lookup tables.
//!
//! - `ScoreTable`: subject → integer key (standard score or grade) → program → cell
//! - `PercentileTable`: program → bands ascending by percentile
//! - `PeerAverageTable`: standard-score sum → program → average converted score
//!
//! Tables are built once by the loader and only ever read afterwards.

use std::collections::{BTreeMap, BTreeSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::ids::{ProgramKey, SubjectName};

/// One score-table cell. Any string is the "not awarded" marker and counts as 0.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum TableCell {
    Points(f64),
    NotAwarded(String),
}

impl TableCell {
    #[inline]
    pub fn points(&self) -> f64 {
        match self {
            TableCell::Points(p) => *p,
            TableCell::NotAwarded(_) => 0.0,
        }
    }
}

pub type TableRow = BTreeMap<ProgramKey, TableCell>;

/// All rows for one subject, keyed numerically.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubjectTable {
    rows: BTreeMap<i32, TableRow>,
}

impl SubjectTable {
    pub fn from_rows<I: IntoIterator<Item = (i32, TableRow)>>(rows: I) -> Self {
        Self { rows: rows.into_iter().collect() }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Numeric keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = i32> + '_ {
        self.rows.keys().copied()
    }

    pub fn row(&self, key: i32) -> Option<&TableRow> {
        self.rows.get(&key)
    }

    pub fn rows(&self) -> impl Iterator<Item = (i32, &TableRow)> {
        self.rows.iter().map(|(k, r)| (*k, r))
    }
}

/// Subject-keyed score table; may be assembled from several domain files.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScoreTable {
    subjects: BTreeMap<SubjectName, SubjectTable>,
}

impl ScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_subject(&mut self, name: SubjectName, table: SubjectTable) -> Result<(), CoreError> {
        if self.subjects.contains_key(&name) {
            return Err(CoreError::DuplicateSubject(name.to_string()));
        }
        self.subjects.insert(name, table);
        Ok(())
    }

    /// Merge another domain file; a subject defined in both is an error.
    pub fn merge(&mut self, other: ScoreTable) -> Result<(), CoreError> {
        for (name, table) in other.subjects {
            self.insert_subject(name, table)?;
        }
        Ok(())
    }

    pub fn subject(&self, name: &str) -> Option<&SubjectTable> {
        self.subjects.get(name)
    }

    pub fn subjects(&self) -> impl Iterator<Item = (&SubjectName, &SubjectTable)> {
        self.subjects.iter()
    }

    /// Every program key mentioned anywhere in the table.
    pub fn program_keys(&self) -> BTreeSet<&ProgramKey> {
        self.subjects
            .values()
            .flat_map(|t| t.rows.values())
            .flat_map(|row| row.keys())
            .collect()
    }
}

/// `(percentile, aggregate score at that percentile)`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PercentileBand {
    pub percentile: f64,
    pub score: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PercentileTable {
    programs: BTreeMap<ProgramKey, Vec<PercentileBand>>,
}

impl PercentileTable {
    /// Build from authored bands; each program's list must be ascending by percentile.
    pub fn from_map(programs: BTreeMap<ProgramKey, Vec<PercentileBand>>) -> Result<Self, CoreError> {
        for (key, bands) in &programs {
            if bands.windows(2).any(|w| w[0].percentile > w[1].percentile) {
                return Err(CoreError::UnsortedBands(key.to_string()));
            }
        }
        Ok(Self { programs })
    }

    pub fn bands(&self, program: &str) -> Option<&[PercentileBand]> {
        self.programs.get(program).map(Vec::as_slice)
    }

    pub fn programs(&self) -> impl Iterator<Item = &ProgramKey> {
        self.programs.keys()
    }
}

/// Average converted score of peers with the same standard-score sum.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PeerAverageTable {
    rows: BTreeMap<i32, BTreeMap<ProgramKey, f64>>,
}

impl PeerAverageTable {
    pub fn from_rows<I: IntoIterator<Item = (i32, BTreeMap<ProgramKey, f64>)>>(rows: I) -> Self {
        Self { rows: rows.into_iter().collect() }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = i32> + '_ {
        self.rows.keys().copied()
    }

    pub fn row(&self, key: i32) -> Option<&BTreeMap<ProgramKey, f64>> {
        self.rows.get(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pk(s: &str) -> ProgramKey {
        s.parse().unwrap()
    }

    fn one_row_table(key: i32, program: &str, cell: TableCell) -> SubjectTable {
        let mut row = TableRow::new();
        row.insert(pk(program), cell);
        SubjectTable::from_rows([(key, row)])
    }

    #[test]
    fn not_awarded_cell_counts_as_zero() {
        assert_eq!(TableCell::NotAwarded("미반영".into()).points(), 0.0);
        assert_eq!(TableCell::Points(12.5).points(), 12.5);
    }

    #[test]
    fn merge_rejects_duplicate_subjects() {
        let mut a = ScoreTable::new();
        a.insert_subject("Korean".parse().unwrap(), one_row_table(145, "P", TableCell::Points(1.0)))
            .unwrap();
        let mut b = ScoreTable::new();
        b.insert_subject("Korean".parse().unwrap(), one_row_table(140, "P", TableCell::Points(1.0)))
            .unwrap();
        assert_eq!(a.merge(b), Err(CoreError::DuplicateSubject("Korean".into())));
    }

    #[test]
    fn program_keys_are_collected_across_subjects() {
        let mut t = ScoreTable::new();
        t.insert_subject("Korean".parse().unwrap(), one_row_table(145, "A", TableCell::Points(1.0)))
            .unwrap();
        t.insert_subject("English".parse().unwrap(), one_row_table(1, "B", TableCell::Points(1.0)))
            .unwrap();
        let keys: Vec<&str> = t.program_keys().into_iter().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["A", "B"]);
    }

    #[test]
    fn percentile_bands_must_ascend() {
        let mut m = BTreeMap::new();
        m.insert(
            pk("P"),
            vec![
                PercentileBand { percentile: 1.0, score: 690.0 },
                PercentileBand { percentile: 0.5, score: 695.0 },
            ],
        );
        assert!(PercentileTable::from_map(m).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn cell_deserialises_number_or_marker() {
        let row: BTreeMap<String, TableCell> =
            serde_json::from_str(r#"{"A": 131.5, "B": "미반영"}"#).unwrap();
        assert_eq!(row["A"], TableCell::Points(131.5));
        assert_eq!(row["B"].points(), 0.0);
    }
}
