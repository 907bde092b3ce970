//! Subject vocabulary and the per-student score set.
//!
//! A student's scores arrive as `subject name → SubjectScore`. The area of
//! each subject (core, elective, civic, second language) is either stated
//! explicitly or inferred from the name, the same way the authored tables
//! name their subjects.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::SubjectName;

/* -------------------------------------------------------------------------- */
/*                                   Areas                                    */
/* -------------------------------------------------------------------------- */

/// Exam area of a subject.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SubjectArea {
    Korean,
    Math,
    /// Grade-keyed (listening-comprehension subject).
    English,
    /// Korean history: the pass/fail-style civic-knowledge subject, grade-keyed.
    Civic,
    Society,
    Science,
    SecondLanguage,
}

/// Which number of a `SubjectScore` keys the score table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeyBasis {
    StandardScore,
    Grade,
}

const SCIENCE_MARKERS: &[&str] = &[
    "physics", "chemistry", "biology", "earthscience", "earth science",
    "물리", "화학", "생명과학", "생물", "지구",
];

const SECOND_LANGUAGE_MARKERS: &[&str] = &[
    "secondlanguage", "second language", "제2외국어", "한문", "classical chinese",
    "german", "french", "spanish", "chinese", "japanese", "russian", "arabic", "vietnamese",
    "독일어", "프랑스어", "스페인어", "중국어", "일본어", "러시아어", "아랍어", "베트남어",
];

impl SubjectArea {
    /// Infer the area from a subject name. Anything not recognised as a core,
    /// civic, science or second-language subject is a society elective.
    pub fn classify(name: &str) -> SubjectArea {
        let n = name.trim();
        let lower = n.to_lowercase();
        if n == "국어" || lower == "korean" {
            SubjectArea::Korean
        } else if n.starts_with("수학") || lower.starts_with("math") {
            SubjectArea::Math
        } else if n == "영어" || lower == "english" {
            SubjectArea::English
        } else if matches!(n, "한국사") || matches!(lower.as_str(), "civicknowledge" | "civic" | "koreanhistory") {
            SubjectArea::Civic
        } else if SECOND_LANGUAGE_MARKERS.iter().any(|m| lower.starts_with(m)) {
            SubjectArea::SecondLanguage
        } else if SCIENCE_MARKERS.iter().any(|m| lower.contains(m)) {
            SubjectArea::Science
        } else {
            SubjectArea::Society
        }
    }

    #[inline]
    pub fn key_basis(self) -> KeyBasis {
        match self {
            SubjectArea::English | SubjectArea::Civic => KeyBasis::Grade,
            _ => KeyBasis::StandardScore,
        }
    }

    #[inline]
    pub fn is_elective(self) -> bool {
        matches!(self, SubjectArea::Society | SubjectArea::Science)
    }
}

/// Elective family a program may require (e.g. "two science electives").
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ElectiveArea {
    Society,
    Science,
}

impl ElectiveArea {
    pub fn of(area: SubjectArea) -> Option<ElectiveArea> {
        match area {
            SubjectArea::Society => Some(ElectiveArea::Society),
            SubjectArea::Science => Some(ElectiveArea::Science),
            _ => None,
        }
    }
}

/// Standard (Ⅰ) versus higher-tier (Ⅱ) elective.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ElectiveTier {
    Standard,
    Advanced,
}

impl ElectiveTier {
    pub fn of(name: &str) -> ElectiveTier {
        let n = name.trim_end();
        if n.ends_with('2') || n.ends_with('Ⅱ') || n.ends_with("II") {
            ElectiveTier::Advanced
        } else {
            ElectiveTier::Standard
        }
    }
}

/// Math branch chosen by the student.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MathBranch {
    Calculus,
    Geometry,
    Statistics,
}

impl MathBranch {
    /// Normalise `Math(Calculus)`, `수학(미적분)`, `확률과 통계` and friends.
    pub fn from_subject(name: &str) -> Option<MathBranch> {
        let lower = name.to_lowercase();
        if lower.contains("미적") || lower.contains("calculus") {
            Some(MathBranch::Calculus)
        } else if lower.contains("기하") || lower.contains("geometry") {
            Some(MathBranch::Geometry)
        } else if lower.contains("확통")
            || lower.contains("확률과 통계")
            || lower.contains("statistics")
            || lower.contains("probability")
        {
            Some(MathBranch::Statistics)
        } else {
            None
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                                   Scores                                   */
/* -------------------------------------------------------------------------- */

/// One subject's exam result.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubjectScore {
    #[cfg_attr(feature = "serde", serde(default, alias = "standardScore", skip_serializing_if = "Option::is_none"))]
    pub standard_score: Option<i32>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub grade: Option<u8>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub percentile: Option<f64>,
    /// Explicit area; inferred from the subject name when absent.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub area: Option<SubjectArea>,
}

impl SubjectScore {
    pub fn standard(score: i32) -> Self {
        Self { standard_score: Some(score), ..Self::default() }
    }

    pub fn graded(grade: u8) -> Self {
        Self { grade: Some(grade), ..Self::default() }
    }

    pub fn with_percentile(mut self, p: f64) -> Self {
        self.percentile = Some(p);
        self
    }

    pub fn with_area(mut self, area: SubjectArea) -> Self {
        self.area = Some(area);
        self
    }

    /// The table key under `basis`, if the student supplied that number.
    #[inline]
    pub fn key_for(&self, basis: KeyBasis) -> Option<i32> {
        match basis {
            KeyBasis::StandardScore => self.standard_score,
            KeyBasis::Grade => self.grade.map(i32::from),
        }
    }
}

/// A chosen or candidate elective with its resolved classification.
#[derive(Clone, Copy, Debug)]
pub struct ElectiveRef<'a> {
    pub name: &'a SubjectName,
    pub score: &'a SubjectScore,
    pub area: ElectiveArea,
    pub tier: ElectiveTier,
}

/// All exam results reported by one student, keyed by subject name.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct StudentScoreSet {
    subjects: BTreeMap<SubjectName, SubjectScore>,
}

impl StudentScoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: SubjectName, score: SubjectScore) -> Option<SubjectScore> {
        self.subjects.insert(name, score)
    }

    pub fn get(&self, name: &str) -> Option<&SubjectScore> {
        self.subjects.get(name)
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SubjectName, &SubjectScore)> {
        self.subjects.iter()
    }

    /// Area of a reported subject: explicit tag first, then name inference.
    #[inline]
    pub fn area_of(name: &SubjectName, score: &SubjectScore) -> SubjectArea {
        score.area.unwrap_or_else(|| SubjectArea::classify(name.as_str()))
    }

    /// First subject (in name order) reported for a non-elective area.
    pub fn subject_in(&self, area: SubjectArea) -> Option<(&SubjectName, &SubjectScore)> {
        self.subjects.iter().find(|(n, s)| Self::area_of(n, s) == area)
    }

    pub fn has_area(&self, area: SubjectArea) -> bool {
        self.subject_in(area).is_some()
    }

    /// Reported electives in canonical (name) order.
    pub fn electives(&self) -> Vec<ElectiveRef<'_>> {
        self.subjects
            .iter()
            .filter_map(|(name, score)| {
                ElectiveArea::of(Self::area_of(name, score)).map(|area| ElectiveRef {
                    name,
                    score,
                    area,
                    tier: ElectiveTier::of(name.as_str()),
                })
            })
            .collect()
    }

    pub fn math_branch(&self) -> Option<MathBranch> {
        self.subject_in(SubjectArea::Math)
            .and_then(|(name, _)| MathBranch::from_subject(name.as_str()))
    }

    /// Korean + Math + the two best elective standard scores.
    pub fn standard_score_sum(&self) -> i32 {
        let core = |area| {
            self.subject_in(area)
                .and_then(|(_, s)| s.standard_score)
                .unwrap_or(0)
        };
        let mut electives: Vec<i32> = self
            .electives()
            .iter()
            .filter_map(|e| e.score.standard_score)
            .collect();
        electives.sort_unstable_by(|a, b| b.cmp(a));
        core(SubjectArea::Korean) + core(SubjectArea::Math) + electives.iter().take(2).sum::<i32>()
    }
}

impl FromIterator<(SubjectName, SubjectScore)> for StudentScoreSet {
    fn from_iter<I: IntoIterator<Item = (SubjectName, SubjectScore)>>(iter: I) -> Self {
        Self { subjects: iter.into_iter().collect() }
    }
}
