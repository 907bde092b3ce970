//! Fixed amount per qualifying elective.

use ac_core::rules::ElectiveFilter;

use crate::ConvertedScores;

pub fn fixed_per_elective(
    filter: &ElectiveFilter,
    amount: f64,
    min_qualifying: u8,
    max_counted: Option<u8>,
    scores: &ConvertedScores,
) -> f64 {
    let count = scores
        .electives
        .iter()
        .filter(|e| filter.admits(e.name.as_str(), e.area, e.tier))
        .count();
    if count == 0 || count < usize::from(min_qualifying) {
        return 0.0;
    }
    let counted = max_counted.map_or(count, |m| count.min(usize::from(m)));
    counted as f64 * amount
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{elective, scores};
    use crate::ElectiveArea;

    #[test]
    fn counts_capped_qualifying_electives() {
        let s = scores(
            &[],
            vec![
                elective("Chemistry2", ElectiveArea::Science, 50.0),
                elective("Biology2", ElectiveArea::Science, 50.0),
                elective("Ethics", ElectiveArea::Society, 50.0),
            ],
        );
        let f = ElectiveFilter { area: Some(ElectiveArea::Science), ..ElectiveFilter::default() };
        assert_eq!(fixed_per_elective(&f, 3.0, 1, None, &s), 6.0);
        assert_eq!(fixed_per_elective(&f, 3.0, 1, Some(1), &s), 3.0);
        assert_eq!(fixed_per_elective(&f, 3.0, 3, None, &s), 0.0);
    }
}
