//! Nearest-key fallback for sparse score tables.
//!
//! Contract:
//! - Pick the key minimising `|requested − key|`.
//! - On an exact midpoint the **lower** key wins.
//! - Requests outside the key range land on the nearest boundary; no special case.
//! - Returns `None` only for an empty key domain.
//!
//! Distances are computed in `i64` so extreme `i32` inputs cannot overflow.

use ac_core::tables::SubjectTable;

/// Resolve `requested` against an arbitrary key set (order does not matter).
pub fn resolve<I>(keys: I, requested: i32) -> Option<i32>
where
    I: IntoIterator<Item = i32>,
{
    let target = i64::from(requested);
    let mut best: Option<(i64, i32)> = None;
    for key in keys {
        let dist = (target - i64::from(key)).abs();
        best = match best {
            Some((bd, bk)) if bd < dist || (bd == dist && bk <= key) => Some((bd, bk)),
            _ => Some((dist, key)),
        };
    }
    best.map(|(_, key)| key)
}

/// Exact hit first, then nearest key.
#[inline]
pub fn resolve_in(table: &SubjectTable, requested: i32) -> Option<i32> {
    if table.row(requested).is_some() {
        return Some(requested);
    }
    resolve(table.keys(), requested)
}
