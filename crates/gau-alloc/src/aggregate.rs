//! Aggregate reconciler: the remainder of the disbursement after all rows.
//!
//! # Algorithm
//!
//! 1. Sum every row amount, treating a missing amount as zero.
//! 2. Round the sum to [`AGGREGATE_DP`] places.
//! 3. Derive `remaining_percent = (total - sum) / total` from that sum,
//!    rounded to [`AGGREGATE_DP`] (zero when the total is zero).
//! 4. Round the sum to [`AMOUNT_DP`] for `used_amount`, and the difference
//!    to the total for `remaining_amount`. Both carry exactly that scale.
//! 5. `save_eligible = every row valid AND remaining_amount >= 0`.
//!
//! A lone blank row means "no allocations" and counts as valid, so clearing
//! every allocation is save eligible.
//!
//! Pure and deterministic: same rows and total, same state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::numeric::{round_half_up, round_to_scale, AGGREGATE_DP, AMOUNT_DP};
use crate::row::row_is_valid;
use crate::types::AllocationRow;

/// Point-in-time summary of all rows against the total.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateState {
    pub used_amount: Decimal,
    pub remaining_amount: Decimal,
    /// Fraction of the total still unallocated (`0.25` = 25 %).
    pub remaining_percent: Decimal,
    /// Every row individually valid.
    pub rows_valid: bool,
    pub save_eligible: bool,
}

impl AggregateState {
    /// State for a total with nothing allocated.
    pub fn unallocated(total_amount: Decimal) -> Self {
        recompute(std::iter::empty(), total_amount)
    }

    /// Remainder to display, or `None` while some row is invalid and the
    /// figure would be stale.
    pub fn display_remainder(&self) -> Option<Decimal> {
        self.rows_valid.then_some(self.remaining_amount)
    }

    pub fn is_over_allocated(&self) -> bool {
        self.remaining_amount < Decimal::ZERO
    }
}

/// Recompute the aggregate for `rows` against `total_amount`.
pub fn recompute<'a, I>(rows: I, total_amount: Decimal) -> AggregateState
where
    I: IntoIterator<Item = &'a AllocationRow>,
{
    let rows: Vec<&AllocationRow> = rows.into_iter().collect();
    let placeholder_only = rows.len() == 1 && rows[0].is_blank();

    let mut sum = Decimal::ZERO;
    let mut rows_valid = true;
    for row in rows {
        rows_valid &= placeholder_only || row_is_valid(row);
        let amount = row.amount.unwrap_or(Decimal::ZERO);
        sum = sum.checked_add(amount).unwrap_or(Decimal::MAX);
    }

    let used_fine = round_half_up(sum, AGGREGATE_DP);
    let remaining_fine = total_amount - used_fine;
    let remaining_percent = if total_amount.is_zero() {
        Decimal::ZERO
    } else {
        remaining_fine
            .checked_div(total_amount)
            .map(|r| round_to_scale(r, AGGREGATE_DP))
            .unwrap_or(Decimal::ZERO)
    };

    let used_amount = round_to_scale(used_fine, AMOUNT_DP);
    let remaining_amount = round_to_scale(total_amount - used_amount, AMOUNT_DP);
    let save_eligible = rows_valid && remaining_amount >= Decimal::ZERO;

    AggregateState {
        used_amount,
        remaining_amount,
        remaining_percent,
        rows_valid,
        save_eligible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RowId;
    use rust_decimal_macros::dec;

    fn row(id: u32, amount: Option<Decimal>) -> AllocationRow {
        let mut r = AllocationRow::blank(RowId::new(id));
        r.amount = amount;
        r
    }

    #[test]
    fn single_row_leaves_remainder() {
        let rows = [row(1, Some(dec!(400)))];
        let agg = recompute(&rows, dec!(1000));
        assert_eq!(agg.used_amount, dec!(400));
        assert_eq!(agg.remaining_amount, dec!(600));
        assert_eq!(agg.remaining_percent, dec!(0.6));
        assert!(agg.save_eligible);
    }

    #[test]
    fn over_allocation_blocks_save() {
        let rows = [row(1, Some(dec!(600))), row(2, Some(dec!(500)))];
        let agg = recompute(&rows, dec!(1000));
        assert_eq!(agg.remaining_amount, dec!(-100));
        assert!(agg.is_over_allocated());
        assert!(!agg.save_eligible);
    }

    #[test]
    fn exact_allocation_is_eligible() {
        let rows = [row(1, Some(dec!(333.33))), row(2, Some(dec!(666.67)))];
        let agg = recompute(&rows, dec!(1000));
        assert_eq!(agg.remaining_amount, Decimal::ZERO);
        assert!(agg.save_eligible);
    }

    #[test]
    fn missing_amount_invalidates_and_hides_remainder() {
        let rows = [row(1, Some(dec!(100))), row(2, None)];
        let agg = recompute(&rows, dec!(1000));
        assert!(!agg.rows_valid);
        assert!(!agg.save_eligible);
        assert_eq!(agg.display_remainder(), None);
        // Missing counts as zero in the sum.
        assert_eq!(agg.used_amount, dec!(100));
    }

    #[test]
    fn amounts_print_at_cent_scale() {
        let rows = [row(1, Some(dec!(400)))];
        let agg = recompute(&rows, dec!(1000));
        assert_eq!(agg.used_amount.to_string(), "400.00");
        assert_eq!(agg.remaining_amount.to_string(), "600.00");
        assert_eq!(agg.remaining_percent.to_string(), "0.600000");
    }

    #[test]
    fn lone_blank_row_is_save_eligible() {
        let rows = [row(1, None)];
        let agg = recompute(&rows, dec!(1000));
        assert!(agg.rows_valid);
        assert!(agg.save_eligible);
        assert_eq!(agg.remaining_amount, dec!(1000));
    }

    #[test]
    fn zero_total_has_zero_remaining_percent() {
        let rows = [row(1, Some(dec!(5)))];
        let agg = recompute(&rows, Decimal::ZERO);
        assert_eq!(agg.remaining_percent, Decimal::ZERO);
        assert_eq!(agg.remaining_amount, dec!(-5));
        assert!(!agg.save_eligible);
    }

    #[test]
    fn remaining_percent_uses_six_places() {
        let rows = [row(1, Some(dec!(1)))];
        let agg = recompute(&rows, dec!(3));
        assert_eq!(agg.remaining_percent, dec!(0.666667));
    }

    #[test]
    fn sub_cent_amounts_round_for_display() {
        let rows = [row(1, Some(dec!(0.004))), row(2, Some(dec!(0.002)))];
        let agg = recompute(&rows, dec!(1));
        assert_eq!(agg.used_amount, dec!(0.01));
        assert_eq!(agg.remaining_amount, dec!(0.99));
    }

    #[test]
    fn unallocated_state_is_full_remainder() {
        let agg = AggregateState::unallocated(dec!(250));
        assert_eq!(agg.remaining_amount, dec!(250));
        assert_eq!(agg.remaining_percent, Decimal::ONE);
        assert!(agg.save_eligible);
    }
}
