#![deny(warnings)]

//! Economic formulas for Money Empire.
//!
//! This crate provides the pure pricing and progression curves:
//! - Acquisition, upgrade and resale pricing for business branches
//! - Per-branch income scaling
//! - Manual-action (click) upgrade pricing
//! - Experience-to-level conversion
//!
//! All functions are stateless; callers gate inputs with funds and cap
//! checks before mutating any state. Derived whole-snapshot aggregates live
//! in [`report`].

pub mod report;

// Floor that forgives float dust just below an integer boundary. The plain
// product 100.0 * 1.15 lands at 114.999999999999986, and a raw floor would
// price the branch at 114 instead of 115.
fn floor_price(x: f64) -> f64 {
    let nearest = x.round();
    if (x - nearest).abs() < 1e-6 {
        nearest
    } else {
        x.floor()
    }
}

/// Cost of the next branch of a template of which `existing_count` branches
/// are already owned.
///
/// floor(base_price * 1.15^existing_count), strictly increasing in the
/// count, so stacking one cheap template eventually forces diversification.
///
/// Example:
/// assert_eq!(acquisition_price(100.0, 0), 100.0);
/// assert_eq!(acquisition_price(100.0, 1), 115.0);
pub fn acquisition_price(base_price: f64, existing_count: u32) -> f64 {
    floor_price(base_price * 1.15f64.powi(existing_count as i32))
}

/// Cost of raising a branch from `level` to `level + 1`.
///
/// floor(base_price * 0.5 * 1.8^(level+1)), strictly increasing in the
/// level. No upgrade is offered at the hard cap of 10.
///
/// Example:
/// assert_eq!(upgrade_price(100.0, 0), 90.0);
pub fn upgrade_price(base_price: f64, level: u8) -> f64 {
    floor_price(base_price * 0.5 * 1.8f64.powi(level as i32 + 1))
}

/// Income per second of one branch at the given level, before multipliers.
///
/// Linear in the level and independent of sibling branches.
///
/// Example:
/// assert_eq!(instance_income(2.0, 0), 2.0);
/// assert_eq!(instance_income(2.0, 1), 3.0);
pub fn instance_income(base_income: f64, level: u8) -> f64 {
    base_income * (1.0 + level as f64 * 0.5)
}

/// Liquidation proceeds for a branch at the given level.
///
/// 70% of the base price plus half of everything spent on upgrades, so
/// resale is always below cumulative spend and buy/sell loops lose money.
pub fn resale_value(base_price: f64, level: u8) -> f64 {
    let upgrade_spend: f64 = (0..level).map(|step| upgrade_price(base_price, step)).sum();
    base_price * 0.7 + upgrade_spend * 0.5
}

/// Proceeds from selling one unit of a lifestyle item: a flat 80% of the
/// catalog price, independent of holding duration.
pub fn lifestyle_resale(price: f64) -> f64 {
    price * 0.8
}

/// Cost of raising the click level from `click_level` to `click_level + 1`.
///
/// floor(200 * 1.8^(click_level-1)). No upgrade is offered at the hard cap
/// of 20.
///
/// Example:
/// assert_eq!(click_upgrade_price(1), 200.0);
/// assert_eq!(click_upgrade_price(2), 360.0);
pub fn click_upgrade_price(click_level: u8) -> f64 {
    floor_price(200.0 * 1.8f64.powi(click_level as i32 - 1))
}

/// Player level implied by an experience total: floor(sqrt(xp/10)) + 1.
///
/// Callers must keep the stored level monotonic; this function alone may
/// report a lower value if the xp rule ever changes.
pub fn level_for_xp(xp: f64) -> u32 {
    (xp / 10.0).sqrt().floor() as u32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn acquisition_price_scenario() {
        assert_eq!(acquisition_price(100.0, 0), 100.0);
        assert_eq!(acquisition_price(100.0, 1), 115.0);
        assert_eq!(acquisition_price(100.0, 2), 132.0);
        assert_eq!(acquisition_price(5_000.0, 3), 7_604.0);
    }

    #[test]
    fn upgrade_price_scenario() {
        assert_eq!(upgrade_price(100.0, 0), 90.0);
        assert_eq!(upgrade_price(100.0, 1), 162.0);
        assert_eq!(upgrade_price(100.0, 2), 291.0);
    }

    #[test]
    fn income_is_linear_in_level() {
        assert_eq!(instance_income(2.0, 0), 2.0);
        assert_eq!(instance_income(2.0, 1), 3.0);
        assert_eq!(instance_income(2.0, 10), 12.0);
        assert_eq!(instance_income(450_000.0, 4), 1_350_000.0);
    }

    #[test]
    fn resale_scenarios() {
        assert_eq!(resale_value(100.0, 0), 70.0);
        // 70 + 90/2
        assert_eq!(resale_value(100.0, 1), 115.0);
        // 70 + (90 + 162)/2
        assert_eq!(resale_value(100.0, 2), 196.0);
    }

    #[test]
    fn click_upgrade_curve() {
        assert_eq!(click_upgrade_price(1), 200.0);
        assert_eq!(click_upgrade_price(2), 360.0);
        assert_eq!(click_upgrade_price(3), 648.0);
        assert_eq!(click_upgrade_price(10), 39_671.0);
    }

    #[test]
    fn lifestyle_resale_is_flat() {
        assert_eq!(lifestyle_resale(1_000.0), 800.0);
        assert_eq!(lifestyle_resale(2_500.0), 2_000.0);
    }

    #[test]
    fn levels_from_xp() {
        assert_eq!(level_for_xp(0.0), 1);
        assert_eq!(level_for_xp(9.9), 1);
        assert_eq!(level_for_xp(10.0), 2);
        assert_eq!(level_for_xp(40.0), 3);
        assert_eq!(level_for_xp(999.0), 10);
    }

    proptest! {
        #[test]
        fn acquisition_strictly_increases_in_count(base in 10.0f64..1e9, count in 0u32..60) {
            prop_assert!(acquisition_price(base, count + 1) > acquisition_price(base, count));
        }

        #[test]
        fn upgrade_strictly_increases_in_level(base in 10.0f64..1e12, level in 0u8..9) {
            prop_assert!(upgrade_price(base, level + 1) > upgrade_price(base, level));
        }

        #[test]
        fn costs_are_whole_currency_units(base in 10.0f64..1e9, count in 0u32..40, level in 0u8..10) {
            prop_assert_eq!(acquisition_price(base, count).fract(), 0.0);
            prop_assert_eq!(upgrade_price(base, level).fract(), 0.0);
            prop_assert_eq!(click_upgrade_price((level + 1) as u8).fract(), 0.0);
        }

        #[test]
        fn resale_never_beats_cumulative_spend(base in 10.0f64..1e9, level in 1u8..=10) {
            let spend: f64 = base + (0..level).map(|s| upgrade_price(base, s)).sum::<f64>();
            prop_assert!(resale_value(base, level) < spend);
        }

        #[test]
        fn income_never_decreases_with_level(income in 0.0f64..1e9, level in 0u8..10) {
            prop_assert!(instance_income(income, level + 1) >= instance_income(income, level));
        }

        #[test]
        fn level_never_decreases_with_xp(xp in 0.0f64..1e9, extra in 0.0f64..1e6) {
            prop_assert!(level_for_xp(xp + extra) >= level_for_xp(xp));
        }
    }
}
