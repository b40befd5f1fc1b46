//! Derived read models over one player snapshot.
//!
//! Everything in this module is a pure fold over a [`PlayerState`] and the
//! catalog: income summaries, per-industry rollups and portfolio valuation.
//! Callers recompute these on every tick or frame instead of caching them,
//! so there is no invalidation logic anywhere.

use crate::{instance_income, resale_value, upgrade_price};
use serde::Serialize;
use sim_core::{
    AssetKind, BusinessId, Catalog, IndustryCategory, InstanceId, OwnedBusiness, PlayerState,
    MAX_BUSINESS_LEVEL,
};
use std::collections::BTreeSet;

/// Industry pairs that grant an income bonus when both are represented by
/// at least one owned branch. Each pair pays out once; extra branches in
/// either industry do not stack.
pub const SYNERGY_PAIRS: [(IndustryCategory, IndustryCategory, f64); 5] = [
    (IndustryCategory::Retail, IndustryCategory::Shipping, 0.10),
    (IndustryCategory::Finance, IndustryCategory::Property, 0.15),
    (IndustryCategory::Airline, IndustryCategory::Hotels, 0.20),
    (IndustryCategory::IT, IndustryCategory::Medicine, 0.25),
    (IndustryCategory::Transportation, IndustryCategory::IT, 0.10),
];

/// Multiplier from industry pairings: 1.0 plus the bonus of every pair in
/// [`SYNERGY_PAIRS`] whose two industries both appear among owned branches.
/// Branches whose template left the catalog carry no industry.
pub fn synergy_bonus(catalog: &Catalog, state: &PlayerState) -> f64 {
    let held: BTreeSet<IndustryCategory> = state
        .owned_businesses
        .iter()
        .filter_map(|owned| catalog.business(&owned.business_id))
        .map(|template| template.category)
        .collect();
    let mut bonus = 1.0;
    for (a, b, add) in SYNERGY_PAIRS {
        if held.contains(&a) && held.contains(&b) {
            bonus += add;
        }
    }
    bonus
}

/// Multiplier from lifestyle holdings: every owned unit contributes its
/// item's multiplier minus one. Entries whose item left the catalog
/// contribute nothing.
pub fn lifestyle_multiplier(catalog: &Catalog, state: &PlayerState) -> f64 {
    state
        .inventory
        .iter()
        .fold(1.0, |acc, owned| match catalog.lifestyle_item(&owned.id) {
            Some(item) => acc + (item.multiplier - 1.0) * owned.count as f64,
            None => acc,
        })
}

/// Product of the lifestyle, synergy and economic-cycle multipliers.
///
/// This single factor scales gross business income and manual taps.
/// Maintenance is never scaled by it.
pub fn global_multiplier(catalog: &Catalog, state: &PlayerState) -> f64 {
    lifestyle_multiplier(catalog, state)
        * synergy_bonus(catalog, state)
        * state.economic_cycle.income_multiplier()
}

/// Per-second cash flow of a snapshot.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeSummary {
    /// Branch incomes summed first, then scaled once by the multiplier.
    pub gross: f64,
    /// Flat upkeep total; no multiplier ever applies to it.
    pub maintenance: f64,
    /// Gross minus maintenance, floored at zero. Income ticks pay this.
    pub net: f64,
    /// The global multiplier that produced `gross`.
    pub multiplier: f64,
}

/// Computes the per-second flow of a snapshot. Branches whose template left
/// the catalog contribute nothing on either side of the ledger.
pub fn income_summary(catalog: &Catalog, state: &PlayerState) -> IncomeSummary {
    let multiplier = global_multiplier(catalog, state);
    let mut raw = 0.0;
    let mut maintenance = 0.0;
    for owned in &state.owned_businesses {
        if let Some(template) = catalog.business(&owned.business_id) {
            raw += instance_income(template.base_income, owned.level);
            maintenance += template.maintenance;
        }
    }
    let gross = raw * multiplier;
    IncomeSummary {
        gross,
        maintenance,
        net: (gross - maintenance).max(0.0),
        multiplier,
    }
}

/// Resale value of one branch, or 0 if its template left the catalog.
pub fn branch_resale(catalog: &Catalog, owned: &OwnedBusiness) -> f64 {
    catalog
        .business(&owned.business_id)
        .map(|template| resale_value(template.base_price, owned.level))
        .unwrap_or(0.0)
}

/// Display row for one owned branch.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchReport {
    pub instance_id: InstanceId,
    pub business_id: BusinessId,
    /// Template name, or "Unknown Entity" for an orphaned branch.
    pub name: String,
    pub level: u8,
    /// Per-second income of this branch alone, global multiplier applied.
    pub income: f64,
    /// Cost of the next level; None at the level cap and for orphans.
    pub upgrade_price: Option<f64>,
    /// Cash returned if this branch were liquidated now.
    pub resale_value: f64,
}

fn branch_report(catalog: &Catalog, owned: &OwnedBusiness, multiplier: f64) -> BranchReport {
    let template = catalog.business(&owned.business_id);
    BranchReport {
        instance_id: owned.instance_id.clone(),
        business_id: owned.business_id.clone(),
        name: template.map_or_else(|| "Unknown Entity".to_string(), |t| t.name.clone()),
        level: owned.level,
        income: template.map_or(0.0, |t| instance_income(t.base_income, owned.level)) * multiplier,
        upgrade_price: template.and_then(|t| {
            if owned.level < MAX_BUSINESS_LEVEL {
                Some(upgrade_price(t.base_price, owned.level))
            } else {
                None
            }
        }),
        resale_value: branch_resale(catalog, owned),
    }
}

/// Rows for every owned branch, in acquisition order. Orphaned branches
/// keep their row so the player can still liquidate them for nothing.
pub fn branch_reports(catalog: &Catalog, state: &PlayerState) -> Vec<BranchReport> {
    let multiplier = global_multiplier(catalog, state);
    state
        .owned_businesses
        .iter()
        .map(|owned| branch_report(catalog, owned, multiplier))
        .collect()
}

/// Rollup of one industry's owned branches.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryReport {
    pub category: IndustryCategory,
    /// Owned branches in this industry.
    pub count: u32,
    /// Sum of the branch incomes below, multiplier applied.
    pub income: f64,
    pub branches: Vec<BranchReport>,
}

/// One rollup per industry in display order, empty industries included.
/// Orphaned branches appear in no rollup.
pub fn industry_reports(catalog: &Catalog, state: &PlayerState) -> Vec<IndustryReport> {
    let multiplier = global_multiplier(catalog, state);
    IndustryCategory::ALL
        .iter()
        .map(|&category| {
            let branches: Vec<BranchReport> = state
                .owned_businesses
                .iter()
                .filter(|owned| {
                    catalog
                        .business(&owned.business_id)
                        .map_or(false, |t| t.category == category)
                })
                .map(|owned| branch_report(catalog, owned, multiplier))
                .collect();
            IndustryReport {
                category,
                count: branches.len() as u32,
                income: branches.iter().map(|b| b.income).sum(),
                branches,
            }
        })
        .collect()
}

/// Point-in-time valuation of everything a player holds.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValuation {
    pub cash: f64,
    /// Branches at their resale values.
    pub business_value: f64,
    /// Stock holdings at current market prices.
    pub stock_value: f64,
    /// Crypto holdings at current market prices.
    pub crypto_value: f64,
    /// Lifestyle holdings at full catalog price; selling refunds less.
    pub lifestyle_value: f64,
    /// Cosmetic prestige total; no formula reads it.
    pub prestige: u64,
}

impl PortfolioValuation {
    /// Cash on hand plus every holding class at its valuation above.
    pub fn net_worth(&self) -> f64 {
        self.cash
            + self.business_value
            + self.stock_value
            + self.crypto_value
            + self.lifestyle_value
    }
}

/// Values a snapshot's holdings at current prices and resale curves.
pub fn portfolio_valuation(catalog: &Catalog, state: &PlayerState) -> PortfolioValuation {
    let business_value = state
        .owned_businesses
        .iter()
        .map(|owned| branch_resale(catalog, owned))
        .sum();
    let mut stock_value = 0.0;
    let mut crypto_value = 0.0;
    for asset in &state.assets {
        match asset.kind {
            AssetKind::Stock => stock_value += asset.market_value(),
            AssetKind::Crypto => crypto_value += asset.market_value(),
        }
    }
    let mut lifestyle_value = 0.0;
    let mut prestige = 0u64;
    for owned in &state.inventory {
        if let Some(item) = catalog.lifestyle_item(&owned.id) {
            lifestyle_value += item.price * owned.count as f64;
            prestige += item.prestige * u64::from(owned.count);
        }
    }
    PortfolioValuation {
        cash: state.money,
        business_value,
        stock_value,
        crypto_value,
        lifestyle_value,
        prestige,
    }
}
