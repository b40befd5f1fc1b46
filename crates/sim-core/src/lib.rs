#![deny(warnings)]

//! Core domain models and invariants for Money Empire.
//!
//! This crate defines the serializable player snapshot and catalog types used
//! across the simulation, with validation helpers to guarantee basic
//! invariants. Persisted documents keep the historical camelCase field names
//! (and epoch-millisecond timestamps), so saves written by earlier builds of
//! the game still load.

pub mod catalog;
pub mod fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use catalog::{validate_catalog, Catalog};

/// Hard cap on a business branch's upgrade level.
pub const MAX_BUSINESS_LEVEL: u8 = 10;

/// Hard cap on the manual-gain upgrade level.
pub const MAX_CLICK_LEVEL: u8 = 20;

/// Maximum number of prices kept in an asset's history ring.
pub const PRICE_HISTORY_CAP: usize = 30;

/// Cash a brand-new player starts with.
pub const STARTING_MONEY: f64 = 100.0;

/// Unique identifier for a business template, e.g. "ret_1".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BusinessId(pub String);

/// Unique identifier for a tradable asset, e.g. "s3" or "c1".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId(pub String);

/// Unique identifier for a lifestyle item, e.g. "sc2".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub String);

/// Unique identifier for one owned business branch.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub String);

/// Industry tags used for grouping and synergy pairing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IndustryCategory {
    Retail,
    Restaurants,
    Media,
    Shipping,
    Sport,
    Hotels,
    Property,
    IT,
    Medicine,
    Resources,
    Finance,
    Airline,
    Transportation,
}

impl IndustryCategory {
    /// All categories in rollup display order.
    pub const ALL: [IndustryCategory; 13] = [
        IndustryCategory::Retail,
        IndustryCategory::Restaurants,
        IndustryCategory::Media,
        IndustryCategory::Shipping,
        IndustryCategory::Sport,
        IndustryCategory::Hotels,
        IndustryCategory::Property,
        IndustryCategory::IT,
        IndustryCategory::Medicine,
        IndustryCategory::Resources,
        IndustryCategory::Finance,
        IndustryCategory::Airline,
        IndustryCategory::Transportation,
    ];

    /// Human-readable tag name, identical to the serialized form.
    pub fn name(self) -> &'static str {
        match self {
            IndustryCategory::Retail => "Retail",
            IndustryCategory::Restaurants => "Restaurants",
            IndustryCategory::Media => "Media",
            IndustryCategory::Shipping => "Shipping",
            IndustryCategory::Sport => "Sport",
            IndustryCategory::Hotels => "Hotels",
            IndustryCategory::Property => "Property",
            IndustryCategory::IT => "IT",
            IndustryCategory::Medicine => "Medicine",
            IndustryCategory::Resources => "Resources",
            IndustryCategory::Finance => "Finance",
            IndustryCategory::Airline => "Airline",
            IndustryCategory::Transportation => "Transportation",
        }
    }
}

/// Macro-economic cycle shared by the whole market.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EconomicCycle {
    #[default]
    Normal,
    Boom,
    Recession,
    Recovery,
}

impl EconomicCycle {
    /// All cycles, in the order the market tick resamples from.
    pub const ALL: [EconomicCycle; 4] = [
        EconomicCycle::Normal,
        EconomicCycle::Boom,
        EconomicCycle::Recession,
        EconomicCycle::Recovery,
    ];

    /// Income scale applied while this cycle is active.
    pub fn income_multiplier(self) -> f64 {
        match self {
            EconomicCycle::Normal => 1.0,
            EconomicCycle::Boom => 1.5,
            EconomicCycle::Recession => 0.6,
            EconomicCycle::Recovery => 1.1,
        }
    }
}

/// Account difficulty tier, fixed at creation time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Easy,
    Normal,
    Hard,
    #[serde(rename = "Very Hard")]
    VeryHard,
}

impl Difficulty {
    /// Milliseconds between income ticks for this tier. Slower tiers accrue
    /// proportionally larger per-tick amounts, so the per-second rate is the
    /// same across tiers.
    pub fn income_interval_ms(self) -> u64 {
        match self {
            Difficulty::Easy => 1000,
            Difficulty::Normal => 3000,
            Difficulty::Hard => 5000,
            Difficulty::VeryHard => 7000,
        }
    }
}

/// Whether a tradable asset is an equity or a coin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Stock,
    Crypto,
}

/// A catalog-defined business type, never mutated at runtime.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessTemplate {
    /// Template identifier, e.g. "ret_1".
    pub id: BusinessId,
    /// Display name.
    pub name: String,
    /// Cost of the first branch, in whole currency units.
    pub base_price: f64,
    /// Income per second of a level-0 branch.
    pub base_income: f64,
    /// Flat per-branch upkeep per second, independent of level.
    pub maintenance: f64,
    /// Industry tag used for grouping and synergies.
    pub category: IndustryCategory,
    /// Display-only risk score in [0,1]; read by no formula.
    pub risk: f64,
    /// Display-only growth figure; read by no formula.
    pub growth: f64,
}

/// A tradable asset: static seed fields plus live market and holding state.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetState {
    /// Asset identifier, e.g. "s3" or "c1".
    pub id: AssetId,
    /// Display name.
    pub name: String,
    /// Stock or crypto.
    #[serde(rename = "type")]
    pub kind: AssetKind,
    /// Current unit price; floored at 0.01 by the market tick.
    pub price: f64,
    /// Recent prices, oldest first. Never empty, at most
    /// [`PRICE_HISTORY_CAP`] entries.
    pub history: Vec<f64>,
    /// Scale of the per-tick random step, in [0,1].
    pub volatility: f64,
    /// Signed drift bias added to every step.
    pub trend: f64,
    /// Quantity held; fractional, never negative.
    #[serde(default)]
    pub owned: f64,
    /// Volume-weighted average cost basis of the held quantity.
    #[serde(default)]
    pub avg_buy_price: f64,
    /// Industry tag shown next to stocks; coins carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<IndustryCategory>,
}

impl AssetState {
    /// Current market value of the held quantity.
    pub fn market_value(&self) -> f64 {
        self.owned * self.price
    }

    /// Sets a new price and appends it to the history ring, evicting the
    /// oldest entries beyond [`PRICE_HISTORY_CAP`].
    pub fn record_price(&mut self, price: f64) {
        self.price = price;
        self.history.push(price);
        if self.history.len() > PRICE_HISTORY_CAP {
            let excess = self.history.len() - PRICE_HISTORY_CAP;
            self.history.drain(..excess);
        }
    }
}

/// A catalog-defined lifestyle item, never mutated at runtime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LifestyleItem {
    /// Item identifier, e.g. "sc2".
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Purchase price in whole currency units.
    pub price: f64,
    /// Cosmetic prestige score; display only.
    pub prestige: u64,
    /// Each owned unit contributes (multiplier - 1) to the lifestyle bonus.
    pub multiplier: f64,
    /// Display image URL.
    pub image: String,
}

/// One owned, independently leveled branch of a business template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedBusiness {
    /// Unique per acquisition event.
    pub instance_id: InstanceId,
    /// Template this branch was built from.
    pub business_id: BusinessId,
    /// Upgrade level in 0..=[`MAX_BUSINESS_LEVEL`]. Moves forward only.
    pub level: u8,
}

/// Holding entry for a lifestyle item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OwnedLifestyle {
    /// Item this entry counts.
    pub id: ItemId,
    /// Units held, at least 1; a sell that would reach 0 removes the entry.
    pub count: u32,
}

/// The root snapshot of one player's progress.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    /// Display name; save documents are keyed by its lowercased form.
    #[serde(default)]
    pub username: String,
    /// Liquid cash; fractional accrual is expected.
    #[serde(default = "default_money")]
    pub money: f64,
    /// Lifetime earnings from income ticks and taps; never decreases.
    #[serde(default)]
    pub total_earned: f64,
    /// Experience points; never decrease.
    #[serde(default)]
    pub xp: f64,
    /// Cached player level; never decreases even if the xp rule changes.
    #[serde(default = "default_level")]
    pub level: u32,
    /// Tick-speed tier chosen at account creation.
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Base gain of one manual tap, before multipliers.
    #[serde(default = "default_click_power")]
    pub click_power: f64,
    /// Manual-gain upgrade level in 1..=[`MAX_CLICK_LEVEL`].
    #[serde(default = "default_click_level")]
    pub click_level: u8,
    /// Owned business branches, in acquisition order.
    #[serde(default)]
    pub owned_businesses: Vec<OwnedBusiness>,
    /// Tradable assets seeded from the catalog, mutated by market ticks.
    #[serde(default)]
    pub assets: Vec<AssetState>,
    /// Owned lifestyle items.
    #[serde(default)]
    pub inventory: Vec<OwnedLifestyle>,
    /// Current macro cycle.
    #[serde(default)]
    pub economic_cycle: EconomicCycle,
    /// Time of the last successful save; epoch milliseconds on the wire.
    #[serde(default = "Utc::now", with = "chrono::serde::ts_milliseconds")]
    pub last_save: DateTime<Utc>,
    /// Gates the income and market ticks; the persistence tick keeps running.
    #[serde(default)]
    pub is_paused: bool,
}

fn default_money() -> f64 {
    STARTING_MONEY
}

fn default_level() -> u32 {
    1
}

fn default_click_power() -> f64 {
    1.0
}

fn default_click_level() -> u8 {
    1
}

impl PlayerState {
    /// Number of owned branches built from the given template. Acquisition
    /// pricing depends on this count, not on global state.
    pub fn branch_count(&self, id: &BusinessId) -> u32 {
        self.owned_businesses
            .iter()
            .filter(|ob| &ob.business_id == id)
            .count() as u32
    }

    /// Looks up an owned branch by instance id.
    pub fn branch(&self, id: &InstanceId) -> Option<&OwnedBusiness> {
        self.owned_businesses
            .iter()
            .find(|ob| &ob.instance_id == id)
    }

    /// Looks up an asset record by id.
    pub fn asset(&self, id: &AssetId) -> Option<&AssetState> {
        self.assets.iter().find(|a| &a.id == id)
    }

    /// Mutable asset lookup.
    pub fn asset_mut(&mut self, id: &AssetId) -> Option<&mut AssetState> {
        self.assets.iter_mut().find(|a| &a.id == id)
    }

    /// Looks up an inventory entry by item id.
    pub fn inventory_entry(&self, id: &ItemId) -> Option<&OwnedLifestyle> {
        self.inventory.iter().find(|ol| &ol.id == id)
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Names and ids must not be blank.
    #[error("empty name or id")]
    EmptyName,
    /// Numeric field must be finite.
    #[error("non-finite numeric value encountered")]
    NonFinite,
    /// Prices must be strictly positive.
    #[error("price must be > 0")]
    NonPositivePrice,
    /// Monetary amounts must be non-negative.
    #[error("negative monetary value is invalid")]
    NegativeMoney,
    /// Experience never goes below zero.
    #[error("negative progress counter")]
    NegativeProgress,
    /// Ratio fields live in [0,1].
    #[error("ratio out of range [0,1]")]
    RatioOutOfRange,
    /// Lifestyle multipliers are at least 1.
    #[error("lifestyle multiplier must be >= 1")]
    MultiplierBelowOne,
    /// Ids must be unique within their collection.
    #[error("duplicate id: {0}")]
    DuplicateId(String),
    /// Catalog seeds never carry player holdings.
    #[error("catalog seed {0} carries holdings")]
    SeedWithHoldings(String),
    /// Branch level above the upgrade cap.
    #[error("business level {0} exceeds the upgrade cap")]
    LevelAboveCap(u8),
    /// Player level starts at 1.
    #[error("player level must be >= 1")]
    LevelBelowOne,
    /// Click level lives in 1..=20.
    #[error("click level {0} out of range")]
    ClickLevelOutOfRange(u8),
    /// Click power starts at 1 and only grows.
    #[error("click power must be > 0")]
    NonPositiveClickPower,
    /// Price history is never empty and never exceeds the cap.
    #[error("price history empty or above cap")]
    HistoryOutOfBounds,
    /// Inventory entries hold at least one unit.
    #[error("inventory entry with zero count")]
    ZeroCount,
}

/// Validate one business template.
pub fn validate_business_template(b: &BusinessTemplate) -> Result<(), ValidationError> {
    if b.id.0.trim().is_empty() || b.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if !(b.base_price.is_finite()
        && b.base_income.is_finite()
        && b.maintenance.is_finite()
        && b.risk.is_finite()
        && b.growth.is_finite())
    {
        return Err(ValidationError::NonFinite);
    }
    if b.base_price <= 0.0 {
        return Err(ValidationError::NonPositivePrice);
    }
    if b.base_income < 0.0 || b.maintenance < 0.0 {
        return Err(ValidationError::NegativeMoney);
    }
    if !(0.0..=1.0).contains(&b.risk) {
        return Err(ValidationError::RatioOutOfRange);
    }
    Ok(())
}

/// Validate one asset record, seed or live.
pub fn validate_asset(a: &AssetState) -> Result<(), ValidationError> {
    if a.id.0.trim().is_empty() || a.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if !(a.price.is_finite()
        && a.volatility.is_finite()
        && a.trend.is_finite()
        && a.owned.is_finite()
        && a.avg_buy_price.is_finite()
        && a.history.iter().all(|p| p.is_finite()))
    {
        return Err(ValidationError::NonFinite);
    }
    if a.price <= 0.0 {
        return Err(ValidationError::NonPositivePrice);
    }
    if !(0.0..=1.0).contains(&a.volatility) {
        return Err(ValidationError::RatioOutOfRange);
    }
    if a.owned < 0.0 || a.avg_buy_price < 0.0 {
        return Err(ValidationError::NegativeMoney);
    }
    if a.history.is_empty() || a.history.len() > PRICE_HISTORY_CAP {
        return Err(ValidationError::HistoryOutOfBounds);
    }
    Ok(())
}

/// Validate one lifestyle item.
pub fn validate_lifestyle_item(i: &LifestyleItem) -> Result<(), ValidationError> {
    if i.id.0.trim().is_empty() || i.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if !(i.price.is_finite() && i.multiplier.is_finite()) {
        return Err(ValidationError::NonFinite);
    }
    if i.price <= 0.0 {
        return Err(ValidationError::NonPositivePrice);
    }
    if i.multiplier < 1.0 {
        return Err(ValidationError::MultiplierBelowOne);
    }
    Ok(())
}

/// Validate a full snapshot, including every embedded asset record.
pub fn validate_player(p: &PlayerState) -> Result<(), ValidationError> {
    if p.username.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if !(p.money.is_finite()
        && p.total_earned.is_finite()
        && p.xp.is_finite()
        && p.click_power.is_finite())
    {
        return Err(ValidationError::NonFinite);
    }
    if p.money < 0.0 || p.total_earned < 0.0 {
        return Err(ValidationError::NegativeMoney);
    }
    if p.xp < 0.0 {
        return Err(ValidationError::NegativeProgress);
    }
    if p.level < 1 {
        return Err(ValidationError::LevelBelowOne);
    }
    if !(1..=MAX_CLICK_LEVEL).contains(&p.click_level) {
        return Err(ValidationError::ClickLevelOutOfRange(p.click_level));
    }
    if p.click_power <= 0.0 {
        return Err(ValidationError::NonPositiveClickPower);
    }

    let mut instance_ids = std::collections::BTreeSet::new();
    for ob in &p.owned_businesses {
        if ob.instance_id.0.trim().is_empty() || ob.business_id.0.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if ob.level > MAX_BUSINESS_LEVEL {
            return Err(ValidationError::LevelAboveCap(ob.level));
        }
        if !instance_ids.insert(&ob.instance_id) {
            return Err(ValidationError::DuplicateId(ob.instance_id.0.clone()));
        }
    }

    let mut asset_ids = std::collections::BTreeSet::new();
    for a in &p.assets {
        validate_asset(a)?;
        if !asset_ids.insert(&a.id) {
            return Err(ValidationError::DuplicateId(a.id.0.clone()));
        }
    }

    let mut item_ids = std::collections::BTreeSet::new();
    for ol in &p.inventory {
        if ol.count == 0 {
            return Err(ValidationError::ZeroCount);
        }
        if !item_ids.insert(&ol.id) {
            return Err(ValidationError::DuplicateId(ol.id.0.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stock(id: &str, price: f64) -> AssetState {
        AssetState {
            id: AssetId(id.to_string()),
            name: format!("{id} Corp"),
            kind: AssetKind::Stock,
            price,
            history: vec![price],
            volatility: 0.03,
            trend: 0.001,
            owned: 0.0,
            avg_buy_price: 0.0,
            sector: Some(IndustryCategory::Retail),
        }
    }

    fn snapshot() -> PlayerState {
        PlayerState {
            username: "riko".to_string(),
            money: STARTING_MONEY,
            total_earned: 0.0,
            xp: 0.0,
            level: 1,
            difficulty: Difficulty::VeryHard,
            click_power: 1.0,
            click_level: 1,
            owned_businesses: vec![OwnedBusiness {
                instance_id: InstanceId("inst-1".to_string()),
                business_id: BusinessId("ret_1".to_string()),
                level: 3,
            }],
            assets: vec![stock("s1", 100.0)],
            inventory: vec![OwnedLifestyle {
                id: ItemId("l1".to_string()),
                count: 2,
            }],
            economic_cycle: EconomicCycle::Boom,
            last_save: Utc::now(),
            is_paused: false,
        }
    }

    #[test]
    fn snapshot_roundtrip_keeps_holdings() {
        let p = snapshot();
        validate_player(&p).unwrap();
        let s = serde_json::to_string(&p).unwrap();
        let back: PlayerState = serde_json::from_str(&s).unwrap();
        assert_eq!(back.owned_businesses, p.owned_businesses);
        assert_eq!(back.inventory, p.inventory);
        assert_eq!(back.economic_cycle, EconomicCycle::Boom);
        assert_eq!(back.difficulty, Difficulty::VeryHard);
    }

    #[test]
    fn wire_format_matches_legacy_documents() {
        let s = serde_json::to_string(&snapshot()).unwrap();
        for key in [
            "\"totalEarned\"",
            "\"clickPower\"",
            "\"clickLevel\"",
            "\"ownedBusinesses\"",
            "\"instanceId\"",
            "\"businessId\"",
            "\"avgBuyPrice\"",
            "\"economicCycle\"",
            "\"lastSave\"",
            "\"isPaused\"",
            "\"type\":\"stock\"",
            "\"Very Hard\"",
        ] {
            assert!(s.contains(key), "missing {key} in {s}");
        }
    }

    #[test]
    fn last_save_serializes_as_epoch_millis() {
        let mut p = snapshot();
        p.last_save = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let v: serde_json::Value = serde_json::to_value(&p).unwrap();
        assert_eq!(v["lastSave"], serde_json::json!(1_700_000_000_000i64));
    }

    #[test]
    fn sparse_legacy_document_fills_defaults() {
        let back: PlayerState =
            serde_json::from_str(r#"{"username":"riko","money":250.0}"#).unwrap();
        assert_eq!(back.money, 250.0);
        assert_eq!(back.level, 1);
        assert_eq!(back.click_level, 1);
        assert_eq!(back.click_power, 1.0);
        assert_eq!(back.difficulty, Difficulty::Easy);
        assert_eq!(back.economic_cycle, EconomicCycle::Normal);
        assert!(back.owned_businesses.is_empty());
        assert!(!back.is_paused);
    }

    #[test]
    fn record_price_keeps_history_bounded() {
        let mut a = stock("s1", 100.0);
        for i in 0..100 {
            a.record_price(100.0 + i as f64);
        }
        assert_eq!(a.history.len(), PRICE_HISTORY_CAP);
        assert_eq!(a.price, 199.0);
        assert_eq!(*a.history.last().unwrap(), 199.0);
        assert_eq!(a.history[0], 170.0);
    }

    #[test]
    fn branch_count_ignores_other_templates() {
        let mut p = snapshot();
        p.owned_businesses.push(OwnedBusiness {
            instance_id: InstanceId("inst-2".to_string()),
            business_id: BusinessId("fin_1".to_string()),
            level: 0,
        });
        assert_eq!(p.branch_count(&BusinessId("ret_1".to_string())), 1);
        assert_eq!(p.branch_count(&BusinessId("fin_1".to_string())), 1);
        assert_eq!(p.branch_count(&BusinessId("air_2".to_string())), 0);
    }

    #[test]
    fn validate_player_rejects_duplicate_instances() {
        let mut p = snapshot();
        let dup = p.owned_businesses[0].clone();
        p.owned_businesses.push(dup);
        assert_eq!(
            validate_player(&p),
            Err(ValidationError::DuplicateId("inst-1".to_string()))
        );
    }

    #[test]
    fn validate_player_rejects_level_above_cap() {
        let mut p = snapshot();
        p.owned_businesses[0].level = MAX_BUSINESS_LEVEL + 1;
        assert_eq!(
            validate_player(&p),
            Err(ValidationError::LevelAboveCap(MAX_BUSINESS_LEVEL + 1))
        );
    }

    #[test]
    fn validate_asset_rejects_empty_history() {
        let mut a = stock("s1", 100.0);
        a.history.clear();
        assert_eq!(validate_asset(&a), Err(ValidationError::HistoryOutOfBounds));
    }

    proptest! {
        #[test]
        fn valid_assets_pass(price in 0.01f64..1e6, vol in 0.0f64..1.0,
                             trend in -0.01f64..0.01, owned in 0.0f64..1e6) {
            let mut a = stock("s1", price);
            a.volatility = vol;
            a.trend = trend;
            a.owned = owned;
            a.avg_buy_price = price;
            prop_assert!(validate_asset(&a).is_ok());
        }

        #[test]
        fn history_stays_bounded(prices in proptest::collection::vec(0.01f64..1e9, 1..200)) {
            let mut a = stock("s1", prices[0]);
            for p in &prices {
                a.record_price(*p);
            }
            prop_assert!(!a.history.is_empty());
            prop_assert!(a.history.len() <= PRICE_HISTORY_CAP);
            prop_assert_eq!(*a.history.last().unwrap(), a.price);
        }
    }
}
