//! Builtin reference tables and snapshot seeding.
//!
//! The catalog is the read-only side of the simulation: business templates,
//! tradable-asset seeds and lifestyle items. Player snapshots are created
//! from it on first login and re-merged over it on every later login, so
//! catalog entries added between sessions show up in old saves.

use crate::{
    validate_asset, validate_business_template, validate_lifestyle_item, AssetId, AssetKind,
    AssetState, BusinessId, BusinessTemplate, Difficulty, EconomicCycle, IndustryCategory, ItemId,
    LifestyleItem, PlayerState, ValidationError, PRICE_HISTORY_CAP, STARTING_MONEY,
};
use chrono::Utc;
use std::collections::BTreeSet;

/// The immutable reference tables the engine reads by identifier.
#[derive(Clone, Debug)]
pub struct Catalog {
    /// Business templates, grouped by industry.
    pub businesses: Vec<BusinessTemplate>,
    /// Asset seeds: stocks first, then coins. `owned` is always 0 here.
    pub assets: Vec<AssetState>,
    /// Lifestyle items, cheapest first.
    pub lifestyle: Vec<LifestyleItem>,
}

fn biz(
    id: &str,
    name: &str,
    base_price: f64,
    base_income: f64,
    maintenance: f64,
    category: IndustryCategory,
    risk: f64,
    growth: f64,
) -> BusinessTemplate {
    BusinessTemplate {
        id: BusinessId(id.to_string()),
        name: name.to_string(),
        base_price,
        base_income,
        maintenance,
        category,
        risk,
        growth,
    }
}

fn seed(
    id: &str,
    name: &str,
    kind: AssetKind,
    price: f64,
    volatility: f64,
    trend: f64,
    sector: Option<IndustryCategory>,
) -> AssetState {
    AssetState {
        id: AssetId(id.to_string()),
        name: name.to_string(),
        kind,
        price,
        history: vec![price],
        volatility,
        trend,
        owned: 0.0,
        avg_buy_price: 0.0,
        sector,
    }
}

fn item(id: &str, name: &str, price: f64, prestige: u64, multiplier: f64, image: &str) -> LifestyleItem {
    LifestyleItem {
        id: ItemId(id.to_string()),
        name: name.to_string(),
        price,
        prestige,
        multiplier,
        image: image.to_string(),
    }
}

impl Catalog {
    /// The shipped game data. Validated by tests; `validate_catalog` exists
    /// for catalogs assembled elsewhere.
    pub fn builtin() -> Catalog {
        use AssetKind::{Crypto, Stock};
        use IndustryCategory::*;

        Catalog {
            businesses: vec![
                biz("ret_1", "Warung Kelontong", 100.0, 2.0, 0.1, Retail, 0.05, 1.02),
                biz("ret_2", "Mini Market", 5_000.0, 45.0, 5.0, Retail, 0.08, 1.05),
                biz("ret_3", "Supermarket", 75_000.0, 850.0, 100.0, Retail, 0.1, 1.08),
                biz("ret_4", "Luxury Retail Chain", 2_000_000.0, 25_000.0, 3_000.0, Retail, 0.15, 1.15),
                biz("res_1", "Warung Makan", 250.0, 6.0, 1.0, Restaurants, 0.1, 1.03),
                biz("res_2", "Coffee Shop", 1_500.0, 20.0, 2.0, Restaurants, 0.12, 1.06),
                biz("res_3", "Fine Dining", 500_000.0, 6_500.0, 800.0, Restaurants, 0.2, 1.2),
                biz("med_1", "News Portal", 3_500.0, 40.0, 5.0, Media, 0.08, 1.1),
                biz("med_2", "TV Station Network", 25_000_000.0, 450_000.0, 60_000.0, Media, 0.15, 1.25),
                biz("shp_1", "Courier Service", 12_000.0, 150.0, 20.0, Shipping, 0.1, 1.07),
                biz("shp_2", "Cargo Fleet", 150_000_000.0, 2_200_000.0, 350_000.0, Shipping, 0.18, 1.15),
                biz("spr_1", "Local Gym", 20_000.0, 280.0, 35.0, Sport, 0.07, 1.05),
                biz("spr_2", "Football Club", 500_000_000.0, 8_500_000.0, 1_200_000.0, Sport, 0.25, 1.35),
                biz("hot_1", "Budget Hotel", 250_000.0, 3_200.0, 500.0, Hotels, 0.12, 1.12),
                biz("hot_2", "Luxury Resort", 120_000_000.0, 1_800_000.0, 250_000.0, Hotels, 0.2, 1.25),
                biz("pro_1", "House Flip", 800_000.0, 12_000.0, 1_500.0, Property, 0.15, 1.18),
                biz("pro_2", "Smart City Project", 5_000_000_000.0, 85_000_000.0, 12_000_000.0, Property, 0.22, 1.4),
                biz("it_1", "SaaS Startup", 150_000.0, 2_500.0, 300.0, IT, 0.3, 1.5),
                biz("it_2", "Data Center", 850_000_000.0, 15_000_000.0, 2_000_000.0, IT, 0.1, 1.2),
                biz("mdc_1", "Pharmacy Store", 45_000.0, 650.0, 80.0, Medicine, 0.05, 1.08),
                biz("mdc_2", "Pharma Lab", 1_200_000_000.0, 25_000_000.0, 4_000_000.0, Medicine, 0.4, 1.8),
                biz("rsc_1", "Corn Farm", 30_000.0, 500.0, 60.0, Resources, 0.1, 1.05),
                biz("rsc_2", "Oil Rig", 800_000_000.0, 18_000_000.0, 3_000_000.0, Resources, 0.25, 1.3),
                biz("fin_1", "Investment Firm", 500_000.0, 8_500.0, 1_200.0, Finance, 0.25, 1.25),
                biz("fin_2", "Global Bank", 15_000_000_000.0, 350_000_000.0, 60_000_000.0, Finance, 0.15, 1.15),
                biz("air_1", "Regional Carrier", 25_000_000.0, 450_000.0, 70_000.0, Airline, 0.2, 1.15),
                biz("air_2", "International Airline", 5_000_000_000.0, 120_000_000.0, 25_000_000.0, Airline, 0.25, 1.2),
            ],
            assets: vec![
                seed("s1", "TLKM Retail", Stock, 100.0, 0.02, 0.001, Some(Retail)),
                seed("s2", "BCA Finance", Stock, 800.0, 0.01, 0.0005, Some(Finance)),
                seed("s3", "GOTO Tech", Stock, 50.0, 0.06, -0.001, Some(IT)),
                seed("s4", "Astra Resources", Stock, 400.0, 0.03, 0.0008, Some(Resources)),
                seed("s5", "Garuda Airline", Stock, 120.0, 0.05, -0.002, Some(Airline)),
                seed("s6", "IndoFood Resto", Stock, 250.0, 0.02, 0.001, Some(Restaurants)),
                seed("s7", "Ciputra Prop", Stock, 900.0, 0.03, 0.002, Some(Property)),
                seed("s8", "Kalbe Pharma", Stock, 350.0, 0.02, 0.001, Some(Medicine)),
                seed("s9", "TransMedia", Stock, 500.0, 0.04, 0.0005, Some(Media)),
                seed("s10", "JNE Shipping", Stock, 150.0, 0.03, 0.001, Some(Shipping)),
                seed("c1", "BitSim (BSIM)", Crypto, 45_000.0, 0.08, 0.005, None),
                seed("c2", "EtherSim (ESIM)", Crypto, 2_800.0, 0.09, 0.004, None),
                seed("c3", "DogeSim (DSIM)", Crypto, 0.15, 0.25, 0.001, None),
                seed("c4", "MetaCoin (META)", Crypto, 12.0, 0.12, -0.002, None),
            ],
            lifestyle: vec![
                item("l1", "Laptop Gaming", 2_500.0, 10, 1.05, "https://images.unsplash.com/photo-1593642632823-8f785ba67e45?auto=format&fit=crop&q=80&w=1000"),
                item("rb1", "Trek Madone SL 7", 12_500.0, 25, 1.07, "https://images.unsplash.com/photo-1485965120184-e220f721d03e?auto=format&fit=crop&q=80&w=1000"),
                item("rb2", "S-Works Tarmac SL8", 15_000.0, 35, 1.08, "https://images.unsplash.com/photo-1517649763962-0c623066013b?auto=format&fit=crop&q=80&w=1000"),
                item("rb3", "Pinarello Dogma F", 22_000.0, 50, 1.10, "https://images.unsplash.com/photo-1532298229144-0ee0516ad01c?auto=format&fit=crop&q=80&w=1000"),
                item("mb1", "BMW M 1000 RR", 42_000.0, 150, 1.12, "https://images.unsplash.com/photo-1623127389146-24e05b531767?auto=format&fit=crop&q=80&w=1000"),
                item("mb2", "Ducati Panigale V4", 48_000.0, 180, 1.14, "https://images.unsplash.com/photo-1568772585407-9361f9bf3a87?auto=format&fit=crop&q=80&w=1000"),
                item("mb3", "Custom Cafe Racer", 65_000.0, 250, 1.16, "https://images.unsplash.com/photo-1515777315835-281b94c9589f?auto=format&fit=crop&q=80&w=1000"),
                item("l2", "Avanza Sim", 150_000.0, 500, 1.2, "https://images.unsplash.com/photo-1549317661-bd32c8ce0db2?auto=format&fit=crop&q=80&w=1000"),
                item("l3", "Rumah Kontrakan", 500_000.0, 1_000, 1.3, "https://images.unsplash.com/photo-1570129477492-45c003edd2be?auto=format&fit=crop&q=80&w=1000"),
                item("l4", "Honda Civic", 800_000.0, 2_000, 1.4, "https://images.unsplash.com/photo-1533473359331-0135ef1b58bf?auto=format&fit=crop&q=80&w=1000"),
                item("sc1", "Porsche 911 GT3", 2_800_000.0, 8_000, 1.8, "https://images.unsplash.com/photo-1503376780353-7e6692767b70?auto=format&fit=crop&q=80&w=1000"),
                item("sc2", "Ferrari SF90", 6_500_000.0, 15_000, 2.4, "https://images.unsplash.com/photo-1592198084033-aade902d1aae?auto=format&fit=crop&q=80&w=1000"),
                item("sc3", "Bugatti Chiron", 18_000_000.0, 40_000, 3.5, "https://images.unsplash.com/photo-1544636331-e26879cd4d9b?auto=format&fit=crop&q=80&w=1000"),
                item("l5", "Luxury Mansion", 45_000_000.0, 100_000, 5.0, "https://images.unsplash.com/photo-1512917774080-9991f1c4c750?auto=format&fit=crop&q=80&w=1000"),
                item("l6", "Private Jet", 180_000_000.0, 500_000, 10.0, "https://images.unsplash.com/photo-1520437358207-323b43b50729?auto=format&fit=crop&q=80&w=1000"),
            ],
        }
    }

    /// Template lookup by id.
    pub fn business(&self, id: &BusinessId) -> Option<&BusinessTemplate> {
        self.businesses.iter().find(|b| &b.id == id)
    }

    /// Lifestyle item lookup by id.
    pub fn lifestyle_item(&self, id: &ItemId) -> Option<&LifestyleItem> {
        self.lifestyle.iter().find(|i| &i.id == id)
    }

    /// Fresh snapshot for a first login.
    pub fn new_player(&self, username: &str, difficulty: Difficulty) -> PlayerState {
        PlayerState {
            username: username.to_string(),
            money: STARTING_MONEY,
            total_earned: 0.0,
            xp: 0.0,
            level: 1,
            difficulty,
            click_power: 1.0,
            click_level: 1,
            owned_businesses: vec![],
            assets: self.assets.clone(),
            inventory: vec![],
            economic_cycle: EconomicCycle::Normal,
            last_save: Utc::now(),
            is_paused: false,
        }
    }

    /// Merges a saved snapshot over catalog-seeded defaults.
    ///
    /// Scalars and owned collections come from the save. Assets are rebuilt
    /// from the current seeds, overlaying each saved record's market and
    /// holding fields by id: assets added to the catalog after the save was
    /// written appear seeded, and records for pruned assets drop out. A saved
    /// record with a zeroed price or an empty history falls back to the seed
    /// values, and oversized histories are re-bounded.
    pub fn rehydrate(&self, username: &str, saved: PlayerState) -> PlayerState {
        let assets = self
            .assets
            .iter()
            .map(|s| match saved.assets.iter().find(|a| a.id == s.id) {
                Some(a) => {
                    let mut merged = s.clone();
                    merged.owned = a.owned.max(0.0);
                    merged.avg_buy_price = a.avg_buy_price.max(0.0);
                    if a.price > 0.0 {
                        merged.price = a.price;
                    }
                    if !a.history.is_empty() {
                        merged.history = a.history.clone();
                        if merged.history.len() > PRICE_HISTORY_CAP {
                            let excess = merged.history.len() - PRICE_HISTORY_CAP;
                            merged.history.drain(..excess);
                        }
                    }
                    merged
                }
                None => s.clone(),
            })
            .collect();
        PlayerState {
            username: username.to_string(),
            assets,
            ..saved
        }
    }
}

/// Validate a whole catalog, including id uniqueness per table.
pub fn validate_catalog(c: &Catalog) -> Result<(), ValidationError> {
    let mut biz_ids = BTreeSet::new();
    for b in &c.businesses {
        validate_business_template(b)?;
        if !biz_ids.insert(&b.id) {
            return Err(ValidationError::DuplicateId(b.id.0.clone()));
        }
    }
    let mut asset_ids = BTreeSet::new();
    for a in &c.assets {
        validate_asset(a)?;
        if a.owned != 0.0 || a.avg_buy_price != 0.0 {
            return Err(ValidationError::SeedWithHoldings(a.id.0.clone()));
        }
        if !asset_ids.insert(&a.id) {
            return Err(ValidationError::DuplicateId(a.id.0.clone()));
        }
    }
    let mut item_ids = BTreeSet::new();
    for i in &c.lifestyle {
        validate_lifestyle_item(i)?;
        if !item_ids.insert(&i.id) {
            return Err(ValidationError::DuplicateId(i.id.0.clone()));
        }
    }
    Ok(())
}
