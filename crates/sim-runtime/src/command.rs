//! The command set: every player-initiated mutation of a snapshot.
//!
//! Commands validate against the current snapshot and either mutate it or
//! reject with the failed precondition. A rejected command leaves the
//! snapshot untouched, so hosts can surface the rejection and carry on.

use crate::EngineConfig;
use sim_core::{
    AssetId, BusinessId, Catalog, InstanceId, ItemId, OwnedBusiness, OwnedLifestyle, PlayerState,
    MAX_BUSINESS_LEVEL, MAX_CLICK_LEVEL,
};
use sim_econ::report;
use sim_econ::{acquisition_price, click_upgrade_price, lifestyle_resale, upgrade_price};
use thiserror::Error;

/// A player action against the snapshot.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    AcquireBusiness { business_id: BusinessId },
    UpgradeBusiness { instance_id: InstanceId },
    LiquidateBusiness { instance_id: InstanceId },
    BuyAsset { asset_id: AssetId, quantity: f64 },
    SellAsset { asset_id: AssetId, quantity: f64 },
    BuyLifestyleItem { item_id: ItemId },
    SellLifestyleItem { item_id: ItemId },
    UpgradeClickPower,
    Tap,
    SetPaused { paused: bool },
}

/// What an accepted command did: prices paid, proceeds received, ids
/// created. Hosts use this for feedback lines and effects.
#[derive(Clone, Debug, PartialEq)]
pub enum Applied {
    BusinessAcquired { instance_id: InstanceId, price: f64 },
    BusinessUpgraded { instance_id: InstanceId, level: u8, price: f64 },
    BusinessLiquidated { instance_id: InstanceId, proceeds: f64 },
    AssetBought { asset_id: AssetId, quantity: f64, cost: f64 },
    AssetSold { asset_id: AssetId, quantity: f64, proceeds: f64 },
    LifestyleBought { item_id: ItemId, price: f64 },
    LifestyleSold { item_id: ItemId, refund: f64 },
    ClickPowerUpgraded { click_level: u8, click_power: f64, price: f64 },
    Tapped { gain: f64 },
    PauseSet { paused: bool },
}

/// The precondition a rejected command failed.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Rejection {
    #[error("need {needed:.2} but only {available:.2} on hand")]
    InsufficientFunds { needed: f64, available: f64 },
    #[error("unknown business template {0}")]
    UnknownBusiness(String),
    #[error("unknown business instance {0}")]
    UnknownInstance(String),
    #[error("unknown asset {0}")]
    UnknownAsset(String),
    #[error("unknown lifestyle item {0}")]
    UnknownItem(String),
    #[error("branch is already at the level cap")]
    LevelCapReached,
    #[error("click power is already at the level cap")]
    ClickCapReached,
    #[error("quantity must be positive")]
    NonPositiveQuantity,
    #[error("tried to sell {requested} with only {owned} held")]
    InsufficientHoldings { requested: f64, owned: f64 },
    #[error("lifestyle resale is disabled")]
    ResaleDisabled,
    #[error("simulation is paused")]
    Paused,
}

/// Mints an instance id no current branch uses. Ids are "inst-N"; the
/// counter bumps past ids already present in a loaded save.
fn fresh_instance_id(state: &PlayerState, next: &mut u64) -> InstanceId {
    loop {
        let candidate = InstanceId(format!("inst-{}", *next));
        *next += 1;
        if state.branch(&candidate).is_none() {
            return candidate;
        }
    }
}

fn charge(state: &mut PlayerState, price: f64) -> Result<(), Rejection> {
    if state.money < price {
        return Err(Rejection::InsufficientFunds {
            needed: price,
            available: state.money,
        });
    }
    state.money -= price;
    Ok(())
}

/// Applies one command to the snapshot.
///
/// Validation happens before any mutation; on rejection the snapshot is
/// bit-for-bit what it was. `next_instance` is the session's id counter.
pub fn apply(
    catalog: &Catalog,
    cfg: &EngineConfig,
    state: &mut PlayerState,
    next_instance: &mut u64,
    command: Command,
) -> Result<Applied, Rejection> {
    match command {
        Command::AcquireBusiness { business_id } => {
            let template = catalog
                .business(&business_id)
                .ok_or_else(|| Rejection::UnknownBusiness(business_id.0.clone()))?;
            let price = acquisition_price(template.base_price, state.branch_count(&business_id));
            charge(state, price)?;
            let instance_id = fresh_instance_id(state, next_instance);
            state.owned_businesses.push(OwnedBusiness {
                instance_id: instance_id.clone(),
                business_id,
                level: 0,
            });
            Ok(Applied::BusinessAcquired { instance_id, price })
        }
        Command::UpgradeBusiness { instance_id } => {
            let idx = state
                .owned_businesses
                .iter()
                .position(|ob| ob.instance_id == instance_id)
                .ok_or_else(|| Rejection::UnknownInstance(instance_id.0.clone()))?;
            let (business_id, level) = {
                let owned = &state.owned_businesses[idx];
                (owned.business_id.clone(), owned.level)
            };
            if level >= MAX_BUSINESS_LEVEL {
                return Err(Rejection::LevelCapReached);
            }
            let template = catalog
                .business(&business_id)
                .ok_or_else(|| Rejection::UnknownBusiness(business_id.0.clone()))?;
            let price = upgrade_price(template.base_price, level);
            charge(state, price)?;
            state.owned_businesses[idx].level = level + 1;
            Ok(Applied::BusinessUpgraded {
                instance_id,
                level: level + 1,
                price,
            })
        }
        Command::LiquidateBusiness { instance_id } => {
            let idx = state
                .owned_businesses
                .iter()
                .position(|ob| ob.instance_id == instance_id)
                .ok_or_else(|| Rejection::UnknownInstance(instance_id.0.clone()))?;
            let proceeds = report::branch_resale(catalog, &state.owned_businesses[idx]);
            state.money += proceeds;
            state.owned_businesses.remove(idx);
            Ok(Applied::BusinessLiquidated {
                instance_id,
                proceeds,
            })
        }
        Command::BuyAsset { asset_id, quantity } => {
            if !(quantity > 0.0) {
                return Err(Rejection::NonPositiveQuantity);
            }
            let (cost, old_owned, old_avg) = {
                let asset = state
                    .asset(&asset_id)
                    .ok_or_else(|| Rejection::UnknownAsset(asset_id.0.clone()))?;
                (asset.price * quantity, asset.owned, asset.avg_buy_price)
            };
            charge(state, cost)?;
            if let Some(asset) = state.asset_mut(&asset_id) {
                asset.avg_buy_price = (old_avg * old_owned + cost) / (old_owned + quantity);
                asset.owned = old_owned + quantity;
            }
            Ok(Applied::AssetBought {
                asset_id,
                quantity,
                cost,
            })
        }
        Command::SellAsset { asset_id, quantity } => {
            if !(quantity > 0.0) {
                return Err(Rejection::NonPositiveQuantity);
            }
            let (owned, proceeds) = {
                let asset = state
                    .asset(&asset_id)
                    .ok_or_else(|| Rejection::UnknownAsset(asset_id.0.clone()))?;
                (asset.owned, asset.price * quantity)
            };
            if owned < quantity {
                return Err(Rejection::InsufficientHoldings {
                    requested: quantity,
                    owned,
                });
            }
            state.money += proceeds;
            if let Some(asset) = state.asset_mut(&asset_id) {
                // The cost basis tracks buys only; selling never rewrites it.
                asset.owned = owned - quantity;
            }
            Ok(Applied::AssetSold {
                asset_id,
                quantity,
                proceeds,
            })
        }
        Command::BuyLifestyleItem { item_id } => {
            let price = catalog
                .lifestyle_item(&item_id)
                .ok_or_else(|| Rejection::UnknownItem(item_id.0.clone()))?
                .price;
            charge(state, price)?;
            match state.inventory.iter_mut().find(|e| e.id == item_id) {
                Some(entry) => entry.count += 1,
                None => state.inventory.push(OwnedLifestyle {
                    id: item_id.clone(),
                    count: 1,
                }),
            }
            Ok(Applied::LifestyleBought { item_id, price })
        }
        Command::SellLifestyleItem { item_id } => {
            if !cfg.allow_lifestyle_resale {
                return Err(Rejection::ResaleDisabled);
            }
            let price = catalog
                .lifestyle_item(&item_id)
                .ok_or_else(|| Rejection::UnknownItem(item_id.0.clone()))?
                .price;
            let idx = state
                .inventory
                .iter()
                .position(|e| e.id == item_id)
                .ok_or(Rejection::InsufficientHoldings {
                    requested: 1.0,
                    owned: 0.0,
                })?;
            let refund = lifestyle_resale(price);
            state.money += refund;
            if state.inventory[idx].count > 1 {
                state.inventory[idx].count -= 1;
            } else {
                state.inventory.remove(idx);
            }
            Ok(Applied::LifestyleSold { item_id, refund })
        }
        Command::UpgradeClickPower => {
            if state.click_level >= MAX_CLICK_LEVEL {
                return Err(Rejection::ClickCapReached);
            }
            let price = click_upgrade_price(state.click_level);
            charge(state, price)?;
            // The bump grows at click level 10, read before the increment.
            state.click_power += if state.click_level < 10 { 2.0 } else { 5.0 };
            state.click_level += 1;
            Ok(Applied::ClickPowerUpgraded {
                click_level: state.click_level,
                click_power: state.click_power,
                price,
            })
        }
        Command::Tap => {
            if state.is_paused {
                return Err(Rejection::Paused);
            }
            let gain = state.click_power * report::global_multiplier(catalog, state);
            state.money += gain;
            state.total_earned += gain;
            // Taps feed xp directly; the level catches up on the next
            // income tick.
            state.xp += 0.1;
            Ok(Applied::Tapped { gain })
        }
        Command::SetPaused { paused } => {
            state.is_paused = paused;
            Ok(Applied::PauseSet { paused })
        }
    }
}
