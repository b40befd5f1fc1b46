#![deny(warnings)]

//! The session runtime: one player's live snapshot plus its clock.
//!
//! A [`Session`] owns the [`PlayerState`], the catalog, a seeded RNG and a
//! save store. Hosts drive it with exactly two calls: [`Session::advance`]
//! hands in elapsed wall-clock time and fires the due ticks, and
//! [`Session::apply`] runs one player command. Every transition is a plain
//! synchronous function call, so a given seed and command script replays
//! identically.
//!
//! Three schedules run inside `advance`: the income tick (interval set by
//! difficulty), the market tick (fixed 3 s) and the persistence flush.
//! While the simulation is paused the first two no-op but still consume
//! their intervals; pausing never banks ticks for later.

pub mod command;

pub use command::{Applied, Command, Rejection};

use chrono::Utc;
use persistence::{normalize_key, SaveDocument, SaveStore, StoreError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sim_core::{Catalog, Difficulty, EconomicCycle, PlayerState};
use sim_econ::{level_for_xp, report};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Milliseconds between market ticks, independent of difficulty.
pub const MARKET_INTERVAL_MS: u64 = 3_000;

/// Engine knobs a host sets once at login.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Seed for the session's ChaCha8 stream; equal seeds replay equally.
    pub rng_seed: u64,
    /// Milliseconds between persistence flushes (minimum 1).
    pub autosave_interval_ms: u64,
    /// Whether SellLifestyleItem is available at all.
    pub allow_lifestyle_resale: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rng_seed: 42,
            autosave_interval_ms: 10_000,
            allow_lifestyle_resale: true,
        }
    }
}

struct Timer {
    interval: Duration,
    remaining: Duration,
}

impl Timer {
    fn new(interval_ms: u64) -> Self {
        let interval = Duration::from_millis(interval_ms.max(1));
        Self {
            interval,
            remaining: interval,
        }
    }
}

/// One player's live simulation.
///
/// Created by [`Session::login`], torn down by [`Session::logout`]. The
/// session owns its store; persistence failures are logged and swallowed,
/// so gameplay never halts on a flaky backend.
pub struct Session<S: SaveStore> {
    catalog: Catalog,
    state: PlayerState,
    player_key: String,
    cfg: EngineConfig,
    rng: ChaCha8Rng,
    store: S,
    seq: u64,
    next_instance: u64,
    income_timer: Timer,
    market_timer: Timer,
    autosave_timer: Timer,
}

impl<S: SaveStore> Session<S> {
    /// Loads the player's save or creates a fresh snapshot.
    ///
    /// Difficulty: an explicit choice wins, otherwise the saved value,
    /// otherwise Easy. New players and explicit re-choices are flushed
    /// immediately so the chosen difficulty survives a crash right after
    /// login. Only a failing `load` aborts the login; a failing initial
    /// flush is logged and swallowed like any other save error.
    pub fn login(
        mut store: S,
        catalog: Catalog,
        player_key: &str,
        difficulty_choice: Option<Difficulty>,
        cfg: EngineConfig,
    ) -> Result<Session<S>, StoreError> {
        let key = normalize_key(player_key);
        let (state, seq, flush_now) = match store.load(&key)? {
            Some(doc) => {
                let difficulty = difficulty_choice.unwrap_or(doc.state.difficulty);
                let username = if doc.state.username.is_empty() {
                    player_key.trim().to_string()
                } else {
                    doc.state.username.clone()
                };
                let mut state = catalog.rehydrate(&username, doc.state);
                state.difficulty = difficulty;
                info!("resumed {} at save seq {}", key, doc.seq);
                (state, doc.seq, difficulty_choice.is_some())
            }
            None => {
                let difficulty = difficulty_choice.unwrap_or_default();
                info!("created {} on {:?} difficulty", key, difficulty);
                (catalog.new_player(player_key.trim(), difficulty), 0, true)
            }
        };
        let mut session = Session {
            income_timer: Timer::new(state.difficulty.income_interval_ms()),
            market_timer: Timer::new(MARKET_INTERVAL_MS),
            autosave_timer: Timer::new(cfg.autosave_interval_ms),
            rng: ChaCha8Rng::seed_from_u64(cfg.rng_seed),
            next_instance: 1,
            catalog,
            state,
            player_key: key,
            cfg,
            store,
            seq,
        };
        if flush_now {
            if let Err(e) = session.flush() {
                warn!("initial save failed for {}: {}", session.player_key, e);
            }
        }
        Ok(session)
    }

    /// The live snapshot.
    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    /// Direct snapshot access for hosts and tools. Commands and ticks keep
    /// the invariants; a caller mutating through this must do the same.
    pub fn state_mut(&mut self) -> &mut PlayerState {
        &mut self.state
    }

    /// The catalog this session reads.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The engine configuration fixed at login.
    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Stamp of the last attempted save.
    pub fn save_seq(&self) -> u64 {
        self.seq
    }

    /// Normalized key the saves are filed under.
    pub fn player_key(&self) -> &str {
        &self.player_key
    }

    /// Runs one player command against the snapshot.
    pub fn apply(&mut self, command: Command) -> Result<Applied, Rejection> {
        let applied = command::apply(
            &self.catalog,
            &self.cfg,
            &mut self.state,
            &mut self.next_instance,
            command,
        )?;
        debug!("applied {:?}", applied);
        Ok(applied)
    }

    /// Consumes elapsed wall-clock time and fires every tick that came due,
    /// in deadline order. Timers sharing a deadline fire income first, then
    /// market, then persistence.
    pub fn advance(&mut self, elapsed: Duration) {
        let mut left = elapsed;
        loop {
            let due = self
                .income_timer
                .remaining
                .min(self.market_timer.remaining)
                .min(self.autosave_timer.remaining);
            if due > left {
                self.income_timer.remaining -= left;
                self.market_timer.remaining -= left;
                self.autosave_timer.remaining -= left;
                return;
            }
            left -= due;
            self.income_timer.remaining -= due;
            self.market_timer.remaining -= due;
            self.autosave_timer.remaining -= due;
            if self.income_timer.remaining.is_zero() {
                self.income_timer.remaining = self.income_timer.interval;
                self.income_tick();
            }
            if self.market_timer.remaining.is_zero() {
                self.market_timer.remaining = self.market_timer.interval;
                self.market_tick();
            }
            if self.autosave_timer.remaining.is_zero() {
                self.autosave_timer.remaining = self.autosave_timer.interval;
                if let Err(e) = self.flush() {
                    warn!("autosave failed for {}: {}", self.player_key, e);
                }
            }
        }
    }

    /// Serializes the snapshot and writes it through the store.
    ///
    /// The seq stamp and the in-memory lastSave move only when the write
    /// succeeds. A session whose saves keep failing therefore retries the
    /// same stamp instead of walking past a stale-write guard's mark.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        let stamp = Utc::now();
        let seq = self.seq + 1;
        let mut snapshot = self.state.clone();
        snapshot.last_save = stamp;
        let doc = SaveDocument {
            seq,
            saved_at: stamp,
            state: snapshot,
        };
        self.store.save(&self.player_key, &doc)?;
        self.seq = seq;
        self.state.last_save = stamp;
        debug!("saved {} at seq {}", self.player_key, seq);
        Ok(())
    }

    /// Best-effort save hook for process shutdown paths.
    pub fn flush_before_termination(&mut self) {
        if let Err(e) = self.flush() {
            warn!("termination save failed for {}: {}", self.player_key, e);
        }
    }

    /// Final save attempt, then tears the session down. Returns the store
    /// so a host can hand it to the next login.
    pub fn logout(mut self) -> S {
        if let Err(e) = self.flush() {
            warn!("logout save failed for {}: {}", self.player_key, e);
        }
        info!("logged out {}", self.player_key);
        self.store
    }

    fn income_tick(&mut self) {
        if self.state.is_paused {
            return;
        }
        let summary = report::income_summary(&self.catalog, &self.state);
        let fraction = self.income_timer.interval.as_millis() as f64 / 1000.0;
        let added = summary.net * fraction;
        self.state.money += added;
        self.state.total_earned += added;
        self.state.xp += added * 0.0001 + 0.01 * fraction;
        let candidate = level_for_xp(self.state.xp);
        // The cached level never moves backwards, whatever the xp says.
        if candidate > self.state.level {
            self.state.level = candidate;
            info!("{} reached level {}", self.state.username, candidate);
        }
        debug!(
            "income tick: +{:.2} over {:.1}s at x{:.2}",
            added, fraction, summary.multiplier
        );
    }

    fn market_tick(&mut self) {
        if self.state.is_paused {
            return;
        }
        // The recession doubling reads the cycle as it stood at tick time,
        // before any resample below.
        let swing = if self.state.economic_cycle == EconomicCycle::Recession {
            2.0
        } else {
            1.0
        };
        for asset in &mut self.state.assets {
            let draw: f64 = self.rng.gen_range(0.0..1.0);
            let change = (draw - 0.5 + asset.trend) * asset.volatility * swing;
            let price = (asset.price * (1.0 + change)).max(0.01);
            asset.record_price(price);
        }
        // One market tick in a hundred redraws the cycle; redrawing the
        // current value is allowed.
        if self.rng.gen_range(0.0..1.0) < 0.01 {
            let next = EconomicCycle::ALL[self.rng.gen_range(0..EconomicCycle::ALL.len())];
            if next != self.state.economic_cycle {
                info!(
                    "economic cycle shifted {:?} -> {:?}",
                    self.state.economic_cycle, next
                );
            }
            self.state.economic_cycle = next;
        }
    }
}
