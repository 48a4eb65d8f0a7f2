/// Cooldown and charge bookkeeping for recast-gated actions.
///
/// Each tracked action keeps a single progress accumulator running from 0 up
/// to `one_charge * max_charges`. At the cap the action is fully charged and
/// no longer cooling down. Spending a charge subtracts one recast from the
/// accumulator while keeping any partial progress, so `elapsed % one_charge`
/// is always the time since the currently regenerating charge started.
/// Charges therefore come back one after another, never in parallel.
///
/// The tracker owns no clock. The frame updater advances it and reports uses;
/// the rule set and display layer only read it.
use crate::{action::ActionId, error::ConfigError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cooldown classification of an action: seconds per charge and bank size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recast {
    pub one_charge:  f32,
    #[serde(default = "default_max_charges")]
    pub max_charges: u8,
}

fn default_max_charges() -> u8 { 1 }

impl Recast {
    pub fn single(one_charge: f32) -> Self {
        Self { one_charge, max_charges: 1 }
    }

    pub fn validate(&self, action: ActionId) -> Result<(), ConfigError> {
        if self.max_charges == 0 {
            return Err(ConfigError::ZeroCharges { action });
        }
        if !self.one_charge.is_finite() || self.one_charge <= 0.0 {
            return Err(ConfigError::InvalidRecast { action, recast: self.one_charge });
        }
        Ok(())
    }

    pub fn total(&self) -> f32 {
        self.one_charge * self.max_charges as f32
    }
}

// ---------------------------------------------------------------------------
// Per-action state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CooldownState {
    recast:  Recast,
    elapsed: f32,
}

impl CooldownState {
    /// Fully charged.
    pub fn new(recast: Recast) -> Self {
        Self { recast, elapsed: recast.total() }
    }

    pub fn recast(&self) -> Recast {
        self.recast
    }

    pub fn one_charge(&self) -> f32 {
        self.recast.one_charge
    }

    pub fn max_charges(&self) -> u8 {
        self.recast.max_charges
    }

    /// Raw accumulator, including the fully-charged cap.
    pub fn accumulated(&self) -> f32 {
        self.elapsed
    }

    pub fn is_cooling_down(&self) -> bool {
        self.elapsed < self.recast.total()
    }

    pub fn current_charges(&self) -> u8 {
        let banked = (self.elapsed / self.recast.one_charge).floor() as u8;
        banked.min(self.recast.max_charges)
    }

    pub fn is_ready(&self) -> bool {
        self.current_charges() > 0
    }

    /// Accumulator while cooling down, 0 once fully charged.
    pub fn recast_time_elapsed(&self) -> f32 {
        if self.is_cooling_down() { self.elapsed } else { 0.0 }
    }

    /// Progress of the charge currently regenerating.
    pub fn charge_progress(&self) -> f32 {
        self.elapsed % self.recast.one_charge
    }

    fn advance(&mut self, dt: f32) {
        self.elapsed = (self.elapsed + dt).min(self.recast.total());
    }

    fn consume(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.elapsed = (self.elapsed - self.recast.one_charge).max(0.0);
        true
    }

    fn set_elapsed(&mut self, elapsed: f32) {
        self.elapsed = elapsed.clamp(0.0, self.recast.total());
    }
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct CooldownTracker {
    states: HashMap<ActionId, CooldownState>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `action`. Re-tracking replaces the old state with a
    /// fully charged one.
    pub fn track(&mut self, action: ActionId, recast: Recast) -> Result<(), ConfigError> {
        recast.validate(action)?;
        self.insert_charged(action, recast);
        Ok(())
    }

    /// `track` for a recast that already went through `ActionBuilder::build`.
    pub(crate) fn insert_charged(&mut self, action: ActionId, recast: Recast) {
        self.states.insert(action, CooldownState::new(recast));
    }

    pub fn is_tracked(&self, action: ActionId) -> bool {
        self.states.contains_key(&action)
    }

    pub fn state(&self, action: ActionId) -> Option<&CooldownState> {
        self.states.get(&action)
    }

    /// Advance every timer by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        if !dt.is_finite() || dt < 0.0 {
            tracing::warn!("Ignoring cooldown advance by {}s", dt);
            return;
        }
        for state in self.states.values_mut() {
            state.advance(dt);
        }
    }

    /// Spend one charge. False when no charge is banked or the action is untracked.
    pub fn record_use(&mut self, action: ActionId) -> bool {
        match self.states.get_mut(&action) {
            Some(state) => {
                let spent = state.consume();
                if !spent {
                    tracing::debug!("Action {} used with no charge banked", action);
                }
                spent
            }
            None => false,
        }
    }

    /// Overwrite the accumulator from a polled game value. Out-of-range values
    /// are clamped and non-finite ones ignored.
    pub fn set_elapsed(&mut self, action: ActionId, elapsed: f32) {
        if !elapsed.is_finite() {
            tracing::warn!("Ignoring elapsed override {} for action {}", elapsed, action);
            return;
        }
        if let Some(state) = self.states.get_mut(&action) {
            state.set_elapsed(elapsed);
        }
    }

    /// Refill every charge.
    pub fn reset(&mut self) {
        for state in self.states.values_mut() {
            state.elapsed = state.recast.total();
        }
    }

    // --- read-side queries; untracked actions read as idle -----------------

    pub fn is_cooling_down(&self, action: ActionId) -> bool {
        self.state(action).map(CooldownState::is_cooling_down).unwrap_or(false)
    }

    /// True when at least one charge is banked. Untracked actions are always ready.
    pub fn is_ready(&self, action: ActionId) -> bool {
        self.state(action).map(CooldownState::is_ready).unwrap_or(true)
    }

    pub fn current_charges(&self, action: ActionId) -> u8 {
        self.state(action).map(CooldownState::current_charges).unwrap_or(0)
    }

    pub fn max_charges(&self, action: ActionId) -> u8 {
        self.state(action).map(CooldownState::max_charges).unwrap_or(0)
    }

    pub fn recast_time_elapsed(&self, action: ActionId) -> f32 {
        self.state(action).map(CooldownState::recast_time_elapsed).unwrap_or(0.0)
    }

    pub fn recast_time_one_charge(&self, action: ActionId) -> f32 {
        self.state(action).map(CooldownState::one_charge).unwrap_or(0.0)
    }
}
