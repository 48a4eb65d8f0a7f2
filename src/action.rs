/// Action definitions and the eligibility predicate.
///
/// A definition is built once through `ActionBuilder` and is frozen from then
/// on. `evaluate` runs the gates below in order and stops at the first one
/// that blocks. Structural checks come first and status scans come last:
///
///   1. anti-repeat    — last action is this one or a forbidden predecessor
///   2. level
///   3. resource       — player MP below cost
///   4. missing buff   — required self buff absent
///   5. buff active    — a buff this action grants is already up
///   6. debuff fresh   — target debuffs don't need refreshing yet
///   7. cooling down   — ability with no charge banked
///   8. custom check
///
/// Evaluation never fails: with no player or no target every status lookup
/// comes back empty.
use crate::{
    config::RuleConfig,
    cooldown::{CooldownTracker, Recast},
    error::ConfigError,
    status::{self, SourceFilter, StatusEffect, StatusId},
    world::WorldSnapshot,
};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

pub type ActionId = u32;

/// Caller-supplied extra condition. True means "allowed".
pub type CustomCheck = Arc<dyn Fn() -> bool + Send + Sync>;

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Blocker {
    AntiRepeat,
    Level,
    Resource,
    MissingBuff,
    BuffActive,
    DebuffFresh,
    CoolingDown,
    CustomCheck,
}

impl Blocker {
    pub fn key(&self) -> &'static str {
        match self {
            Self::AntiRepeat  => "anti_repeat",
            Self::Level       => "level",
            Self::Resource    => "resource",
            Self::MissingBuff => "missing_buff",
            Self::BuffActive  => "buff_active",
            Self::DebuffFresh => "debuff_fresh",
            Self::CoolingDown => "cooling_down",
            Self::CustomCheck => "custom_check",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Usable,
    Blocked(Blocker),
}

impl Verdict {
    pub fn is_usable(&self) -> bool {
        matches!(self, Verdict::Usable)
    }
}

/// Everything one frame's evaluations read. Borrowed, never mutated.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    pub world:     &'a WorldSnapshot,
    pub cooldowns: &'a CooldownTracker,
    pub rules:     &'a RuleConfig,
}

impl<'a> EvalContext<'a> {
    /// Statuses attributable to the local player. None without a player,
    /// which makes every status lookup come back empty.
    fn player_filter(&self) -> Option<SourceFilter> {
        self.world.player_id().map(|player| SourceFilter::Player {
            player,
            environment: self.rules.environment_source,
        })
    }

    fn self_status(&self, id: StatusId) -> Option<&'a StatusEffect> {
        status::find_status(self.world.player_object(), id, self.player_filter()?)
    }

    fn target_status(&self, id: StatusId) -> Option<&'a StatusEffect> {
        status::find_status(self.world.target_object(), id, self.player_filter()?)
    }
}

// ---------------------------------------------------------------------------
// ActionDefinition
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct ActionDefinition {
    id:                  ActionId,
    name:                String,
    level:               u8,
    is_ability:          bool,
    mp_cost:             u32,
    forbidden_after:     Vec<ActionId>,
    buff_needed:         Option<StatusId>,
    buffs_provided:      Vec<StatusId>,
    target_debuffs:      Vec<StatusId>,
    require_all_debuffs: bool,
    recast:              Option<Recast>,
    check:               Option<CustomCheck>,
}

impl fmt::Debug for ActionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("level", &self.level)
            .field("is_ability", &self.is_ability)
            .field("mp_cost", &self.mp_cost)
            .field("forbidden_after", &self.forbidden_after)
            .field("buff_needed", &self.buff_needed)
            .field("buffs_provided", &self.buffs_provided)
            .field("target_debuffs", &self.target_debuffs)
            .field("require_all_debuffs", &self.require_all_debuffs)
            .field("recast", &self.recast)
            .field("check", &self.check.is_some())
            .finish()
    }
}

impl ActionDefinition {
    pub fn builder(id: ActionId, level: u8) -> ActionBuilder {
        ActionBuilder::new(id, level)
    }

    pub fn id(&self) -> ActionId { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn level(&self) -> u8 { self.level }
    pub fn is_ability(&self) -> bool { self.is_ability }
    pub fn mp_cost(&self) -> u32 { self.mp_cost }
    pub fn forbidden_after(&self) -> &[ActionId] { &self.forbidden_after }
    pub fn buff_needed(&self) -> Option<StatusId> { self.buff_needed }
    pub fn buffs_provided(&self) -> &[StatusId] { &self.buffs_provided }
    pub fn target_debuffs(&self) -> &[StatusId] { &self.target_debuffs }
    pub fn require_all_debuffs(&self) -> bool { self.require_all_debuffs }
    pub fn recast(&self) -> Option<Recast> { self.recast }

    pub fn is_usable(&self, ctx: &EvalContext<'_>, level: u8, last_action: Option<ActionId>) -> bool {
        self.evaluate(ctx, level, last_action).is_usable()
    }

    pub fn evaluate(&self, ctx: &EvalContext<'_>, level: u8, last_action: Option<ActionId>) -> Verdict {
        let verdict = match self.first_blocker(ctx, level, last_action) {
            Some(blocker) => Verdict::Blocked(blocker),
            None          => Verdict::Usable,
        };
        tracing::trace!("{} ({}) -> {:?}", self.name, self.id, verdict);
        verdict
    }

    fn first_blocker(
        &self,
        ctx:         &EvalContext<'_>,
        level:       u8,
        last_action: Option<ActionId>,
    ) -> Option<Blocker> {
        if let Some(last) = last_action {
            if last == self.id || self.forbidden_after.contains(&last) {
                return Some(Blocker::AntiRepeat);
            }
        }

        if level < self.level {
            return Some(Blocker::Level);
        }

        if ctx.world.current_mp() < self.mp_cost {
            return Some(Blocker::Resource);
        }

        if let Some(buff) = self.buff_needed {
            if !status::has_status(ctx.self_status(buff)) {
                return Some(Blocker::MissingBuff);
            }
        }

        if self.buffs_provided.iter().any(|&b| status::has_status(ctx.self_status(b))) {
            return Some(Blocker::BuffActive);
        }

        if self.debuffs_still_fresh(ctx) {
            return Some(Blocker::DebuffFresh);
        }

        if self.is_ability && !ctx.cooldowns.is_ready(self.id) {
            return Some(Blocker::CoolingDown);
        }

        if let Some(check) = &self.check {
            if !check() {
                return Some(Blocker::CustomCheck);
            }
        }

        None
    }

    /// Multi-debuff actions are skipped only when nothing is about to fall
    /// off; single-debuff actions are skipped when any listed debuff is fresh.
    fn debuffs_still_fresh(&self, ctx: &EvalContext<'_>) -> bool {
        if self.target_debuffs.is_empty() {
            return false;
        }
        let window = ctx.rules.debuff_refresh_window;
        let mut fresh = self
            .target_debuffs
            .iter()
            .map(|&d| status::enough_status(ctx.target_status(d), window));

        if self.require_all_debuffs {
            fresh.all(|f| f)
        } else {
            fresh.any(|f| f)
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects rule fields, then validates once in `build`.
#[derive(Clone)]
pub struct ActionBuilder {
    def: ActionDefinition,
}

impl ActionBuilder {
    pub fn new(id: ActionId, level: u8) -> Self {
        Self {
            def: ActionDefinition {
                id,
                name:                format!("action#{}", id),
                level,
                is_ability:          false,
                mp_cost:             0,
                forbidden_after:     Vec::new(),
                buff_needed:         None,
                buffs_provided:      Vec::new(),
                target_debuffs:      Vec::new(),
                require_all_debuffs: false,
                recast:              None,
                check:               None,
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.def.name = name.into();
        self
    }

    /// Off-GCD ability gated by its own recast.
    pub fn ability(mut self) -> Self {
        self.def.is_ability = true;
        self
    }

    pub fn mp_cost(mut self, mp: u32) -> Self {
        self.def.mp_cost = mp;
        self
    }

    pub fn forbidden_after(mut self, ids: impl IntoIterator<Item = ActionId>) -> Self {
        self.def.forbidden_after.extend(ids);
        self
    }

    pub fn buff_needed(mut self, status: StatusId) -> Self {
        self.def.buff_needed = Some(status);
        self
    }

    pub fn buffs_provided(mut self, ids: impl IntoIterator<Item = StatusId>) -> Self {
        self.def.buffs_provided.extend(ids);
        self
    }

    pub fn target_debuffs(mut self, ids: impl IntoIterator<Item = StatusId>) -> Self {
        self.def.target_debuffs.extend(ids);
        self
    }

    pub fn require_all_debuffs(mut self) -> Self {
        self.def.require_all_debuffs = true;
        self
    }

    pub fn recast(mut self, recast: Recast) -> Self {
        self.def.recast = Some(recast);
        self
    }

    pub fn check(mut self, check: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.def.check = Some(Arc::new(check));
        self
    }

    pub fn build(self) -> Result<ActionDefinition, ConfigError> {
        if self.def.id == 0 {
            return Err(ConfigError::ReservedActionId);
        }
        if let Some(recast) = &self.def.recast {
            recast.validate(self.def.id)?;
        }
        Ok(self.def)
    }
}
