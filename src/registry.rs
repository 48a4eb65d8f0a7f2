/// Registry of action definitions in rotation priority order.
///
/// Definitions arrive validated by `ActionBuilder::build`; registration only
/// rejects duplicate ids. After that the registry is read-only and is only
/// asked which actions are legal this frame.
use crate::{
    action::{ActionDefinition, ActionId, Blocker, EvalContext, Verdict},
    cooldown::CooldownTracker,
    error::ConfigError,
};
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct ActionRegistry {
    /// Priority order: earlier entries win in `first_usable`.
    actions: Vec<ActionDefinition>,
    index:   HashMap<ActionId, usize>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `def` at the lowest priority so far.
    pub fn register(&mut self, def: ActionDefinition) -> Result<(), ConfigError> {
        if self.index.contains_key(&def.id()) {
            return Err(ConfigError::DuplicateAction(def.id()));
        }
        tracing::debug!("Registered {} ({}) at priority {}", def.name(), def.id(), self.actions.len());
        self.index.insert(def.id(), self.actions.len());
        self.actions.push(def);
        Ok(())
    }

    pub fn get(&self, id: ActionId) -> Option<&ActionDefinition> {
        self.index.get(&id).map(|&i| &self.actions[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionDefinition> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// A tracker seeded with every recast-classified action, fully charged.
    pub fn cooldown_tracker(&self) -> CooldownTracker {
        let mut tracker = CooldownTracker::new();
        for def in &self.actions {
            if let Some(recast) = def.recast() {
                tracker.insert_charged(def.id(), recast);
            }
        }
        tracker
    }

    /// Unknown ids are never usable.
    pub fn is_usable(
        &self,
        id:          ActionId,
        ctx:         &EvalContext<'_>,
        level:       u8,
        last_action: Option<ActionId>,
    ) -> bool {
        self.get(id)
            .map(|def| def.is_usable(ctx, level, last_action))
            .unwrap_or(false)
    }

    /// Every legal action this frame, in priority order.
    pub fn usable_actions(
        &self,
        ctx:         &EvalContext<'_>,
        level:       u8,
        last_action: Option<ActionId>,
    ) -> Vec<ActionId> {
        self.actions
            .iter()
            .filter(|def| def.is_usable(ctx, level, last_action))
            .map(ActionDefinition::id)
            .collect()
    }

    /// Highest-priority legal action, if any.
    pub fn first_usable(
        &self,
        ctx:         &EvalContext<'_>,
        level:       u8,
        last_action: Option<ActionId>,
    ) -> Option<ActionId> {
        self.actions
            .iter()
            .find(|def| def.is_usable(ctx, level, last_action))
            .map(ActionDefinition::id)
    }

    /// Verdict per action, in priority order.
    pub fn evaluate_all(
        &self,
        ctx:         &EvalContext<'_>,
        level:       u8,
        last_action: Option<ActionId>,
    ) -> Vec<(ActionId, Verdict)> {
        self.actions
            .iter()
            .map(|def| (def.id(), def.evaluate(ctx, level, last_action)))
            .collect()
    }

    /// Blocked actions with the gate that stopped each.
    pub fn blocked_actions(
        &self,
        ctx:         &EvalContext<'_>,
        level:       u8,
        last_action: Option<ActionId>,
    ) -> Vec<(ActionId, Blocker)> {
        self.evaluate_all(ctx, level, last_action)
            .into_iter()
            .filter_map(|(id, v)| match v {
                Verdict::Blocked(b) => Some((id, b)),
                Verdict::Usable     => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::RuleConfig,
        cooldown::Recast,
        world::{BattleChara, WorldSnapshot},
    };

    fn world(mp: u32) -> WorldSnapshot {
        WorldSnapshot {
            player: Some(BattleChara { object_id: 1, current_mp: mp, statuses: vec![] }),
            target: None,
        }
    }

    fn registry() -> ActionRegistry {
        let mut r = ActionRegistry::new();
        r.register(ActionDefinition::builder(10, 1).name("Opener").ability()
            .recast(Recast::single(60.0)).build().unwrap()).unwrap();
        r.register(ActionDefinition::builder(11, 30).name("Nuke").mp_cost(1000).build().unwrap()).unwrap();
        r.register(ActionDefinition::builder(12, 1).name("Filler").build().unwrap()).unwrap();
        r
    }

    #[test]
    fn rejects_duplicates() {
        let mut r = registry();
        let dup = ActionDefinition::builder(11, 1).build().unwrap();
        assert_eq!(r.register(dup), Err(ConfigError::DuplicateAction(11)));
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn seeds_tracker_from_recasts() {
        let mut r = registry();
        r.register(ActionDefinition::builder(13, 1).ability()
            .recast(Recast { one_charge: 15.0, max_charges: 3 }).build().unwrap()).unwrap();
        let t = r.cooldown_tracker();
        assert!(t.is_tracked(10));
        assert!(!t.is_tracked(11));
        assert_eq!(t.current_charges(10), 1);
        assert_eq!(t.current_charges(13), 3);
        assert!(!t.is_cooling_down(13));
    }

    #[test]
    fn lists_usable_actions_in_priority_order() {
        let r = registry();
        let mut t = r.cooldown_tracker();
        let rules = RuleConfig::default();
        let w = world(5000);

        let ctx = EvalContext { world: &w, cooldowns: &t, rules: &rules };
        assert_eq!(r.usable_actions(&ctx, 50, None), vec![10, 11, 12]);
        assert_eq!(r.first_usable(&ctx, 50, None), Some(10));

        t.record_use(10);
        let ctx = EvalContext { world: &w, cooldowns: &t, rules: &rules };
        assert_eq!(r.first_usable(&ctx, 50, Some(10)), Some(11));
        assert_eq!(r.first_usable(&ctx, 20, Some(10)), Some(12));
        assert_eq!(
            r.blocked_actions(&ctx, 20, Some(10)),
            vec![(10, Blocker::AntiRepeat), (11, Blocker::Level)]
        );
    }

    #[test]
    fn unknown_action_is_not_usable() {
        let r = registry();
        let t = r.cooldown_tracker();
        let rules = RuleConfig::default();
        let w = world(0);
        let ctx = EvalContext { world: &w, cooldowns: &t, rules: &rules };
        assert!(!r.is_usable(999, &ctx, 90, None));
        assert!(r.is_usable(12, &ctx, 90, None));
    }
}
