/// Cooldown display model — the numbers a cooldown window draws.
///
/// Nothing here feeds back into eligibility. In particular `skip` only hides
/// the countdown of abilities with a near-instant recast; `ActionDefinition`
/// still gates them on charges regardless.
use crate::{
    action::{ActionDefinition, ActionId},
    config::{DisplayConfig, DisplayStyle},
    cooldown::{CooldownState, CooldownTracker},
    registry::ActionRegistry,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CooldownDisplay {
    pub action:          ActionId,
    pub enough_level:    bool,
    pub cooling_down:    bool,
    /// Ability whose recast is too short to be worth a countdown.
    pub skip:            bool,
    /// 0.0..=1.0; meaning depends on `DisplayStyle`.
    pub progress:        f32,
    /// Whole seconds until the next charge, shown while cooling down.
    pub remaining_label: Option<u32>,
    /// Charge pips to draw; 0 for single-charge actions.
    pub banked_charges:  u8,
}

impl CooldownDisplay {
    pub fn new(
        def:    &ActionDefinition,
        state:  &CooldownState,
        level:  u8,
        config: &DisplayConfig,
    ) -> Self {
        let recast       = state.one_charge();
        let enough_level = level >= def.level();
        let cooling_down = state.is_cooling_down();
        let skip         = recast < config.skip_threshold && def.is_ability();

        let progress = match config.style {
            DisplayStyle::Overlay => {
                if recast == 0.0 || !enough_level {
                    0.0
                } else {
                    state.charge_progress() / recast
                }
            }
            DisplayStyle::Original => {
                if !enough_level {
                    0.0
                } else if recast == 0.0 || !cooling_down || skip {
                    1.0
                } else {
                    state.accumulated() / recast
                }
            }
        };

        let label = (enough_level && cooling_down && !skip)
            .then(|| remaining_label(recast, state.charge_progress()));

        let banked_charges = if enough_level && state.max_charges() > 1 {
            state.current_charges()
        } else {
            0
        };

        Self {
            action: def.id(),
            enough_level,
            cooling_down,
            skip,
            progress,
            remaining_label: label,
            banked_charges,
        }
    }
}

/// Whole seconds left on the regenerating charge, rounded so the label never
/// reads 0 before the charge is actually back.
pub fn remaining_label(recast: f32, charge_progress: f32) -> u32 {
    if recast <= 0.0 {
        return 0;
    }
    (recast - charge_progress % recast) as u32 + 1
}

/// Displays for every tracked action currently cooling down, in priority
/// order. GCD actions are left out unless `show_gcd_cooldown` is set.
pub fn visible_cooldowns(
    registry: &ActionRegistry,
    tracker:  &CooldownTracker,
    level:    u8,
    config:   &DisplayConfig,
) -> Vec<CooldownDisplay> {
    registry
        .iter()
        .filter(|def| config.show_gcd_cooldown || def.is_ability())
        .filter_map(|def| {
            let state = tracker.state(def.id())?;
            state
                .is_cooling_down()
                .then(|| CooldownDisplay::new(def, state, level, config))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cooldown::Recast;

    fn setup(def: ActionDefinition) -> (ActionRegistry, CooldownTracker) {
        let mut r = ActionRegistry::new();
        r.register(def).unwrap();
        let t = r.cooldown_tracker();
        (r, t)
    }

    fn ability(id: ActionId, recast: Recast) -> ActionDefinition {
        ActionDefinition::builder(id, 10).ability().recast(recast).build().unwrap()
    }

    #[test]
    fn label_never_reads_zero_while_cooling() {
        let (r, mut t) = setup(ability(1, Recast::single(30.0)));
        t.record_use(1);
        let cfg = DisplayConfig::default();
        for step in 0..60 {
            let d = CooldownDisplay::new(r.get(1).unwrap(), t.state(1).unwrap(), 90, &cfg);
            if !d.cooling_down {
                break;
            }
            assert!(d.remaining_label.unwrap() >= 1, "step {step}");
            t.advance(0.5);
        }
        assert!(!t.is_cooling_down(1));
    }

    #[test]
    fn label_arithmetic() {
        assert_eq!(remaining_label(30.0, 0.0), 31);
        assert_eq!(remaining_label(30.0, 29.5), 1);
        assert_eq!(remaining_label(30.0, 12.3), 18);
        assert_eq!(remaining_label(0.0, 5.0), 0);
    }

    #[test]
    fn overlay_progress_uses_regenerating_charge() {
        let (r, mut t) = setup(ability(2, Recast { one_charge: 20.0, max_charges: 3 }));
        t.record_use(2);
        t.record_use(2);
        t.advance(25.0); // one charge back, 5s into the next
        let d = CooldownDisplay::new(r.get(2).unwrap(), t.state(2).unwrap(), 90, &DisplayConfig::default());
        assert_eq!(d.banked_charges, 2);
        assert!((d.progress - 0.25).abs() < 1e-6);
        assert_eq!(d.remaining_label, Some(16));
    }

    #[test]
    fn original_style_divides_elapsed_by_one_charge() {
        let (r, mut t) = setup(ability(3, Recast { one_charge: 30.0, max_charges: 2 }));
        t.record_use(3);
        t.record_use(3);
        t.advance(15.0);
        let cfg = DisplayConfig { style: DisplayStyle::Original, ..DisplayConfig::default() };
        let d = CooldownDisplay::new(r.get(3).unwrap(), t.state(3).unwrap(), 90, &cfg);
        assert!((d.progress - 0.5).abs() < 1e-6);

        // One charge banked, halfway into the second: past a full dial.
        t.advance(30.0);
        let d = CooldownDisplay::new(r.get(3).unwrap(), t.state(3).unwrap(), 90, &cfg);
        assert!((d.progress - 1.5).abs() < 1e-6);

        let low = CooldownDisplay::new(r.get(3).unwrap(), t.state(3).unwrap(), 5, &cfg);
        assert_eq!(low.progress, 0.0);
        assert_eq!(low.banked_charges, 0);
        assert_eq!(low.remaining_label, None);
    }

    #[test]
    fn short_ability_recast_is_skipped_but_gcds_are_not() {
        let cfg = DisplayConfig { show_gcd_cooldown: true, ..DisplayConfig::default() };

        let gcd = ActionDefinition::builder(4, 1).recast(Recast::single(2.5)).build().unwrap();
        let (r, mut t) = setup(gcd);
        t.record_use(4);
        let d = CooldownDisplay::new(r.get(4).unwrap(), t.state(4).unwrap(), 90, &cfg);
        assert!(!d.skip);
        assert_eq!(d.remaining_label, Some(3));

        let (r, mut t) = setup(ability(5, Recast::single(1.0)));
        t.record_use(5);
        let d = CooldownDisplay::new(r.get(5).unwrap(), t.state(5).unwrap(), 90, &cfg);
        assert!(d.skip);
        assert_eq!(d.remaining_label, None);

        let cfg = DisplayConfig { style: DisplayStyle::Original, ..cfg };
        let d = CooldownDisplay::new(r.get(5).unwrap(), t.state(5).unwrap(), 90, &cfg);
        assert_eq!(d.progress, 1.0);
    }

    #[test]
    fn visible_list_filters_ready_and_gcd_actions() {
        let mut r = ActionRegistry::new();
        r.register(ability(6, Recast::single(60.0))).unwrap();
        r.register(ability(7, Recast::single(90.0))).unwrap();
        r.register(ActionDefinition::builder(8, 1).recast(Recast::single(2.5)).build().unwrap()).unwrap();
        let mut t = r.cooldown_tracker();
        t.record_use(7);
        t.record_use(8);

        let cfg = DisplayConfig::default();
        let shown: Vec<ActionId> = visible_cooldowns(&r, &t, 90, &cfg).iter().map(|d| d.action).collect();
        assert_eq!(shown, vec![7]);

        let cfg = DisplayConfig { show_gcd_cooldown: true, ..cfg };
        let shown: Vec<ActionId> = visible_cooldowns(&r, &t, 90, &cfg).iter().map(|d| d.action).collect();
        assert_eq!(shown, vec![7, 8]);
    }
}
