/// Rotation engine — the per-frame decision loop.
///
/// Each frame runs in two phases that never interleave:
///   1. write: advance cooldowns by the frame delta and spend a charge for
///      the action the game reports as used this frame;
///   2. read:  evaluate every registered action against one borrowed
///      `EvalContext`, so all candidates see the same snapshot.
///
/// `run` wraps the engine in a task fed by channels, the same shape as the
/// rest of the pipeline: frames and profile switches in, decisions out.
use crate::{
    action::{ActionId, Blocker, EvalContext, Verdict},
    config::EngineConfig,
    cooldown::CooldownTracker,
    display::{self, CooldownDisplay},
    registry::ActionRegistry,
    world::WorldSnapshot,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{Receiver, Sender};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One frame of game state from the poller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameUpdate {
    /// Seconds since the previous frame.
    #[serde(default)]
    pub dt:          f32,
    pub level:       u8,
    /// Most recent action used before this frame's decision.
    #[serde(default)]
    pub last_action: Option<ActionId>,
    /// Action the game executed during this frame, if any.
    #[serde(default)]
    pub used_action: Option<ActionId>,
    #[serde(default)]
    pub world:       WorldSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub frame:       u64,
    pub next_action: Option<ActionId>,
    pub usable:      Vec<ActionId>,
    pub blocked:     Vec<(ActionId, Blocker)>,
    pub cooldowns:   Vec<CooldownDisplay>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct RotationEngine {
    registry:  ActionRegistry,
    cooldowns: CooldownTracker,
    config:    EngineConfig,
    frame:     u64,
}

impl RotationEngine {
    pub fn new(registry: ActionRegistry, config: EngineConfig) -> Self {
        let cooldowns = registry.cooldown_tracker();
        Self { registry, cooldowns, config, frame: 0 }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    /// Swap the action table. Cooldowns restart fully charged.
    pub fn set_registry(&mut self, registry: ActionRegistry) {
        self.cooldowns = registry.cooldown_tracker();
        self.registry  = registry;
    }

    pub fn tick(&mut self, update: &FrameUpdate) -> Decision {
        self.frame += 1;

        // Phase 1: write
        self.cooldowns.advance(update.dt);
        if let Some(used) = update.used_action {
            if self.cooldowns.is_tracked(used) && !self.cooldowns.record_use(used) {
                tracing::warn!("Frame {}: action {} reported used with no charge", self.frame, used);
            }
        }

        // Phase 2: read
        let ctx = EvalContext {
            world:     &update.world,
            cooldowns: &self.cooldowns,
            rules:     &self.config.rules,
        };
        let mut usable  = Vec::new();
        let mut blocked = Vec::new();
        for (id, verdict) in self.registry.evaluate_all(&ctx, update.level, update.last_action) {
            match verdict {
                Verdict::Usable     => usable.push(id),
                Verdict::Blocked(b) => blocked.push((id, b)),
            }
        }
        let next_action = usable.first().copied();
        let cooldowns = display::visible_cooldowns(
            &self.registry,
            &self.cooldowns,
            update.level,
            &self.config.display,
        );

        tracing::debug!(
            "Frame {}: next={:?} usable={} blocked={}",
            self.frame, next_action, usable.len(), blocked.len()
        );

        Decision { frame: self.frame, next_action, usable, blocked, cooldowns }
    }
}

// ---------------------------------------------------------------------------
// Engine task
// ---------------------------------------------------------------------------

pub async fn run(
    mut frame_rx:   Receiver<FrameUpdate>,
    mut profile_rx: Receiver<ActionRegistry>,
    decision_tx:    Sender<Decision>,
    mut engine:     RotationEngine,
) -> Result<()> {
    loop {
        tokio::select! {
            // Profile switches are rare — apply before the next frame
            biased;

            Some(registry) = profile_rx.recv() => {
                tracing::info!("Profile switched ({} actions)", registry.len());
                engine.set_registry(registry);
            }

            Some(frame) = frame_rx.recv() => {
                let decision = engine.tick(&frame);
                if decision_tx.send(decision).await.is_err() {
                    return Ok(());
                }
            }

            else => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        action::ActionDefinition,
        cooldown::Recast,
        profiles,
        status::StatusEffect,
        world::{BattleChara, TargetObject},
    };
    use tokio::sync::mpsc;

    fn world(mp: u32, target_statuses: Vec<StatusEffect>) -> WorldSnapshot {
        WorldSnapshot {
            player: Some(BattleChara { object_id: 1, current_mp: mp, statuses: vec![] }),
            target: Some(TargetObject::Battle(BattleChara {
                object_id: 2,
                current_mp: 0,
                statuses: target_statuses,
            })),
        }
    }

    fn charge_registry() -> ActionRegistry {
        let mut r = ActionRegistry::new();
        r.register(
            ActionDefinition::builder(10, 10)
                .name("A")
                .ability()
                .recast(Recast { one_charge: 30.0, max_charges: 2 })
                .build()
                .unwrap(),
        )
        .unwrap();
        r.register(ActionDefinition::builder(20, 1).name("Filler").build().unwrap()).unwrap();
        r
    }

    #[test]
    fn charge_scenario_through_frames() {
        let mut eng = RotationEngine::new(charge_registry(), EngineConfig::default());
        let frame = |dt, used, last| FrameUpdate {
            dt,
            level: 10,
            last_action: last,
            used_action: used,
            world: world(0, vec![]),
        };

        // t = 0: first charge spent
        let d = eng.tick(&frame(0.0, Some(10), None));
        assert_eq!(eng.cooldowns().current_charges(10), 1);
        assert_eq!(d.next_action, Some(10));

        // t = 5: second charge spent
        let d = eng.tick(&frame(5.0, Some(10), None));
        assert_eq!(d.blocked, vec![(10, Blocker::CoolingDown)]);
        assert_eq!(d.next_action, Some(20));
        assert_eq!(d.cooldowns.len(), 1);
        assert_eq!(d.cooldowns[0].banked_charges, 0);

        // t = 35: exactly one charge back
        let d = eng.tick(&frame(30.0, None, None));
        assert_eq!(eng.cooldowns().current_charges(10), 1);
        assert_eq!(d.next_action, Some(10));
        assert_eq!(d.frame, 3);
    }

    #[test]
    fn dot_upkeep_with_embedded_profile() {
        let registry = profiles::load("WHM").unwrap().into_registry().unwrap();
        let mut eng = RotationEngine::new(registry, EngineConfig::default());

        let mut update = FrameUpdate { dt: 0.0, level: 20, world: world(10_000, vec![]), ..Default::default() };
        assert_eq!(eng.tick(&update).next_action, Some(121), "Aero when missing");

        update.world = world(10_000, vec![StatusEffect { status_id: 143, remaining_time: 20.0, source_id: 1 }]);
        assert_eq!(eng.tick(&update).next_action, Some(127), "Stone II when Aero is fresh");

        update.world = world(100, vec![]);
        assert_eq!(eng.tick(&update).next_action, None, "out of MP");
    }

    #[tokio::test]
    async fn task_relays_decisions_and_switches_profiles() {
        let (frame_tx, frame_rx)           = mpsc::channel(8);
        let (profile_tx, profile_rx)       = mpsc::channel(1);
        let (decision_tx, mut decision_rx) = mpsc::channel(8);

        let engine = RotationEngine::new(charge_registry(), EngineConfig::default());
        let task = tokio::spawn(run(frame_rx, profile_rx, decision_tx, engine));

        let update = FrameUpdate { dt: 0.1, level: 90, world: world(10_000, vec![]), ..Default::default() };
        frame_tx.send(update.clone()).await.unwrap();
        let d = decision_rx.recv().await.unwrap();
        assert_eq!(d.next_action, Some(10));

        let blm = profiles::load("BLM").unwrap().into_registry().unwrap();
        profile_tx.send(blm).await.unwrap();
        frame_tx.send(update).await.unwrap();
        let d = decision_rx.recv().await.unwrap();
        assert_eq!(d.next_action, Some(3574), "Sharpcast leads the BLM table");

        drop(frame_tx);
        drop(profile_tx);
        task.await.unwrap().unwrap();
    }
}
