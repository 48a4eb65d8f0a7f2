/// Per-frame world snapshot — the character and target state the rule set reads.
///
/// The snapshot is built once per frame by the caller and borrowed immutably
/// by every candidate evaluation in that frame, so all candidates see the same
/// state.
use crate::status::{HasStatusList, ObjectId, StatusEffect};
use serde::{Deserialize, Serialize};

/// Anything that can be the local player or the current target.
pub trait GameObject {
    fn object_id(&self) -> ObjectId;

    /// Status-list capability. Subjects that cannot carry statuses keep the
    /// default and every lookup against them comes back empty.
    fn as_status_holder(&self) -> Option<&dyn HasStatusList> {
        None
    }
}

/// A combatant: players, enemies, party members.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleChara {
    pub object_id:  ObjectId,
    #[serde(default)]
    pub current_mp: u32,
    #[serde(default)]
    pub statuses:   Vec<StatusEffect>,
}

impl GameObject for BattleChara {
    fn object_id(&self) -> ObjectId {
        self.object_id
    }

    fn as_status_holder(&self) -> Option<&dyn HasStatusList> {
        Some(self)
    }
}

impl HasStatusList for BattleChara {
    fn status_list(&self) -> &[StatusEffect] {
        &self.statuses
    }
}

/// A targetable non-combatant (aetheryte, treasure coffer, NPC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventObject {
    pub object_id: ObjectId,
}

impl GameObject for EventObject {
    fn object_id(&self) -> ObjectId {
        self.object_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetObject {
    Battle(BattleChara),
    Event(EventObject),
}

impl TargetObject {
    pub fn as_game_object(&self) -> &dyn GameObject {
        match self {
            Self::Battle(c) => c,
            Self::Event(o)  => o,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// None while loading, in cutscenes, or before login.
    #[serde(default)]
    pub player: Option<BattleChara>,
    #[serde(default)]
    pub target: Option<TargetObject>,
}

impl WorldSnapshot {
    pub fn player_object(&self) -> Option<&dyn GameObject> {
        self.player.as_ref().map(|p| p as &dyn GameObject)
    }

    pub fn target_object(&self) -> Option<&dyn GameObject> {
        self.target.as_ref().map(TargetObject::as_game_object)
    }

    pub fn player_id(&self) -> Option<ObjectId> {
        self.player.as_ref().map(|p| p.object_id)
    }

    /// Current MP, or 0 with no local player.
    pub fn current_mp(&self) -> u32 {
        self.player.as_ref().map(|p| p.current_mp).unwrap_or(0)
    }
}
