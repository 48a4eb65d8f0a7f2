/// Status effect lookup — buffs and debuffs read from a frame snapshot.
///
/// Statuses are owned by the game-state layer; this module only reads them.
/// A lookup against a missing subject, or against a subject that cannot carry
/// statuses at all, yields `None` rather than failing.
use crate::world::GameObject;
use serde::{Deserialize, Serialize};

pub type StatusId = u16;
pub type ObjectId = u32;

/// Source id written by the game for statuses applied by the environment
/// rather than an actor. Treated the same as "applied by me".
pub const ENVIRONMENT_SOURCE: ObjectId = 0xE000_0000;

/// Source id meaning "unset".
pub const NO_SOURCE: ObjectId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub status_id:      StatusId,
    /// Seconds left. 0 means the status is present but expired/permanent-off.
    pub remaining_time: f32,
    #[serde(default)]
    pub source_id:      ObjectId,
}

/// Capability implemented only by subjects that carry a status list.
pub trait HasStatusList {
    fn status_list(&self) -> &[StatusEffect];
}

/// Which sources a lookup accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFilter {
    /// Any actor's instance of the status.
    Any,
    /// Only instances attributable to `player`: unset source, the environment
    /// sentinel, or the player's own object id.
    Player { player: ObjectId, environment: ObjectId },
}

impl SourceFilter {
    fn accepts(&self, source: ObjectId) -> bool {
        match *self {
            SourceFilter::Any => true,
            SourceFilter::Player { player, environment } => {
                source == NO_SOURCE || source == environment || source == player
            }
        }
    }
}

/// First status on `subject` with `status_id` accepted by `filter`.
pub fn find_status<'a>(
    subject:   Option<&'a dyn GameObject>,
    status_id: StatusId,
    filter:    SourceFilter,
) -> Option<&'a StatusEffect> {
    subject?
        .as_status_holder()?
        .status_list()
        .iter()
        .find(|s| s.status_id == status_id && filter.accepts(s.source_id))
}

pub fn remaining_time(status: Option<&StatusEffect>) -> f32 {
    status.map(|s| s.remaining_time).unwrap_or(0.0)
}

/// Present with a nonzero timer.
pub fn has_status(status: Option<&StatusEffect>) -> bool {
    remaining_time(status) != 0.0
}

/// Present with more than `window` seconds left — not worth refreshing yet.
pub fn enough_status(status: Option<&StatusEffect>, window: f32) -> bool {
    remaining_time(status) > window
}
