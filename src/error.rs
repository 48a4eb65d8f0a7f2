/// Configuration errors — the only failures the engine ever reports.
///
/// Everything here is raised while definitions are being built or registered.
/// The per-frame evaluation path never returns an error.
use crate::action::ActionId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("action id 0 is reserved")]
    ReservedActionId,

    #[error("action {action}: max_charges must be at least 1")]
    ZeroCharges { action: ActionId },

    #[error("action {action}: recast must be a positive number of seconds (got {recast})")]
    InvalidRecast { action: ActionId, recast: f32 },

    #[error("action {0} is already registered")]
    DuplicateAction(ActionId),

    #[error("no rotation profile named '{0}'")]
    UnknownProfile(String),

    #[error("rotation profile parse error: {0}")]
    ProfileParse(String),
}
