//! Contract violations reported by the core

use std::fmt;

use crate::sim::EntityId;

#[derive(Clone, Debug, PartialEq)]
pub enum CoreError {
    AlreadyInGame { entity: EntityId },
    ForeignEntity { entity: EntityId },
    ScriptAlreadyAdded,
    ScriptNotAdded,
    UpgradeAlreadyInstalled,
    UpgradeNotInstalled,
    InvalidSize { value: u32 },
    InvalidMaxHitpoints { value: i32 },
    NegativeRadius { radius: f64 },
    InvalidPickUpCount { times: u32 },
    NotEnoughPickUps { kind: &'static str, owned: u32, requested: u32 },
    InvalidSpawnConfig { reason: &'static str },
    InvalidConfig { reason: String },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInGame { entity } => {
                write!(f, "entity {entity} is already part of a game")
            }
            Self::ForeignEntity { entity } => {
                write!(f, "entity {entity} was created for another game")
            }
            Self::ScriptAlreadyAdded => write!(f, "script was already added to this game"),
            Self::ScriptNotAdded => write!(f, "script is not part of this game"),
            Self::UpgradeAlreadyInstalled => {
                write!(f, "laser upgrade already decorates a laser")
            }
            Self::UpgradeNotInstalled => write!(f, "laser upgrade is not installed"),
            Self::InvalidSize { value } => write!(f, "invalid entity size: {value} (must be >= 1)"),
            Self::InvalidMaxHitpoints { value } => {
                write!(f, "invalid max hitpoints: {value} (must be >= 1)")
            }
            Self::NegativeRadius { radius } => write!(f, "radius must not be negative: {radius}"),
            Self::InvalidPickUpCount { times } => {
                write!(f, "pick-up count must be >= 1, got {times}")
            }
            Self::NotEnoughPickUps {
                kind,
                owned,
                requested,
            } => write!(
                f,
                "cannot remove {requested} pick-ups of kind {kind}: only {owned} owned"
            ),
            Self::InvalidSpawnConfig { reason } => write!(f, "invalid spawn settings: {reason}"),
            Self::InvalidConfig { reason } => write!(f, "invalid configuration: {reason}"),
        }
    }
}

impl std::error::Error for CoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = CoreError::AlreadyInGame {
            entity: EntityId(7),
        };
        assert_eq!(err.to_string(), "entity #7 is already part of a game");

        let err = CoreError::NotEnoughPickUps {
            kind: "shield",
            owned: 1,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "cannot remove 3 pick-ups of kind shield: only 1 owned"
        );
    }
}
