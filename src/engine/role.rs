// Role classification - a pure function of installed equipment

use crate::models::Ship;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Refinery,
    SurveyorMiner,
    Surveyor,
    Hauler,
    Siphoner,
    Miner,
    Explorer,
}

impl Role {
    pub fn is_mining(&self) -> bool {
        matches!(self, Role::Miner | Role::SurveyorMiner | Role::Siphoner)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Refinery => "Refinery",
            Role::SurveyorMiner => "SurveyorMiner",
            Role::Surveyor => "Surveyor",
            Role::Hauler => "Hauler",
            Role::Siphoner => "Siphoner",
            Role::Miner => "Miner",
            Role::Explorer => "Explorer",
        };
        write!(f, "{}", name)
    }
}

/// Derive a ship's role from its equipment, in fixed priority order.
/// Deterministic: the same equipment snapshot always yields the same role.
pub fn classify_role(ship: &Ship) -> Role {
    let has_refinery = ship.has_module("REFINERY");
    let has_sensor = ship.has_mount("MOUNT_SURVEYOR") || ship.has_mount("MOUNT_SENSOR");
    let has_mining = ship.has_mount("MOUNT_MINING_LASER");
    let has_siphon = ship.has_mount("MOUNT_GAS_SIPHON");
    let has_big_hold = ship.has_module("CARGO_HOLD_II");

    if has_refinery {
        Role::Refinery
    } else if has_sensor && has_mining {
        Role::SurveyorMiner
    } else if has_sensor {
        Role::Surveyor
    } else if has_big_hold {
        Role::Hauler
    } else if has_siphon {
        Role::Siphoner
    } else if has_mining {
        Role::Miner
    } else {
        Role::Explorer
    }
}
