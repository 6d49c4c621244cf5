use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Waypoint {
    pub symbol: String,
    #[serde(rename = "type")]
    pub waypoint_type: String,
    #[serde(rename = "systemSymbol")]
    pub system_symbol: String,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub traits: Vec<Trait>,
    pub chart: Option<Chart>,
    #[serde(rename = "isUnderConstruction", default)]
    pub is_under_construction: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Trait {
    pub symbol: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Chart {
    #[serde(rename = "submittedBy")]
    pub submitted_by: Option<String>,
    #[serde(rename = "submittedOn")]
    pub submitted_on: Option<String>,
}

impl Waypoint {
    pub fn has_trait(&self, symbol: &str) -> bool {
        self.traits.iter().any(|t| t.symbol == symbol)
    }

    pub fn has_marketplace(&self) -> bool {
        self.has_trait("MARKETPLACE")
    }

    pub fn has_shipyard(&self) -> bool {
        self.has_trait("SHIPYARD")
    }

    pub fn is_jump_gate(&self) -> bool {
        self.waypoint_type == "JUMP_GATE"
    }

    pub fn is_asteroid(&self) -> bool {
        self.waypoint_type.contains("ASTEROID")
    }

    pub fn is_gas_giant(&self) -> bool {
        self.waypoint_type == "GAS_GIANT"
    }

    pub fn is_uncharted(&self) -> bool {
        self.chart.is_none() || self.has_trait("UNCHARTED")
    }

    /// Euclidean distance between two waypoints in the same system
    pub fn distance_to(&self, other: &Waypoint) -> f64 {
        let dx = (other.x - self.x) as f64;
        let dy = (other.y - self.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

// Shipyard listing (cached reference data)
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Shipyard {
    pub symbol: String,
    #[serde(rename = "shipTypes")]
    pub ship_types: Vec<ShipyardShipType>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShipyardShipType {
    #[serde(rename = "type")]
    pub ship_type: String,
}
