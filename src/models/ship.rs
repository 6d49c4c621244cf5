use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum NavStatus {
    #[serde(rename = "DOCKED")]
    Docked,
    #[serde(rename = "IN_ORBIT")]
    InOrbit,
    #[serde(rename = "IN_TRANSIT")]
    InTransit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum FlightMode {
    #[serde(rename = "DRIFT")]
    Drift,
    #[serde(rename = "STEALTH")]
    Stealth,
    #[serde(rename = "CRUISE")]
    Cruise,
    #[serde(rename = "BURN")]
    Burn,
}

impl FlightMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightMode::Drift => "DRIFT",
            FlightMode::Stealth => "STEALTH",
            FlightMode::Cruise => "CRUISE",
            FlightMode::Burn => "BURN",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Ship {
    pub symbol: String,
    pub registration: ShipRegistration,
    pub nav: ShipNav,
    pub frame: ShipFrame,
    pub cooldown: ShipCooldown,
    pub modules: Vec<ShipModule>,
    pub mounts: Vec<ShipMount>,
    pub cargo: ShipCargo,
    pub fuel: ShipFuel,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShipRegistration {
    pub name: String,
    pub role: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShipNav {
    #[serde(rename = "systemSymbol")]
    pub system_symbol: String,
    #[serde(rename = "waypointSymbol")]
    pub waypoint_symbol: String,
    pub route: ShipRoute,
    pub status: NavStatus,
    #[serde(rename = "flightMode")]
    pub flight_mode: FlightMode,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShipRoute {
    pub origin: ShipRouteWaypoint,
    pub destination: ShipRouteWaypoint,
    #[serde(rename = "departureTime")]
    pub departure_time: DateTime<Utc>,
    pub arrival: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShipRouteWaypoint {
    pub symbol: String,
    #[serde(rename = "systemSymbol")]
    pub system_symbol: String,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShipFrame {
    pub symbol: String,
    #[serde(rename = "moduleSlots")]
    pub module_slots: i32,
    #[serde(rename = "mountingPoints")]
    pub mounting_points: i32,
    #[serde(rename = "fuelCapacity")]
    pub fuel_capacity: i32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShipModule {
    pub symbol: String,
    pub capacity: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShipMount {
    pub symbol: String,
    pub strength: Option<i32>,
    pub deposits: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShipCooldown {
    #[serde(rename = "shipSymbol")]
    pub ship_symbol: String,
    #[serde(rename = "totalSeconds")]
    pub total_seconds: i64,
    #[serde(rename = "remainingSeconds")]
    pub remaining_seconds: i64,
    pub expiration: Option<DateTime<Utc>>,
}

impl ShipCooldown {
    pub fn ready(&self, now: DateTime<Utc>) -> bool {
        match self.expiration {
            Some(expiry) => expiry <= now,
            None => true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShipCargo {
    pub capacity: i32,
    pub units: i32,
    pub inventory: Vec<CargoItem>,
}

impl ShipCargo {
    pub fn space_remaining(&self) -> i32 {
        self.capacity - self.units
    }

    pub fn units_of(&self, symbol: &str) -> i32 {
        self.inventory
            .iter()
            .filter(|item| item.symbol == symbol)
            .map(|item| item.units)
            .sum()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CargoItem {
    pub symbol: String,
    pub units: i32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShipFuel {
    pub current: i32,
    pub capacity: i32,
}

impl Ship {
    pub fn is_docked(&self) -> bool {
        self.nav.status == NavStatus::Docked
    }

    pub fn is_in_orbit(&self) -> bool {
        self.nav.status == NavStatus::InOrbit
    }

    /// A ship counts as in transit until its route arrival time has passed.
    pub fn in_transit(&self, now: DateTime<Utc>) -> bool {
        self.nav.status == NavStatus::InTransit && self.nav.route.arrival > now
    }

    pub fn has_module(&self, fragment: &str) -> bool {
        self.modules.iter().any(|m| m.symbol.contains(fragment))
    }

    pub fn has_mount(&self, fragment: &str) -> bool {
        self.mounts.iter().any(|m| m.symbol.contains(fragment))
    }
}

// Agent account summary
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentInfo {
    pub symbol: String,
    pub headquarters: String,
    pub credits: i64,
    #[serde(rename = "shipCount")]
    pub ship_count: i32,
}
