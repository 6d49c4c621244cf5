use crate::models::waypoint::Waypoint;
use serde::{Deserialize, Serialize};

/// A system and its (possibly partially paginated) waypoint list
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct System {
    pub symbol: String,
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
}

/// System symbol from a compound waypoint symbol: the first two
/// '-'-delimited segments ("X1-N5-BA5F" -> "X1-N5").
pub fn system_symbol_of(waypoint_symbol: &str) -> String {
    waypoint_symbol
        .split('-')
        .take(2)
        .collect::<Vec<&str>>()
        .join("-")
}

/// Jump gate connection record for one system's gate
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct JumpGate {
    pub symbol: String,
    #[serde(default)]
    pub connections: Vec<String>,
}
