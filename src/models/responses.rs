// Typed payloads returned by remote operations

use crate::models::contract::{ConstructionSite, Contract};
use crate::models::market::MarketTransaction;
use crate::models::ship::{ShipCargo, ShipCooldown, ShipFuel, ShipNav};
use crate::models::survey::Survey;
use crate::models::waypoint::Waypoint;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NavigationData {
    pub nav: ShipNav,
    pub fuel: ShipFuel,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct JumpData {
    pub nav: ShipNav,
    pub cooldown: ShipCooldown,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExtractionData {
    pub cargo: ShipCargo,
    pub cooldown: ShipCooldown,
    #[serde(rename = "yield")]
    pub extracted: ExtractionYield,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExtractionYield {
    pub symbol: String,
    pub units: i32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SurveyData {
    pub surveys: Vec<Survey>,
    pub cooldown: ShipCooldown,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RefuelData {
    pub fuel: ShipFuel,
    pub transaction: MarketTransaction,
    pub credits: i64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TradeData {
    pub cargo: ShipCargo,
    pub transaction: MarketTransaction,
    pub credits: i64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DeliveryData {
    pub contract: Contract,
    pub cargo: ShipCargo,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConstructionSupplyData {
    pub construction: ConstructionSite,
    pub cargo: ShipCargo,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChartData {
    pub waypoint: Waypoint,
}
