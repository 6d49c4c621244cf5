// Capability interfaces consumed by the orchestration engine.
// The engine never talks to the network directly; every remote concern
// is injected through one of these traits.

pub mod live;

pub use live::LiveClient;

use crate::models::*;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Remote-call error. Structured codes are not consistently available,
/// so the message text is kept verbatim for pattern classification.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub code: Option<i32>,
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: i32, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;

/// Agent (ship) operations: each call issues exactly one remote request
/// and returns the typed state delta from the response.
#[async_trait]
pub trait FleetApi: Send + Sync {
    async fn agent(&self) -> ApiResult<AgentInfo>;
    async fn list_ships(&self) -> ApiResult<Vec<Ship>>;
    async fn get_ship(&self, ship: &str) -> ApiResult<Ship>;
    async fn orbit(&self, ship: &str) -> ApiResult<ShipNav>;
    async fn dock(&self, ship: &str) -> ApiResult<ShipNav>;
    async fn set_flight_mode(&self, ship: &str, mode: FlightMode) -> ApiResult<ShipNav>;
    async fn navigate(&self, ship: &str, waypoint: &str) -> ApiResult<NavigationData>;
    async fn jump(&self, ship: &str, gate_waypoint: &str) -> ApiResult<JumpData>;
    async fn extract(&self, ship: &str, survey: Option<Survey>) -> ApiResult<ExtractionData>;
    async fn siphon(&self, ship: &str) -> ApiResult<ExtractionData>;
    async fn survey(&self, ship: &str) -> ApiResult<SurveyData>;
    async fn refuel(&self, ship: &str) -> ApiResult<RefuelData>;
    async fn purchase_cargo(&self, ship: &str, good: &str, units: i32) -> ApiResult<TradeData>;
    async fn sell_cargo(&self, ship: &str, good: &str, units: i32) -> ApiResult<TradeData>;
    async fn transfer_cargo(&self, from: &str, to: &str, good: &str, units: i32)
    -> ApiResult<ShipCargo>;
    async fn jettison(&self, ship: &str, good: &str, units: i32) -> ApiResult<ShipCargo>;
    async fn chart(&self, ship: &str) -> ApiResult<ChartData>;
    async fn negotiate_contract(&self, ship: &str) -> ApiResult<Contract>;
}

/// System/waypoint snapshot resolution, including lazy pagination
#[async_trait]
pub trait GalaxyApi: Send + Sync {
    async fn system_waypoints(&self, system: &str) -> ApiResult<Vec<Waypoint>>;
    /// Continue any outstanding waypoint pagination; returns refreshed systems.
    async fn reconcile(&self) -> ApiResult<Vec<System>>;
}

#[async_trait]
pub trait MarketApi: Send + Sync {
    async fn market(&self, system: &str, waypoint: &str) -> ApiResult<MarketData>;
}

#[async_trait]
pub trait ShipyardApi: Send + Sync {
    async fn shipyard(&self, system: &str, waypoint: &str) -> ApiResult<Shipyard>;
}

#[async_trait]
pub trait JumpGateApi: Send + Sync {
    /// Connected gate waypoint symbols for the given gate
    async fn connections(&self, system: &str, waypoint: &str) -> ApiResult<Vec<String>>;
}

#[async_trait]
pub trait ContractApi: Send + Sync {
    async fn list(&self) -> ApiResult<Vec<Contract>>;
    async fn accept(&self, contract_id: &str) -> ApiResult<Contract>;
    async fn deliver(&self, ship: &str, contract_id: &str, good: &str, units: i32)
    -> ApiResult<DeliveryData>;
    async fn fulfill(&self, contract_id: &str) -> ApiResult<Contract>;
}

#[async_trait]
pub trait ConstructionApi: Send + Sync {
    async fn site(&self, system: &str, waypoint: &str) -> ApiResult<ConstructionSite>;
    async fn supply(&self, ship: &str, waypoint: &str, good: &str, units: i32)
    -> ApiResult<ConstructionSupplyData>;
}

/// Bundle of injected collaborators handed to the engine at construction
#[derive(Clone)]
pub struct Collaborators {
    pub fleet: Arc<dyn FleetApi>,
    pub galaxy: Arc<dyn GalaxyApi>,
    pub markets: Arc<dyn MarketApi>,
    pub shipyards: Arc<dyn ShipyardApi>,
    pub jump_gates: Arc<dyn JumpGateApi>,
    pub contracts: Arc<dyn ContractApi>,
    pub construction: Arc<dyn ConstructionApi>,
}

impl Collaborators {
    /// Wire every capability to a single live client
    pub fn live(client: LiveClient) -> Self {
        let client = Arc::new(client);
        Self {
            fleet: client.clone(),
            galaxy: client.clone(),
            markets: client.clone(),
            shipyards: client.clone(),
            jump_gates: client.clone(),
            contracts: client.clone(),
            construction: client,
        }
    }
}
