// Fleet Orchestration Engine Library
// Autonomously drives a fleet of remote agents toward economic goals

pub mod api;
pub mod config;
pub mod engine;
pub mod models;
pub mod verbosity;

// Re-export commonly used types
pub use models::{
    contract::{ConstructionSite, Contract, DeliveryItem},
    market::MarketData,
    ship::{CargoItem, Ship, ShipCargo, ShipNav},
    system::system_symbol_of,
    waypoint::Waypoint,
};

pub use api::{ApiError, Collaborators, LiveClient};
pub use config::EngineConfig;
pub use engine::scheduler::{AutomationService, TickReport};

// Constants
pub const API_BASE_URL: &str = "https://api.spacetraders.io/v2";
pub const AGENT_TOKEN_FILE: &str = "AGENT_TOKEN";
