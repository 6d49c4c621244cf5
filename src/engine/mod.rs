// Orchestration engine - tick scheduler, per-agent bots, and role strategies

pub mod bot;
pub mod context;
pub mod errors;
pub mod managers;
pub mod pathfinding;
pub mod role;
pub mod scheduler;
pub mod scoring;
pub mod step;
pub mod trade_route;

pub use bot::Bot;
pub use context::{TickCtx, WorldContext};
pub use pathfinding::JumpGraph;
pub use role::{classify_role, Role};
pub use managers::Manager;
pub use scheduler::{AutomationService, ErrorBudget, TickReport};
pub use step::{ExecutionStep, StepOutcome, StepTracker};
pub use trade_route::{TradeRoute, TradeRouteState};
