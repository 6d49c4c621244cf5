// Execution steps - at most one outstanding remote operation per agent

use crate::api::ApiError;
use crate::models::*;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Result of asking a bot (or a manager, through a bot) to act this tick.
/// Replaces the original exception-as-control-flow "operation pending"
/// signal with an explicit tag the caller matches on.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Nothing to do, or waiting on world state
    Idle,
    /// One remote call was issued; the agent is busy until it completes
    ActionStarted,
    /// The action could not even be issued (missing data, bad arguments)
    Failed(String),
}

impl StepOutcome {
    pub fn started(&self) -> bool {
        matches!(self, StepOutcome::ActionStarted)
    }
}

/// Marker for one outstanding remote operation
#[derive(Debug, Clone)]
pub struct ExecutionStep {
    pub ship_symbol: String,
    pub kind: &'static str,
    pub description: String,
    pub started_at: Instant,
}

/// Typed state delta carried back by a completed remote operation
#[derive(Debug, Clone)]
pub enum StepUpdate {
    Nav(ShipNav),
    Navigation(NavigationData),
    Jump(JumpData),
    Extraction(ExtractionData),
    Surveys(SurveyData),
    Refuel(RefuelData),
    Purchase(TradeData),
    Sale(TradeData),
    Cargo(ShipCargo),
    Delivery(DeliveryData),
    ConstructionSupply(ConstructionSupplyData),
    Chart(ChartData),
    Contract(Contract),
    MarketPrices {
        waypoint: String,
        market: MarketData,
    },
    ShipyardListing {
        waypoint: String,
        shipyard: Shipyard,
    },
    GateConnections {
        system: String,
        gate_waypoint: String,
        connections: Vec<String>,
    },
}

/// Completion event sent by the spawned remote-call task
#[derive(Debug)]
pub struct StepCompletion {
    pub ship_symbol: String,
    pub kind: &'static str,
    pub result: Result<StepUpdate, ApiError>,
    /// Signature of the survey the action consumed, if any
    pub survey_signature: Option<String>,
    /// Another ship whose state this action invalidated (e.g. transfer target)
    pub refresh_ship: Option<String>,
}

impl StepCompletion {
    pub fn new(
        ship_symbol: String,
        kind: &'static str,
        result: Result<StepUpdate, ApiError>,
    ) -> Self {
        Self {
            ship_symbol,
            kind,
            result,
            survey_signature: None,
            refresh_ship: None,
        }
    }
}

/// Busy-map from agent symbol to its outstanding step, plus the channel
/// completions arrive on. The scheduler drains completions at tick start
/// and evicts stale entries after the watchdog timeout.
pub struct StepTracker {
    steps: HashMap<String, ExecutionStep>,
    tx: mpsc::UnboundedSender<StepCompletion>,
    rx: mpsc::UnboundedReceiver<StepCompletion>,
}

impl StepTracker {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            steps: HashMap::new(),
            tx,
            rx,
        }
    }

    pub fn is_busy(&self, ship_symbol: &str) -> bool {
        self.steps.contains_key(ship_symbol)
    }

    pub fn current(&self, ship_symbol: &str) -> Option<&ExecutionStep> {
        self.steps.get(ship_symbol)
    }

    pub fn outstanding(&self) -> usize {
        self.steps.len()
    }

    /// Register a step as outstanding before spawning its remote call
    pub fn begin(&mut self, ship_symbol: &str, kind: &'static str, description: String) {
        self.steps.insert(
            ship_symbol.to_string(),
            ExecutionStep {
                ship_symbol: ship_symbol.to_string(),
                kind,
                description,
                started_at: Instant::now(),
            },
        );
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<StepCompletion> {
        self.tx.clone()
    }

    /// Pull every completion that has arrived and clear the matching
    /// busy-map entries. Order of arrival is preserved.
    pub fn drain(&mut self) -> Vec<StepCompletion> {
        let mut completions = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            self.steps.remove(&completion.ship_symbol);
            completions.push(completion);
        }
        completions
    }

    /// Force-clear steps older than the watchdog timeout so the owning
    /// agents become schedulable again even if the response never arrives.
    pub fn evict_stale(&mut self, timeout: std::time::Duration) -> Vec<ExecutionStep> {
        let now = Instant::now();
        let stale: Vec<String> = self
            .steps
            .iter()
            .filter(|(_, step)| now.duration_since(step.started_at) >= timeout)
            .map(|(symbol, _)| symbol.clone())
            .collect();
        stale
            .iter()
            .filter_map(|symbol| self.steps.remove(symbol))
            .collect()
    }
}

impl Default for StepTracker {
    fn default() -> Self {
        Self::new()
    }
}
