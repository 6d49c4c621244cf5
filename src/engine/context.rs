// Shared world context - owned and mutated by the scheduler, read by
// managers and bots. Replaces the original's global mutable singletons.

use crate::api::Collaborators;
use crate::config::EngineConfig;
use crate::engine::pathfinding::JumpGraph;
use crate::engine::step::StepTracker;
use crate::models::*;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Snapshot of one system's waypoints
#[derive(Debug, Clone, Default)]
pub struct SystemView {
    pub waypoints: Vec<Waypoint>,
}

impl SystemView {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    pub fn waypoint(&self, symbol: &str) -> Option<&Waypoint> {
        self.waypoints.iter().find(|w| w.symbol == symbol)
    }

    pub fn jump_gate(&self) -> Option<&Waypoint> {
        self.waypoints.iter().find(|w| w.is_jump_gate())
    }

    pub fn marketplaces(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter().filter(|w| w.has_marketplace())
    }

    /// Best mining site for the given role: engineered asteroids first,
    /// then any asteroid; gas giants for siphoners.
    pub fn mining_site(&self, for_siphoner: bool) -> Option<&Waypoint> {
        if for_siphoner {
            return self.waypoints.iter().find(|w| w.is_gas_giant());
        }
        self.waypoints
            .iter()
            .find(|w| w.waypoint_type == "ENGINEERED_ASTEROID")
            .or_else(|| self.waypoints.iter().find(|w| w.is_asteroid()))
    }
}

/// Cached market prices plus their age
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub market: MarketData,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct WorldContext {
    pub home_system: String,
    pub credits: i64,
    pub systems: HashMap<String, SystemView>,
    pub markets: HashMap<String, MarketSnapshot>,
    pub shipyards: HashMap<String, Shipyard>,
    pub jump_graph: JumpGraph,
    pub contract: Option<Contract>,
    pub construction: Option<ConstructionSite>,
    /// Active surveys per mining waypoint
    pub surveys: HashMap<String, Vec<Survey>>,
    /// Waypoints still worth a visit, recomputed every tick
    pub needs_exploring: HashMap<String, Vec<String>>,
    /// System symbol -> explorer ship already en route, so trips are not duplicated
    pub claimed_systems: HashMap<String, String>,
}

impl WorldContext {
    pub fn new(home_system: String) -> Self {
        Self {
            home_system,
            ..Default::default()
        }
    }

    /// A waypoint needs exploring when it is uncharted (and not an asteroid),
    /// has a marketplace with no cached prices, has a shipyard with no cached
    /// listing, or is an unresolved jump gate.
    pub fn waypoint_needs_exploring(&self, waypoint: &Waypoint) -> bool {
        if waypoint.is_uncharted() && !waypoint.is_asteroid() {
            return true;
        }
        if waypoint.has_marketplace() && !self.markets.contains_key(&waypoint.symbol) {
            return true;
        }
        if waypoint.has_shipyard() && !self.shipyards.contains_key(&waypoint.symbol) {
            return true;
        }
        if waypoint.is_jump_gate() && !self.jump_graph.contains(&waypoint.system_symbol) {
            return true;
        }
        false
    }

    /// Recompute the per-system exploration worklist
    pub fn recompute_exploration_targets(&mut self) {
        let mut needs: HashMap<String, Vec<String>> = HashMap::new();
        for (system, view) in &self.systems {
            let targets: Vec<String> = view
                .waypoints
                .iter()
                .filter(|w| self.waypoint_needs_exploring(w))
                .map(|w| w.symbol.clone())
                .collect();
            if !targets.is_empty() {
                needs.insert(system.clone(), targets);
            }
        }
        self.needs_exploring = needs;
    }

    /// A system needs exploring when we have no snapshot of it yet, or its
    /// snapshot still contains unvisited waypoints.
    pub fn system_needs_exploring(&self, system: &str) -> bool {
        match self.systems.get(system) {
            None => true,
            Some(_) => self
                .needs_exploring
                .get(system)
                .is_some_and(|targets| !targets.is_empty()),
        }
    }

    pub fn market_snapshot(&self, waypoint: &str) -> Option<&MarketSnapshot> {
        self.markets.get(waypoint)
    }

    pub fn sell_price(&self, waypoint: &str, good: &str) -> Option<i32> {
        self.markets
            .get(waypoint)
            .and_then(|snap| snap.market.good(good))
            .map(|g| g.sell_price)
    }

    pub fn purchase_price(&self, waypoint: &str, good: &str) -> Option<i32> {
        self.markets
            .get(waypoint)
            .and_then(|snap| snap.market.good(good))
            .map(|g| g.purchase_price)
    }

    /// Whether a waypoint can refuel a ship. Assume a marketplace sells fuel
    /// until cached price data says otherwise.
    pub fn sells_fuel(&self, waypoint: &Waypoint) -> bool {
        if !waypoint.has_marketplace() {
            return false;
        }
        match self.markets.get(&waypoint.symbol) {
            Some(snap) => snap.market.good("FUEL").is_some(),
            None => true,
        }
    }

    /// Goods currently reserved for the contract or construction goal;
    /// these are never sold off or jettisoned by other strategies.
    pub fn reserved_goods(&self) -> std::collections::HashSet<String> {
        let mut reserved = std::collections::HashSet::new();
        if let Some(contract) = &self.contract {
            reserved.extend(contract.required_goods());
        }
        if let Some(site) = &self.construction {
            reserved.extend(site.required_goods());
        }
        reserved
    }

    /// Drop a spent survey without raising an error
    pub fn discard_survey(&mut self, signature: &str) {
        for surveys in self.surveys.values_mut() {
            surveys.retain(|s| s.signature != signature);
        }
    }

    /// Drop expired surveys everywhere
    pub fn purge_expired_surveys(&mut self, now: DateTime<Utc>) {
        for surveys in self.surveys.values_mut() {
            surveys.retain(|s| s.is_fresh(now));
        }
        self.surveys.retain(|_, surveys| !surveys.is_empty());
    }
}

/// Everything a manager or bot may touch during one tick. Built fresh by
/// the scheduler for each manager invocation; no hidden globals.
pub struct TickCtx<'a> {
    pub ships: &'a mut HashMap<String, Ship>,
    pub world: &'a mut WorldContext,
    pub api: &'a Collaborators,
    pub steps: &'a mut StepTracker,
    pub config: &'a EngineConfig,
    pub now: DateTime<Utc>,
}
