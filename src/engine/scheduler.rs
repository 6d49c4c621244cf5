// Cooperative tick scheduler - drives every bot and manager from a single
// task. Remote calls run on spawned tasks; the scheduler only ever blocks
// on its own deferred bookkeeping.

use crate::api::Collaborators;
use crate::config::EngineConfig;
use crate::engine::bot::Bot;
use crate::engine::context::{MarketSnapshot, SystemView, TickCtx, WorldContext};
use crate::engine::errors::{classify_api_error, ApiErrorKind};
use crate::engine::managers::{
    ConstructionManager, ExploreManager, Manager, MarketManager, MineManager, PairManager,
    TradeManager,
};
use crate::engine::role::{classify_role, Role};
use crate::engine::step::{StepCompletion, StepTracker, StepUpdate};
use crate::models::{system_symbol_of, NavStatus, Ship};
use crate::{v_debug, v_error, v_info, v_summary};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::time::Instant;

const MARKET: usize = 0;
const TRADE: usize = 1;
const MINE: usize = 2;
const CONSTRUCTION: usize = 3;
const EXPLORE: usize = 4;

/// Net error counter with a hard ceiling. Errors weigh double so a burst
/// of failures halts the engine even while some work still succeeds.
#[derive(Debug, Clone)]
pub struct ErrorBudget {
    counter: u32,
    threshold: u32,
    halted: bool,
}

impl ErrorBudget {
    pub fn new(threshold: u32) -> Self {
        Self {
            counter: 0,
            threshold,
            halted: false,
        }
    }

    pub fn record_error(&mut self) {
        self.counter = self.counter.saturating_add(2);
        if self.counter > self.threshold {
            self.halted = true;
        }
    }

    pub fn record_success(&mut self) {
        self.counter = self.counter.saturating_sub(1);
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }
}

/// What one tick accomplished
#[derive(Debug, Default, Clone)]
pub struct TickReport {
    pub tick: u64,
    pub actions_started: u32,
    pub failures: u32,
    pub completions: u32,
    pub errors: u32,
    pub evicted: u32,
    pub outstanding: usize,
    /// Set when the tick aborted early waiting for a system snapshot
    pub waiting_on_system: Option<String>,
    pub paused: bool,
    pub halted: bool,
}

pub struct AutomationService {
    api: Collaborators,
    config: EngineConfig,
    ships: HashMap<String, Ship>,
    bots: HashMap<String, Bot>,
    managers: Vec<Manager>,
    world: WorldContext,
    steps: StepTracker,
    budget: ErrorBudget,
    tick: u64,
    pause_until: Option<Instant>,
    pending_ship_refresh: HashSet<String>,
    pending_waypoint_refresh: HashSet<String>,
    pending_fleet_refresh: bool,
    pending_agent_refresh: bool,
    construction_checked: bool,
    /// Systems whose snapshot fetch has already failed once
    snapshot_retries: HashSet<String>,
    /// When set, only these ships are orchestrated
    eligible: Option<HashSet<String>>,
}

impl AutomationService {
    pub fn new(api: Collaborators, config: EngineConfig) -> Self {
        let budget = ErrorBudget::new(config.scheduler.error_threshold);
        Self {
            api,
            config,
            ships: HashMap::new(),
            bots: HashMap::new(),
            managers: vec![
                Manager::Market(MarketManager::new()),
                Manager::Trade(TradeManager::new()),
                Manager::Mine(MineManager::new()),
                Manager::Construction(ConstructionManager::new()),
                Manager::Explore(ExploreManager::new()),
            ],
            world: WorldContext::default(),
            steps: StepTracker::new(),
            budget,
            tick: 0,
            pause_until: None,
            pending_ship_refresh: HashSet::new(),
            pending_waypoint_refresh: HashSet::new(),
            pending_fleet_refresh: false,
            pending_agent_refresh: false,
            construction_checked: false,
            snapshot_retries: HashSet::new(),
            eligible: None,
        }
    }

    /// Restrict orchestration to the named ships (empty list means all)
    pub fn restrict_to(&mut self, ships: Vec<String>) {
        if !ships.is_empty() {
            self.eligible = Some(ships.into_iter().collect());
        }
    }

    pub fn error_counter(&self) -> u32 {
        self.budget.counter()
    }

    pub fn is_halted(&self) -> bool {
        self.budget.is_halted()
    }

    pub fn bot(&self, symbol: &str) -> Option<&Bot> {
        self.bots.get(symbol)
    }

    pub fn ship(&self, symbol: &str) -> Option<&Ship> {
        self.ships.get(symbol)
    }

    pub fn managers(&self) -> &[Manager] {
        &self.managers
    }

    /// Name of the manager currently owning a bot, if any
    pub fn manager_name(&self, symbol: &str) -> Option<&'static str> {
        let index = self.bots.get(symbol)?.manager?;
        self.managers.get(index).map(|m| m.name())
    }

    pub fn world(&self) -> &WorldContext {
        &self.world
    }

    /// Fetch agent, fleet, and home-system state, then classify every ship
    /// into a role. Called once before the tick loop starts.
    pub async fn bootstrap(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let agent = self.api.fleet.agent().await?;
        self.world.home_system = system_symbol_of(&agent.headquarters);
        self.world.credits = agent.credits;
        v_summary!(
            "🚀 {} online: {} credits, {} ships, home {}",
            agent.symbol,
            agent.credits,
            agent.ship_count,
            self.world.home_system
        );

        let ships = self.api.fleet.list_ships().await?;
        for ship in ships {
            if let Some(eligible) = &self.eligible {
                if !eligible.contains(&ship.symbol) {
                    continue;
                }
            }
            let role = classify_role(&ship);
            v_info!("🛸 {} classified as {}", ship.symbol, role);
            self.bots
                .insert(ship.symbol.clone(), Bot::new(ship.symbol.clone(), role));
            self.ships.insert(ship.symbol.clone(), ship);
        }

        let contracts = self.api.contracts.list().await?;
        self.world.contract = contracts.into_iter().find(|c| !c.fulfilled);
        if let Some(contract) = &self.world.contract {
            v_info!("📜 active contract {} ({})", contract.id, contract.contract_type);
        }

        let home = self.world.home_system.clone();
        let waypoints = self.api.galaxy.system_waypoints(&home).await?;
        self.world.systems.insert(home, SystemView::new(waypoints));
        self.world.recompute_exploration_targets();
        Ok(())
    }

    /// Run one cooperative tick. Never blocks on bot actions; those run
    /// on spawned tasks and report back through the completion channel.
    pub async fn step(&mut self) -> TickReport {
        self.tick += 1;
        let now = Utc::now();
        let mut report = TickReport {
            tick: self.tick,
            ..Default::default()
        };

        if self.budget.is_halted() {
            report.halted = true;
            return report;
        }
        if let Some(until) = self.pause_until {
            if Instant::now() < until {
                report.paused = true;
                return report;
            }
            self.pause_until = None;
        }

        for completion in self.steps.drain() {
            self.apply_completion(completion, now, &mut report);
        }

        let watchdog = Duration::from_secs(self.config.scheduler.watchdog_seconds);
        for step in self.steps.evict_stale(watchdog) {
            v_error!(
                "🐕 watchdog evicted {} step for {} ({})",
                step.kind,
                step.ship_symbol,
                step.description
            );
            report.evicted += 1;
            report.errors += 1;
            self.budget.record_error();
        }

        self.normalize_transits(now);
        self.run_deferred_work(&mut report).await;

        if !self.ensure_system_snapshots(&mut report).await {
            report.halted = self.budget.is_halted();
            return report;
        }

        self.world.purge_expired_surveys(now);
        self.world.recompute_exploration_targets();

        self.assign_bots();
        self.extract_pair();

        let mut managers = std::mem::take(&mut self.managers);
        for manager in managers.iter_mut() {
            let mut ctx = TickCtx {
                ships: &mut self.ships,
                world: &mut self.world,
                api: &self.api,
                steps: &mut self.steps,
                config: &self.config,
                now,
            };
            let tally = manager.step(&mut self.bots, &mut ctx);
            report.actions_started += tally.started;
            report.failures += tally.failed;
            for _ in 0..tally.failed {
                self.budget.record_error();
            }
        }
        self.managers = managers;

        if self.tick % self.config.scheduler.maintenance_interval_ticks == 0 {
            self.run_maintenance().await;
        }

        report.outstanding = self.steps.outstanding();
        report.halted = self.budget.is_halted();
        report
    }

    /// Tick forever at the configured interval until the budget trips
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut interval =
            tokio::time::interval(Duration::from_millis(self.config.scheduler.tick_interval_ms));
        loop {
            interval.tick().await;
            let report = self.step().await;
            if report.halted {
                v_error!(
                    "🛑 halting at tick {}: error counter {} exceeded threshold {}",
                    report.tick,
                    self.budget.counter(),
                    self.config.scheduler.error_threshold
                );
                return Err(format!(
                    "error budget exhausted (counter {})",
                    self.budget.counter()
                )
                .into());
            }
            if report.actions_started > 0 || report.completions > 0 {
                v_debug!(
                    "⏱️ tick {}: {} started, {} completed, {} outstanding",
                    report.tick,
                    report.actions_started,
                    report.completions,
                    report.outstanding
                );
            }
        }
    }

    fn apply_completion(
        &mut self,
        completion: StepCompletion,
        now: DateTime<Utc>,
        report: &mut TickReport,
    ) {
        report.completions += 1;
        if let Some(target) = &completion.refresh_ship {
            self.pending_ship_refresh.insert(target.clone());
        }
        match completion.result {
            Ok(update) => {
                self.budget.record_success();
                self.apply_update(&completion.ship_symbol, update, now);
            }
            Err(error) => {
                let kind = classify_api_error(&error);
                match kind {
                    ApiErrorKind::SurveyExhausted => {
                        // Not a real failure; just retire the survey
                        if let Some(signature) = &completion.survey_signature {
                            v_debug!("🪨 survey {} exhausted, discarding", signature);
                            self.world.discard_survey(signature);
                        }
                    }
                    ApiErrorKind::RateLimited => {
                        v_error!("🚦 rate limited, pausing remote calls: {}", error);
                        self.pause_until = Some(
                            Instant::now()
                                + Duration::from_secs(
                                    self.config.scheduler.rate_limit_pause_seconds,
                                ),
                        );
                    }
                    other => {
                        v_error!(
                            "💥 {} {} failed: {}",
                            completion.ship_symbol,
                            completion.kind,
                            error
                        );
                        report.errors += 1;
                        self.budget.record_error();
                        self.recover(&completion.ship_symbol, other, now);
                    }
                }
            }
        }
    }

    fn recover(&mut self, ship_symbol: &str, kind: ApiErrorKind, now: DateTime<Utc>) {
        match kind {
            ApiErrorKind::InsufficientFunds => self.pending_agent_refresh = true,
            ApiErrorKind::ShipStateStale => {
                self.pending_ship_refresh.insert(ship_symbol.to_string());
            }
            ApiErrorKind::OnCooldown(seconds) => match seconds {
                Some(seconds) => {
                    if let Some(ship) = self.ships.get_mut(ship_symbol) {
                        ship.cooldown.expiration =
                            Some(now + ChronoDuration::milliseconds((seconds * 1000.0) as i64));
                    }
                }
                None => {
                    self.pending_ship_refresh.insert(ship_symbol.to_string());
                }
            },
            ApiErrorKind::AlreadyCharted => {
                if let Some(ship) = self.ships.get(ship_symbol) {
                    self.pending_waypoint_refresh
                        .insert(ship.nav.system_symbol.clone());
                }
            }
            _ => {}
        }
    }

    fn apply_update(&mut self, ship_symbol: &str, update: StepUpdate, now: DateTime<Utc>) {
        match update {
            StepUpdate::Nav(nav) => {
                if let Some(ship) = self.ships.get_mut(ship_symbol) {
                    ship.nav = nav;
                }
            }
            StepUpdate::Navigation(data) => {
                if let Some(ship) = self.ships.get_mut(ship_symbol) {
                    ship.nav = data.nav;
                    ship.fuel = data.fuel;
                }
            }
            StepUpdate::Jump(data) => {
                if let Some(ship) = self.ships.get_mut(ship_symbol) {
                    ship.nav = data.nav;
                    ship.cooldown = data.cooldown;
                }
            }
            StepUpdate::Extraction(data) => {
                v_info!(
                    "⛏️ {} extracted {} x{}",
                    ship_symbol,
                    data.extracted.symbol,
                    data.extracted.units
                );
                if let Some(ship) = self.ships.get_mut(ship_symbol) {
                    ship.cargo = data.cargo;
                    ship.cooldown = data.cooldown;
                }
            }
            StepUpdate::Surveys(data) => {
                if let Some(ship) = self.ships.get_mut(ship_symbol) {
                    ship.cooldown = data.cooldown;
                }
                for survey in data.surveys {
                    self.world
                        .surveys
                        .entry(survey.symbol.clone())
                        .or_default()
                        .push(survey);
                }
            }
            StepUpdate::Refuel(data) => {
                self.world.credits = data.credits;
                if let Some(ship) = self.ships.get_mut(ship_symbol) {
                    ship.fuel = data.fuel;
                }
            }
            StepUpdate::Purchase(data) | StepUpdate::Sale(data) => {
                self.world.credits = data.credits;
                if let Some(ship) = self.ships.get_mut(ship_symbol) {
                    ship.cargo = data.cargo;
                }
            }
            StepUpdate::Cargo(cargo) => {
                if let Some(ship) = self.ships.get_mut(ship_symbol) {
                    ship.cargo = cargo;
                }
            }
            StepUpdate::Delivery(data) => {
                self.world.contract = Some(data.contract);
                if let Some(ship) = self.ships.get_mut(ship_symbol) {
                    ship.cargo = data.cargo;
                }
            }
            StepUpdate::ConstructionSupply(data) => {
                self.world.construction = Some(data.construction);
                if let Some(ship) = self.ships.get_mut(ship_symbol) {
                    ship.cargo = data.cargo;
                }
            }
            StepUpdate::Chart(data) => {
                let system = system_symbol_of(&data.waypoint.symbol);
                if let Some(view) = self.world.systems.get_mut(&system) {
                    if let Some(slot) = view
                        .waypoints
                        .iter_mut()
                        .find(|w| w.symbol == data.waypoint.symbol)
                    {
                        *slot = data.waypoint;
                    }
                }
            }
            StepUpdate::Contract(contract) => {
                v_info!("📜 negotiated contract {}", contract.id);
                self.world.contract = Some(contract);
            }
            StepUpdate::MarketPrices { waypoint, market } => {
                self.world.markets.insert(
                    waypoint,
                    MarketSnapshot {
                        market,
                        fetched_at: now,
                    },
                );
            }
            StepUpdate::ShipyardListing { waypoint, shipyard } => {
                self.world.shipyards.insert(waypoint, shipyard);
            }
            StepUpdate::GateConnections {
                system,
                gate_waypoint,
                connections,
            } => {
                v_info!(
                    "🕳️ gate {} resolved with {} connections",
                    gate_waypoint,
                    connections.len()
                );
                self.world
                    .jump_graph
                    .insert_connections(&system, &gate_waypoint, &connections);
            }
        }
    }

    /// Locally flip ships whose transit arrival time has passed; the next
    /// remote response will confirm the real state.
    fn normalize_transits(&mut self, now: DateTime<Utc>) {
        for ship in self.ships.values_mut() {
            if ship.nav.status == NavStatus::InTransit && ship.nav.route.arrival <= now {
                ship.nav.status = NavStatus::InOrbit;
                ship.nav.waypoint_symbol = ship.nav.route.destination.symbol.clone();
                ship.nav.system_symbol = ship.nav.route.destination.system_symbol.clone();
            }
        }
    }

    /// Global catch-up work queued by completions and error recovery.
    /// Runs inline: these calls are rare and the scheduler owns them.
    async fn run_deferred_work(&mut self, report: &mut TickReport) {
        if self.pending_fleet_refresh {
            self.pending_fleet_refresh = false;
            match self.api.fleet.list_ships().await {
                Ok(ships) => {
                    for ship in ships {
                        if self.ships.contains_key(&ship.symbol) {
                            self.ships.insert(ship.symbol.clone(), ship);
                        }
                    }
                }
                Err(error) => {
                    v_error!("💥 fleet refresh failed: {}", error);
                    report.errors += 1;
                    self.budget.record_error();
                }
            }
        }

        for symbol in std::mem::take(&mut self.pending_ship_refresh) {
            match self.api.fleet.get_ship(&symbol).await {
                Ok(ship) => {
                    self.ships.insert(symbol, ship);
                }
                Err(error) => {
                    v_error!("💥 refresh of {} failed: {}", symbol, error);
                    report.errors += 1;
                    self.budget.record_error();
                }
            }
        }

        for system in std::mem::take(&mut self.pending_waypoint_refresh) {
            match self.api.galaxy.system_waypoints(&system).await {
                Ok(waypoints) => {
                    self.world
                        .systems
                        .insert(system, SystemView::new(waypoints));
                }
                Err(error) => {
                    v_error!("💥 waypoint refresh of {} failed: {}", system, error);
                    report.errors += 1;
                    self.budget.record_error();
                }
            }
        }

        if self.pending_agent_refresh {
            self.pending_agent_refresh = false;
            if let Ok(agent) = self.api.fleet.agent().await {
                self.world.credits = agent.credits;
            }
        }

        self.sync_contract().await;
        self.sync_construction().await;
    }

    async fn sync_contract(&mut self) {
        let Some(contract) = &self.world.contract else {
            return;
        };
        if !contract.accepted {
            let id = contract.id.clone();
            match self.api.contracts.accept(&id).await {
                Ok(accepted) => {
                    v_summary!("📜 accepted contract {}", accepted.id);
                    self.world.contract = Some(accepted);
                    self.pending_agent_refresh = true;
                }
                Err(error) => v_error!("💥 accepting contract {} failed: {}", id, error),
            }
            return;
        }
        if contract.deliveries_complete() && !contract.fulfilled {
            let id = contract.id.clone();
            match self.api.contracts.fulfill(&id).await {
                Ok(fulfilled) => {
                    v_summary!(
                        "🎉 fulfilled contract {} for {} credits",
                        fulfilled.id,
                        fulfilled.terms.payment.on_fulfilled
                    );
                    self.world.contract = None;
                    self.pending_agent_refresh = true;
                }
                Err(error) => v_error!("💥 fulfilling contract {} failed: {}", id, error),
            }
        }
    }

    /// Look for a construction site in the home system exactly once, then
    /// keep it updated through supply completions.
    async fn sync_construction(&mut self) {
        if self.construction_checked || self.world.construction.is_some() {
            return;
        }
        let Some(view) = self.world.systems.get(&self.world.home_system) else {
            return;
        };
        let Some(waypoint) = view
            .waypoints
            .iter()
            .find(|w| w.is_under_construction)
            .map(|w| w.symbol.clone())
        else {
            self.construction_checked = true;
            return;
        };
        self.construction_checked = true;
        let home = self.world.home_system.clone();
        match self.api.construction.site(&home, &waypoint).await {
            Ok(site) if !site.is_complete => {
                v_summary!("🏗️ construction site found at {}", site.symbol);
                self.world.construction = Some(site);
            }
            Ok(_) => {}
            Err(error) => v_error!("💥 reading construction site {} failed: {}", waypoint, error),
        }
    }

    /// Every occupied system must have a waypoint snapshot before its bots
    /// can be stepped. Returns false when the tick must abort and wait.
    async fn ensure_system_snapshots(&mut self, report: &mut TickReport) -> bool {
        let missing: Vec<String> = {
            let mut seen = HashSet::new();
            self.ships
                .values()
                .map(|s| s.nav.system_symbol.clone())
                .filter(|system| seen.insert(system.clone()))
                .filter(|system| !self.world.systems.contains_key(system))
                .collect()
        };
        for system in missing {
            match self.api.galaxy.system_waypoints(&system).await {
                Ok(waypoints) => {
                    v_info!("🌌 loaded snapshot of {} ({} waypoints)", system, waypoints.len());
                    self.snapshot_retries.remove(&system);
                    self.world
                        .systems
                        .insert(system, SystemView::new(waypoints));
                }
                Err(error) => {
                    v_error!("💥 snapshot of {} failed: {}", system, error);
                    // Waiting is not a failure; only a repeat fetch error
                    // counts against the budget
                    if !self.snapshot_retries.insert(system.clone()) {
                        report.errors += 1;
                        self.budget.record_error();
                    }
                    report.waiting_on_system = Some(system);
                    return false;
                }
            }
        }
        true
    }

    /// Place every unmanaged bot with a manager according to its role and
    /// surroundings.
    fn assign_bots(&mut self) {
        let unassigned: Vec<String> = self
            .bots
            .values()
            .filter(|b| b.manager.is_none())
            .map(|b| b.ship_symbol.clone())
            .collect();
        for symbol in unassigned {
            let Some(role) = self.bots.get(&symbol).map(|b| b.role) else {
                continue;
            };
            let index = self.pick_manager(&symbol, role);
            self.managers[index].add_bot(symbol.clone());
            if let Some(bot) = self.bots.get_mut(&symbol) {
                bot.manager = Some(index);
            }
            v_info!(
                "📌 {} ({}) assigned to {} manager",
                symbol,
                role,
                self.managers[index].name()
            );
        }
    }

    fn pick_manager(&self, symbol: &str, role: Role) -> usize {
        // A ship alone in its system explores it regardless of role
        if let Some(ship) = self.ships.get(symbol) {
            let company = self
                .ships
                .values()
                .filter(|s| s.nav.system_symbol == ship.nav.system_symbol)
                .count();
            if company <= 1 {
                return EXPLORE;
            }
        }
        match role {
            Role::Explorer => {
                // Staff the market watch unless this system already has one
                let watched = self.ships.get(symbol).is_some_and(|ship| {
                    self.managers[MARKET].bots().iter().any(|other| {
                        self.ships
                            .get(other)
                            .is_some_and(|s| s.nav.system_symbol == ship.nav.system_symbol)
                    })
                });
                if watched {
                    EXPLORE
                } else {
                    MARKET
                }
            }
            Role::Miner | Role::Siphoner | Role::SurveyorMiner => MINE,
            Role::Surveyor => self.pair_lacking_surveyor().unwrap_or(MINE),
            Role::Hauler | Role::Refinery => {
                let trade = self.managers[TRADE].bots().len();
                let construction = self.managers[CONSTRUCTION].bots().len();
                let building = self
                    .world
                    .construction
                    .as_ref()
                    .is_some_and(|site| !site.is_complete);
                if building && trade > 3 * construction {
                    CONSTRUCTION
                } else {
                    TRADE
                }
            }
        }
    }

    fn pair_lacking_surveyor(&self) -> Option<usize> {
        self.managers
            .iter()
            .position(|m| matches!(m, Manager::Pair(p) if !p.has_surveyor()))
    }

    /// When trading is over capacity and a standalone miner exists, pull a
    /// hauler and that miner into a dedicated pair team. Membership is
    /// verified before anything is removed so the move is all-or-nothing.
    fn extract_pair(&mut self) {
        if self.managers[TRADE].bots().len() <= self.config.trading.max_trade_haulers {
            return;
        }
        let miner = self.managers[MINE]
            .bots()
            .iter()
            .find(|symbol| self.bots.get(*symbol).is_some_and(|b| b.role.is_mining()));
        let Some(miner) = miner.cloned() else {
            return;
        };
        let Some(miner_system) = self
            .ships
            .get(&miner)
            .map(|s| s.nav.system_symbol.clone())
        else {
            return;
        };
        let hauler = self.managers[TRADE].bots().iter().find(|symbol| {
            self.ships
                .get(*symbol)
                .is_some_and(|s| s.nav.system_symbol == miner_system)
        });
        let Some(hauler) = hauler.cloned() else {
            return;
        };

        self.managers[MINE].remove_bot(&miner);
        self.managers[TRADE].remove_bot(&hauler);
        let index = self.managers.len();
        self.managers
            .push(Manager::Pair(PairManager::new(miner.clone(), hauler.clone())));
        if let Some(bot) = self.bots.get_mut(&miner) {
            bot.manager = Some(index);
        }
        if let Some(bot) = self.bots.get_mut(&hauler) {
            bot.manager = Some(index);
            bot.trade_route = None;
        }
        v_summary!("🤝 paired miner {} with hauler {}", miner, hauler);
    }

    /// Periodic reconciliation: finish any lazy pagination, resync credits,
    /// and pick up a fresh contract when none is active.
    async fn run_maintenance(&mut self) {
        v_debug!("🔧 maintenance at tick {}", self.tick);
        match self.api.galaxy.reconcile().await {
            Ok(systems) => {
                for system in systems {
                    self.world
                        .systems
                        .insert(system.symbol.clone(), SystemView::new(system.waypoints));
                }
            }
            Err(error) => v_error!("💥 reconcile failed: {}", error),
        }
        if let Ok(agent) = self.api.fleet.agent().await {
            self.world.credits = agent.credits;
        }
        if self.world.contract.is_none() {
            if let Ok(contracts) = self.api.contracts.list().await {
                self.world.contract = contracts.into_iter().find(|c| !c.fulfilled);
            }
            if self.world.contract.is_none() {
                self.negotiate_contract();
            }
        }
        v_summary!(
            "📊 tick {}: {} credits, {} bots, {} outstanding steps, error counter {}",
            self.tick,
            self.world.credits,
            self.bots.len(),
            self.steps.outstanding(),
            self.budget.counter()
        );
    }

    /// Ask any idle docked ship to negotiate a fresh contract
    fn negotiate_contract(&mut self) {
        let candidate = self
            .ships
            .values()
            .find(|s| s.is_docked() && !self.steps.is_busy(&s.symbol))
            .map(|s| s.symbol.clone());
        let Some(symbol) = candidate else {
            return;
        };
        let Some(bot) = self.bots.get(&symbol) else {
            return;
        };
        let mut ctx = TickCtx {
            ships: &mut self.ships,
            world: &mut self.world,
            api: &self.api,
            steps: &mut self.steps,
            config: &self.config,
            now: Utc::now(),
        };
        if bot.negotiate(&mut ctx).started() {
            v_info!("📜 {} negotiating a new contract", symbol);
        }
    }
}
