// Bot - the per-agent action library. Every action is a guarded remote
// call: no-op when the guard already holds, otherwise exactly one request
// is issued and the agent is busy until its completion arrives.

use crate::engine::context::TickCtx;
use crate::engine::role::Role;
use crate::engine::step::{StepCompletion, StepOutcome, StepUpdate};
use crate::engine::trade_route::TradeRoute;
use crate::models::*;
use crate::{v_debug, v_error};

pub struct Bot {
    pub ship_symbol: String,
    pub role: Role,
    /// Index of the owning manager in the scheduler's arena, if assigned
    pub manager: Option<usize>,
    pub errors: u32,
    pub trade_route: Option<TradeRoute>,
    /// Remaining systems of a committed exploration path
    pub exploration_path: Vec<String>,
}

impl Bot {
    pub fn new(ship_symbol: String, role: Role) -> Self {
        Self {
            ship_symbol,
            role,
            manager: None,
            errors: 0,
            trade_route: None,
            exploration_path: Vec::new(),
        }
    }

    fn ship<'c>(&self, ctx: &'c TickCtx) -> Option<&'c Ship> {
        ctx.ships.get(&self.ship_symbol)
    }

    fn missing_ship(&self) -> StepOutcome {
        StepOutcome::Failed(format!("no state for ship {}", self.ship_symbol))
    }

    pub fn dock(&self, ctx: &mut TickCtx) -> StepOutcome {
        let Some(ship) = self.ship(ctx) else {
            return self.missing_ship();
        };
        if ship.is_docked() {
            return StepOutcome::Idle;
        }
        let waypoint = ship.nav.waypoint_symbol.clone();
        let symbol = self.ship_symbol.clone();
        ctx.steps
            .begin(&symbol, "dock", format!("{} docking at {}", symbol, waypoint));
        let fleet = ctx.api.fleet.clone();
        let tx = ctx.steps.sender();
        tokio::spawn(async move {
            let result = fleet.dock(&symbol).await.map(StepUpdate::Nav);
            let _ = tx.send(StepCompletion::new(symbol, "dock", result));
        });
        StepOutcome::ActionStarted
    }

    pub fn orbit(&self, ctx: &mut TickCtx) -> StepOutcome {
        let Some(ship) = self.ship(ctx) else {
            return self.missing_ship();
        };
        if ship.is_in_orbit() {
            return StepOutcome::Idle;
        }
        let waypoint = ship.nav.waypoint_symbol.clone();
        let symbol = self.ship_symbol.clone();
        ctx.steps.begin(
            &symbol,
            "orbit",
            format!("{} moving to orbit at {}", symbol, waypoint),
        );
        let fleet = ctx.api.fleet.clone();
        let tx = ctx.steps.sender();
        tokio::spawn(async move {
            let result = fleet.orbit(&symbol).await.map(StepUpdate::Nav);
            let _ = tx.send(StepCompletion::new(symbol, "orbit", result));
        });
        StepOutcome::ActionStarted
    }

    pub fn set_flight_mode(&self, ctx: &mut TickCtx, mode: FlightMode) -> StepOutcome {
        let Some(ship) = self.ship(ctx) else {
            return self.missing_ship();
        };
        if ship.nav.flight_mode == mode {
            return StepOutcome::Idle;
        }
        let symbol = self.ship_symbol.clone();
        ctx.steps.begin(
            &symbol,
            "flight-mode",
            format!("{} switching to {}", symbol, mode.as_str()),
        );
        let fleet = ctx.api.fleet.clone();
        let tx = ctx.steps.sender();
        tokio::spawn(async move {
            let result = fleet
                .set_flight_mode(&symbol, mode)
                .await
                .map(StepUpdate::Nav);
            let _ = tx.send(StepCompletion::new(symbol, "flight-mode", result));
        });
        StepOutcome::ActionStarted
    }

    pub fn refuel(&self, ctx: &mut TickCtx) -> StepOutcome {
        let Some(ship) = self.ship(ctx) else {
            return self.missing_ship();
        };
        if ship.fuel.capacity == 0 || ship.fuel.current >= ship.fuel.capacity {
            return StepOutcome::Idle;
        }
        if !ship.is_docked() {
            return self.dock(ctx);
        }
        let symbol = self.ship_symbol.clone();
        ctx.steps
            .begin(&symbol, "refuel", format!("{} refueling", symbol));
        let fleet = ctx.api.fleet.clone();
        let tx = ctx.steps.sender();
        tokio::spawn(async move {
            let result = fleet.refuel(&symbol).await.map(StepUpdate::Refuel);
            let _ = tx.send(StepCompletion::new(symbol, "refuel", result));
        });
        StepOutcome::ActionStarted
    }

    pub fn mine(&self, ctx: &mut TickCtx, survey: Option<Survey>) -> StepOutcome {
        let Some(ship) = self.ship(ctx) else {
            return self.missing_ship();
        };
        if ship.is_docked() {
            return self.orbit(ctx);
        }
        if !ship.cooldown.ready(ctx.now) {
            return StepOutcome::Idle;
        }
        if ship.cargo.space_remaining() <= 0 {
            return StepOutcome::Idle;
        }
        let signature = survey.as_ref().map(|s| s.signature.clone());
        let symbol = self.ship_symbol.clone();
        ctx.steps.begin(
            &symbol,
            "extract",
            format!("{} extracting at {}", symbol, ship.nav.waypoint_symbol),
        );
        let fleet = ctx.api.fleet.clone();
        let tx = ctx.steps.sender();
        tokio::spawn(async move {
            let result = fleet
                .extract(&symbol, survey)
                .await
                .map(StepUpdate::Extraction);
            let mut completion = StepCompletion::new(symbol, "extract", result);
            completion.survey_signature = signature;
            let _ = tx.send(completion);
        });
        StepOutcome::ActionStarted
    }

    pub fn siphon(&self, ctx: &mut TickCtx) -> StepOutcome {
        let Some(ship) = self.ship(ctx) else {
            return self.missing_ship();
        };
        if ship.is_docked() {
            return self.orbit(ctx);
        }
        if !ship.cooldown.ready(ctx.now) || ship.cargo.space_remaining() <= 0 {
            return StepOutcome::Idle;
        }
        let symbol = self.ship_symbol.clone();
        ctx.steps.begin(
            &symbol,
            "siphon",
            format!("{} siphoning at {}", symbol, ship.nav.waypoint_symbol),
        );
        let fleet = ctx.api.fleet.clone();
        let tx = ctx.steps.sender();
        tokio::spawn(async move {
            let result = fleet.siphon(&symbol).await.map(StepUpdate::Extraction);
            let _ = tx.send(StepCompletion::new(symbol, "siphon", result));
        });
        StepOutcome::ActionStarted
    }

    pub fn survey(&self, ctx: &mut TickCtx) -> StepOutcome {
        let Some(ship) = self.ship(ctx) else {
            return self.missing_ship();
        };
        if ship.is_docked() {
            return self.orbit(ctx);
        }
        if !ship.cooldown.ready(ctx.now) {
            return StepOutcome::Idle;
        }
        let symbol = self.ship_symbol.clone();
        ctx.steps.begin(
            &symbol,
            "survey",
            format!("{} surveying {}", symbol, ship.nav.waypoint_symbol),
        );
        let fleet = ctx.api.fleet.clone();
        let tx = ctx.steps.sender();
        tokio::spawn(async move {
            let result = fleet.survey(&symbol).await.map(StepUpdate::Surveys);
            let _ = tx.send(StepCompletion::new(symbol, "survey", result));
        });
        StepOutcome::ActionStarted
    }

    pub fn buy(&self, ctx: &mut TickCtx, good: &str, units: i32) -> StepOutcome {
        if units <= 0 {
            return StepOutcome::Idle;
        }
        let Some(ship) = self.ship(ctx) else {
            return self.missing_ship();
        };
        if !ship.is_docked() {
            return self.dock(ctx);
        }
        let symbol = self.ship_symbol.clone();
        let good = good.to_string();
        ctx.steps.begin(
            &symbol,
            "buy",
            format!("{} buying {} x{}", symbol, good, units),
        );
        let fleet = ctx.api.fleet.clone();
        let tx = ctx.steps.sender();
        tokio::spawn(async move {
            let result = fleet
                .purchase_cargo(&symbol, &good, units)
                .await
                .map(StepUpdate::Purchase);
            let _ = tx.send(StepCompletion::new(symbol, "buy", result));
        });
        StepOutcome::ActionStarted
    }

    pub fn sell(&self, ctx: &mut TickCtx, good: &str, units: i32) -> StepOutcome {
        if units <= 0 {
            return StepOutcome::Idle;
        }
        let Some(ship) = self.ship(ctx) else {
            return self.missing_ship();
        };
        if !ship.is_docked() {
            return self.dock(ctx);
        }
        let symbol = self.ship_symbol.clone();
        let good = good.to_string();
        ctx.steps.begin(
            &symbol,
            "sell",
            format!("{} selling {} x{}", symbol, good, units),
        );
        let fleet = ctx.api.fleet.clone();
        let tx = ctx.steps.sender();
        tokio::spawn(async move {
            let result = fleet
                .sell_cargo(&symbol, &good, units)
                .await
                .map(StepUpdate::Sale);
            let _ = tx.send(StepCompletion::new(symbol, "sell", result));
        });
        StepOutcome::ActionStarted
    }

    pub fn deliver_contract(
        &self,
        ctx: &mut TickCtx,
        contract_id: &str,
        good: &str,
        units: i32,
    ) -> StepOutcome {
        if units <= 0 {
            return StepOutcome::Idle;
        }
        let Some(ship) = self.ship(ctx) else {
            return self.missing_ship();
        };
        if !ship.is_docked() {
            return self.dock(ctx);
        }
        let symbol = self.ship_symbol.clone();
        let contract_id = contract_id.to_string();
        let good = good.to_string();
        ctx.steps.begin(
            &symbol,
            "deliver",
            format!("{} delivering {} x{} for {}", symbol, good, units, contract_id),
        );
        let contracts = ctx.api.contracts.clone();
        let tx = ctx.steps.sender();
        tokio::spawn(async move {
            let result = contracts
                .deliver(&symbol, &contract_id, &good, units)
                .await
                .map(StepUpdate::Delivery);
            let _ = tx.send(StepCompletion::new(symbol, "deliver", result));
        });
        StepOutcome::ActionStarted
    }

    pub fn supply_construction(
        &self,
        ctx: &mut TickCtx,
        site_waypoint: &str,
        good: &str,
        units: i32,
    ) -> StepOutcome {
        if units <= 0 {
            return StepOutcome::Idle;
        }
        let Some(ship) = self.ship(ctx) else {
            return self.missing_ship();
        };
        if !ship.is_docked() {
            return self.dock(ctx);
        }
        let symbol = self.ship_symbol.clone();
        let site = site_waypoint.to_string();
        let good = good.to_string();
        ctx.steps.begin(
            &symbol,
            "supply",
            format!("{} supplying {} x{} to {}", symbol, good, units, site),
        );
        let construction = ctx.api.construction.clone();
        let tx = ctx.steps.sender();
        tokio::spawn(async move {
            let result = construction
                .supply(&symbol, &site, &good, units)
                .await
                .map(StepUpdate::ConstructionSupply);
            let _ = tx.send(StepCompletion::new(symbol, "supply", result));
        });
        StepOutcome::ActionStarted
    }

    /// Transfer cargo to a co-located ship. Both ships must share a nav
    /// status for the remote call to succeed, so we adjust ours first.
    pub fn transfer_to(
        &self,
        ctx: &mut TickCtx,
        target: &str,
        good: &str,
        units: i32,
    ) -> StepOutcome {
        if units <= 0 {
            return StepOutcome::Idle;
        }
        let Some(ship) = self.ship(ctx) else {
            return self.missing_ship();
        };
        let Some(other) = ctx.ships.get(target) else {
            return StepOutcome::Failed(format!("transfer target {} unknown", target));
        };
        if other.nav.waypoint_symbol != ship.nav.waypoint_symbol {
            return StepOutcome::Idle;
        }
        if ship.nav.status != other.nav.status {
            return if other.is_docked() {
                self.dock(ctx)
            } else {
                self.orbit(ctx)
            };
        }
        let symbol = self.ship_symbol.clone();
        let target = target.to_string();
        let good = good.to_string();
        ctx.steps.begin(
            &symbol,
            "transfer",
            format!("{} transferring {} x{} to {}", symbol, good, units, target),
        );
        let fleet = ctx.api.fleet.clone();
        let tx = ctx.steps.sender();
        tokio::spawn(async move {
            let result = fleet
                .transfer_cargo(&symbol, &target, &good, units)
                .await
                .map(StepUpdate::Cargo);
            let mut completion = StepCompletion::new(symbol, "transfer", result);
            completion.refresh_ship = Some(target);
            let _ = tx.send(completion);
        });
        StepOutcome::ActionStarted
    }

    pub fn jettison(&self, ctx: &mut TickCtx, good: &str, units: i32) -> StepOutcome {
        if units <= 0 {
            return StepOutcome::Idle;
        }
        if self.ship(ctx).is_none() {
            return self.missing_ship();
        }
        let symbol = self.ship_symbol.clone();
        let good = good.to_string();
        ctx.steps.begin(
            &symbol,
            "jettison",
            format!("{} jettisoning {} x{}", symbol, good, units),
        );
        let fleet = ctx.api.fleet.clone();
        let tx = ctx.steps.sender();
        tokio::spawn(async move {
            let result = fleet
                .jettison(&symbol, &good, units)
                .await
                .map(StepUpdate::Cargo);
            let _ = tx.send(StepCompletion::new(symbol, "jettison", result));
        });
        StepOutcome::ActionStarted
    }

    pub fn chart(&self, ctx: &mut TickCtx) -> StepOutcome {
        let Some(ship) = self.ship(ctx) else {
            return self.missing_ship();
        };
        let waypoint = ship.nav.waypoint_symbol.clone();
        let symbol = self.ship_symbol.clone();
        ctx.steps
            .begin(&symbol, "chart", format!("{} charting {}", symbol, waypoint));
        let fleet = ctx.api.fleet.clone();
        let tx = ctx.steps.sender();
        tokio::spawn(async move {
            let result = fleet.chart(&symbol).await.map(StepUpdate::Chart);
            let _ = tx.send(StepCompletion::new(symbol, "chart", result));
        });
        StepOutcome::ActionStarted
    }

    pub fn jump_to(&self, ctx: &mut TickCtx, gate_waypoint: &str) -> StepOutcome {
        let Some(ship) = self.ship(ctx) else {
            return self.missing_ship();
        };
        if ship.is_docked() {
            return self.orbit(ctx);
        }
        if !ship.cooldown.ready(ctx.now) {
            return StepOutcome::Idle;
        }
        let symbol = self.ship_symbol.clone();
        let gate = gate_waypoint.to_string();
        ctx.steps
            .begin(&symbol, "jump", format!("{} jumping to {}", symbol, gate));
        let fleet = ctx.api.fleet.clone();
        let tx = ctx.steps.sender();
        tokio::spawn(async move {
            let result = fleet.jump(&symbol, &gate).await.map(StepUpdate::Jump);
            let _ = tx.send(StepCompletion::new(symbol, "jump", result));
        });
        StepOutcome::ActionStarted
    }

    pub fn negotiate(&self, ctx: &mut TickCtx) -> StepOutcome {
        let Some(ship) = self.ship(ctx) else {
            return self.missing_ship();
        };
        if !ship.is_docked() {
            return self.dock(ctx);
        }
        let symbol = self.ship_symbol.clone();
        ctx.steps.begin(
            &symbol,
            "negotiate",
            format!("{} negotiating a contract", symbol),
        );
        let fleet = ctx.api.fleet.clone();
        let tx = ctx.steps.sender();
        tokio::spawn(async move {
            let result = fleet
                .negotiate_contract(&symbol)
                .await
                .map(StepUpdate::Contract);
            let _ = tx.send(StepCompletion::new(symbol, "negotiate", result));
        });
        StepOutcome::ActionStarted
    }

    /// Refresh the price data of the marketplace the ship is sitting at
    pub fn refresh_market(&self, ctx: &mut TickCtx) -> StepOutcome {
        let Some(ship) = self.ship(ctx) else {
            return self.missing_ship();
        };
        let system = ship.nav.system_symbol.clone();
        let waypoint = ship.nav.waypoint_symbol.clone();
        let symbol = self.ship_symbol.clone();
        ctx.steps.begin(
            &symbol,
            "market",
            format!("{} reading prices at {}", symbol, waypoint),
        );
        let markets = ctx.api.markets.clone();
        let tx = ctx.steps.sender();
        tokio::spawn(async move {
            let result = markets.market(&system, &waypoint).await.map(|market| {
                StepUpdate::MarketPrices {
                    waypoint: waypoint.clone(),
                    market,
                }
            });
            let _ = tx.send(StepCompletion::new(symbol, "market", result));
        });
        StepOutcome::ActionStarted
    }

    pub fn refresh_shipyard(&self, ctx: &mut TickCtx) -> StepOutcome {
        let Some(ship) = self.ship(ctx) else {
            return self.missing_ship();
        };
        let system = ship.nav.system_symbol.clone();
        let waypoint = ship.nav.waypoint_symbol.clone();
        let symbol = self.ship_symbol.clone();
        ctx.steps.begin(
            &symbol,
            "shipyard",
            format!("{} reading listings at {}", symbol, waypoint),
        );
        let shipyards = ctx.api.shipyards.clone();
        let tx = ctx.steps.sender();
        tokio::spawn(async move {
            let result = shipyards.shipyard(&system, &waypoint).await.map(|yard| {
                StepUpdate::ShipyardListing {
                    waypoint: waypoint.clone(),
                    shipyard: yard,
                }
            });
            let _ = tx.send(StepCompletion::new(symbol, "shipyard", result));
        });
        StepOutcome::ActionStarted
    }

    /// Resolve the gate the ship is sitting at into graph connections
    pub fn resolve_jump_gate(&self, ctx: &mut TickCtx) -> StepOutcome {
        let Some(ship) = self.ship(ctx) else {
            return self.missing_ship();
        };
        let system = ship.nav.system_symbol.clone();
        let waypoint = ship.nav.waypoint_symbol.clone();
        let symbol = self.ship_symbol.clone();
        ctx.steps.begin(
            &symbol,
            "gate",
            format!("{} resolving gate {}", symbol, waypoint),
        );
        let jump_gates = ctx.api.jump_gates.clone();
        let tx = ctx.steps.sender();
        tokio::spawn(async move {
            let result = jump_gates
                .connections(&system, &waypoint)
                .await
                .map(|connections| StepUpdate::GateConnections {
                    system: system.clone(),
                    gate_waypoint: waypoint.clone(),
                    connections,
                });
            let _ = tx.send(StepCompletion::new(symbol, "gate", result));
        });
        StepOutcome::ActionStarted
    }

    /// Navigate toward a waypoint in the current system, inserting a fuel
    /// stop when the direct leg would exceed range and opportunistically
    /// refueling along the way. Falls back to proceeding anyway (with a
    /// warning) when no stop helps.
    pub fn navigate_to(
        &self,
        ctx: &mut TickCtx,
        destination: &str,
        mode: Option<FlightMode>,
    ) -> StepOutcome {
        let plan = {
            let Some(ship) = self.ship(ctx) else {
                return self.missing_ship();
            };
            if ship.nav.waypoint_symbol == destination {
                return StepOutcome::Idle;
            }
            let desired = mode.unwrap_or(FlightMode::Cruise);
            let Some(view) = ctx.world.systems.get(&ship.nav.system_symbol) else {
                // Snapshot not loaded yet; the scheduler will fetch it
                return StepOutcome::Idle;
            };
            let Some(from) = view.waypoint(&ship.nav.waypoint_symbol) else {
                return StepOutcome::Failed(format!(
                    "{} is at unknown waypoint {}",
                    self.ship_symbol, ship.nav.waypoint_symbol
                ));
            };
            let Some(to) = view.waypoint(destination) else {
                return StepOutcome::Failed(format!(
                    "destination {} is not in system {}",
                    destination, ship.nav.system_symbol
                ));
            };
            let distance = from.distance_to(to);
            let needed = fuel_needed(distance, desired) + ctx.config.fuel.reserve_units;

            if ship.fuel.capacity == 0 || needed <= ship.fuel.current {
                departure_plan(ship, desired)
            } else if ctx.world.sells_fuel(from) && ship.fuel.current < ship.fuel.capacity {
                NavPlan::Refuel
            } else if let Some(stop) = fuel_stop(ctx, view, from, to, ship.fuel.current, desired) {
                NavPlan::Hop(stop)
            } else {
                v_error!(
                    "⚠️ {} cannot reach {} without drifting and no fuel stop helps - proceeding anyway",
                    self.ship_symbol,
                    destination
                );
                departure_plan(ship, desired)
            }
        };

        match plan {
            NavPlan::Refuel => self.refuel(ctx),
            NavPlan::Hop(stop) => {
                v_debug!(
                    "⛽ {} inserting fuel stop {} on the way to {}",
                    self.ship_symbol,
                    stop,
                    destination
                );
                self.navigate_to(ctx, &stop, mode)
            }
            NavPlan::SetMode(desired) => self.set_flight_mode(ctx, desired),
            NavPlan::Orbit => self.orbit(ctx),
            NavPlan::Go => {
                let symbol = self.ship_symbol.clone();
                let destination = destination.to_string();
                ctx.steps.begin(
                    &symbol,
                    "navigate",
                    format!("{} navigating to {}", symbol, destination),
                );
                let fleet = ctx.api.fleet.clone();
                let tx = ctx.steps.sender();
                tokio::spawn(async move {
                    let result = fleet
                        .navigate(&symbol, &destination)
                        .await
                        .map(StepUpdate::Navigation);
                    let _ = tx.send(StepCompletion::new(symbol, "navigate", result));
                });
                StepOutcome::ActionStarted
            }
        }
    }
}

enum NavPlan {
    Refuel,
    Hop(String),
    SetMode(FlightMode),
    Orbit,
    Go,
}

fn departure_plan(ship: &Ship, desired: FlightMode) -> NavPlan {
    if ship.nav.flight_mode != desired {
        NavPlan::SetMode(desired)
    } else if ship.is_docked() {
        NavPlan::Orbit
    } else {
        NavPlan::Go
    }
}

fn fuel_needed(distance: f64, mode: FlightMode) -> i32 {
    let base = distance.ceil() as i32;
    match mode {
        FlightMode::Drift => 1,
        FlightMode::Cruise | FlightMode::Stealth => base.max(1),
        FlightMode::Burn => (base * 2).max(2),
    }
}

/// Pick the refuelable waypoint reachable on current fuel that brings the
/// ship closest to its destination. None when no stop makes progress.
fn fuel_stop(
    ctx: &TickCtx,
    view: &crate::engine::context::SystemView,
    from: &Waypoint,
    to: &Waypoint,
    current_fuel: i32,
    mode: FlightMode,
) -> Option<String> {
    let direct = from.distance_to(to);
    view.waypoints
        .iter()
        .filter(|w| w.symbol != from.symbol && ctx.world.sells_fuel(w))
        .filter(|w| {
            let leg = from.distance_to(w);
            fuel_needed(leg, mode) + ctx.config.fuel.reserve_units <= current_fuel
                && w.distance_to(to) < direct
        })
        .min_by(|a, b| {
            let da = a.distance_to(to);
            let db = b.distance_to(to);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|w| w.symbol.clone())
}
