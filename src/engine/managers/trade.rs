// Trade manager - plans and runs market routes for hauling bots:
// contract deliveries first, then the best local price spread

use crate::engine::bot::Bot;
use crate::engine::context::{SystemView, TickCtx, WorldContext};
use crate::engine::managers::{schedulable, ManagerReport};
use crate::engine::scoring::{average_fuel_price, best_sell_market, can_sell_or_jettison_cargo};
use crate::engine::step::StepOutcome;
use crate::engine::trade_route::{DeliveryTarget, TradeRoute};
use crate::models::{system_symbol_of, FlightMode, Ship};
use crate::v_info;
use std::collections::HashMap;

#[derive(Default)]
pub struct TradeManager {
    pub bots: Vec<String>,
}

impl TradeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&mut self, bots: &mut HashMap<String, Bot>, ctx: &mut TickCtx) -> ManagerReport {
        let mut report = ManagerReport::default();
        for symbol in self.bots.clone() {
            if schedulable(ctx, &symbol).is_none() {
                continue;
            }
            let Some(bot) = bots.get_mut(&symbol) else {
                continue;
            };
            if bot.trade_route.is_none() {
                if let Some(route) = plan_route(bot, ctx) {
                    v_info!(
                        "🧭 {} taking {} route {} -> {} (expected +{}/unit)",
                        bot.ship_symbol,
                        route.good,
                        route.buy_waypoint,
                        route.sell_waypoint,
                        route.expected_profit
                    );
                    bot.trade_route = Some(route);
                }
            }
            let outcome = run_route(bot, ctx);
            report.record("trade", bot, outcome);
        }
        report
    }
}

/// Advance the bot's current route, dropping it once complete
pub(crate) fn run_route(bot: &mut Bot, ctx: &mut TickCtx) -> StepOutcome {
    let Some(mut route) = bot.trade_route.take() else {
        return StepOutcome::Idle;
    };
    let outcome = route.execute(bot, ctx);
    if !route.complete {
        bot.trade_route = Some(route);
    }
    outcome
}

fn plan_route(bot: &Bot, ctx: &TickCtx) -> Option<TradeRoute> {
    let ship = ctx.ships.get(&bot.ship_symbol)?;
    let view = ctx.world.systems.get(&ship.nav.system_symbol)?;
    let fuel_price =
        average_fuel_price(ctx.world, view).unwrap_or(ctx.config.fuel.default_fuel_price);

    if let Some(route) = leftover_cargo_route(ship, ctx.world, view, fuel_price, ctx) {
        return Some(route);
    }
    if let Some(route) = contract_route(ship, ctx.world, view, ctx) {
        return Some(route);
    }
    arbitrage_route(ship, ctx.world, view, ctx)
}

/// Cargo already in the hold goes to its best market before anything else
fn leftover_cargo_route(
    ship: &Ship,
    world: &WorldContext,
    view: &SystemView,
    fuel_price: i32,
    ctx: &TickCtx,
) -> Option<TradeRoute> {
    let from = view.waypoint(&ship.nav.waypoint_symbol)?;
    let reserved = world.reserved_goods();
    for item in &ship.cargo.inventory {
        if item.units <= 0 || !can_sell_or_jettison_cargo(&item.symbol, &reserved) {
            continue;
        }
        let Some(option) = best_sell_market(world, view, from, &item.symbol, fuel_price) else {
            continue;
        };
        if option.net_value <= 0.0 {
            continue;
        }
        let mode = pick_flight_mode(ship, view, &ship.nav.waypoint_symbol, &option.waypoint_symbol, ctx);
        return Some(TradeRoute::sell_off(
            item.symbol.clone(),
            option.waypoint_symbol,
            option.unit_price,
            mode,
        ));
    }
    None
}

fn contract_route(
    ship: &Ship,
    world: &WorldContext,
    view: &SystemView,
    ctx: &TickCtx,
) -> Option<TradeRoute> {
    let contract = world.contract.as_ref()?;
    if !contract.accepted || contract.fulfilled {
        return None;
    }
    let delivery = contract.next_delivery()?;
    if system_symbol_of(&delivery.destination_symbol) != ship.nav.system_symbol {
        return None;
    }
    let (buy_waypoint, price) = cheapest_purchase(world, view, &delivery.trade_symbol)?;
    if world.credits - ctx.config.trading.credit_reserve < price as i64 {
        return None;
    }
    let mode = pick_flight_mode(ship, view, &buy_waypoint, &delivery.destination_symbol, ctx);
    Some(TradeRoute::purchase(
        delivery.trade_symbol.clone(),
        buy_waypoint,
        delivery.destination_symbol.clone(),
        price,
        0,
        mode,
        Some(DeliveryTarget::Contract {
            id: contract.id.clone(),
        }),
    ))
}

/// Best buy-low/sell-high spread across the system's cached markets
fn arbitrage_route(
    ship: &Ship,
    world: &WorldContext,
    view: &SystemView,
    ctx: &TickCtx,
) -> Option<TradeRoute> {
    let spendable = world.credits - ctx.config.trading.credit_reserve;
    let mut best: Option<TradeRoute> = None;
    for buy_market in view.marketplaces() {
        let Some(snapshot) = world.market_snapshot(&buy_market.symbol) else {
            continue;
        };
        for good in &snapshot.market.trade_goods {
            let buy_price = good.purchase_price;
            if buy_price <= 0 || spendable < buy_price as i64 {
                continue;
            }
            for sell_market in view.marketplaces() {
                if sell_market.symbol == buy_market.symbol {
                    continue;
                }
                let Some(sell_price) = world.sell_price(&sell_market.symbol, &good.symbol) else {
                    continue;
                };
                let profit = sell_price - buy_price;
                if profit < ctx.config.trading.min_profit_per_unit {
                    continue;
                }
                let better = best
                    .as_ref()
                    .map(|route| profit > route.expected_profit)
                    .unwrap_or(true);
                if better {
                    let mode = pick_flight_mode(
                        ship,
                        view,
                        &buy_market.symbol,
                        &sell_market.symbol,
                        ctx,
                    );
                    best = Some(TradeRoute::purchase(
                        good.symbol.clone(),
                        buy_market.symbol.clone(),
                        sell_market.symbol.clone(),
                        buy_price,
                        sell_price,
                        mode,
                        None,
                    ));
                }
            }
        }
    }
    best
}

fn cheapest_purchase(
    world: &WorldContext,
    view: &SystemView,
    good: &str,
) -> Option<(String, i32)> {
    view.marketplaces()
        .filter_map(|w| world.purchase_price(&w.symbol, good).map(|p| (w.symbol.clone(), p)))
        .min_by_key(|(_, price)| *price)
}

/// Burn when the tank covers the doubled fuel cost of the leg, else cruise
pub(crate) fn pick_flight_mode(
    ship: &Ship,
    view: &SystemView,
    from: &str,
    to: &str,
    ctx: &TickCtx,
) -> FlightMode {
    let (Some(a), Some(b)) = (view.waypoint(from), view.waypoint(to)) else {
        return FlightMode::Cruise;
    };
    let burn_cost = (a.distance_to(b).ceil() as i32) * 2 + ctx.config.fuel.reserve_units;
    if ship.fuel.capacity >= burn_cost {
        FlightMode::Burn
    } else {
        FlightMode::Cruise
    }
}
