// Construction manager - haulers feeding the system's construction site,
// one purchase-and-deliver route at a time

use crate::engine::bot::Bot;
use crate::engine::context::TickCtx;
use crate::engine::managers::trade::{pick_flight_mode, run_route};
use crate::engine::managers::{schedulable, ManagerReport};
use crate::engine::trade_route::{DeliveryTarget, TradeRoute};
use crate::v_info;
use std::collections::HashMap;

#[derive(Default)]
pub struct ConstructionManager {
    pub bots: Vec<String>,
}

impl ConstructionManager {
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
                if let Some(route) = plan_supply_route(bot, ctx) {
                    v_info!(
                        "🏗️ {} supplying {} from {} to {}",
                        bot.ship_symbol,
                        route.good,
                        route.buy_waypoint,
                        route.sell_waypoint
                    );
                    bot.trade_route = Some(route);
                }
            }
            let outcome = run_route(bot, ctx);
            report.record("construction", bot, outcome);
        }
        report
    }
}

fn plan_supply_route(bot: &Bot, ctx: &TickCtx) -> Option<TradeRoute> {
    let site = ctx.world.construction.as_ref()?;
    if site.is_complete {
        return None;
    }
    let material = site.next_material()?;
    let ship = ctx.ships.get(&bot.ship_symbol)?;
    let view = ctx.world.systems.get(&ship.nav.system_symbol)?;

    let (buy_waypoint, price) = view
        .marketplaces()
        .filter_map(|w| {
            ctx.world
                .purchase_price(&w.symbol, &material.trade_symbol)
                .map(|p| (w.symbol.clone(), p))
        })
        .min_by_key(|(_, price)| *price)?;
    if ctx.world.credits - ctx.config.trading.credit_reserve < price as i64 {
        return None;
    }

    let mode = pick_flight_mode(ship, view, &buy_waypoint, &site.symbol, ctx);
    Some(TradeRoute::purchase(
        material.trade_symbol.clone(),
        buy_waypoint,
        site.symbol.clone(),
        price,
        0,
        mode,
        Some(DeliveryTarget::Construction {
            waypoint: site.symbol.clone(),
        }),
    ))
}
