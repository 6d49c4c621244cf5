// Pair manager - a miner/hauler team (optionally with a surveyor). The
// miner digs continuously and hands its ore to the hauler at the site;
// the hauler runs rendezvous collection routes to the best market.

use crate::engine::bot::Bot;
use crate::engine::context::TickCtx;
use crate::engine::managers::trade::{pick_flight_mode, run_route};
use crate::engine::managers::{mine, schedulable, ManagerReport};
use crate::engine::scoring::{average_fuel_price, best_sell_market, can_sell_or_jettison_cargo};
use crate::engine::step::StepOutcome;
use crate::engine::trade_route::TradeRoute;
use std::collections::HashMap;

pub struct PairManager {
    pub miner: String,
    pub hauler: String,
    pub surveyor: Option<String>,
    pub bots: Vec<String>,
}

impl PairManager {
    pub fn new(miner: String, hauler: String) -> Self {
        let bots = vec![miner.clone(), hauler.clone()];
        Self {
            miner,
            hauler,
            surveyor: None,
            bots,
        }
    }

    /// Late joiners are surveyors filling the team out
    pub fn adopt(&mut self, symbol: String) {
        if self.surveyor.is_none() && symbol != self.miner && symbol != self.hauler {
            self.surveyor = Some(symbol.clone());
        }
        self.bots.push(symbol);
    }

    pub fn release_member(&mut self, symbol: &str) {
        self.bots.retain(|s| s != symbol);
        if self.surveyor.as_deref() == Some(symbol) {
            self.surveyor = None;
        }
    }

    pub fn has_surveyor(&self) -> bool {
        self.surveyor.is_some()
    }

    pub fn step(&mut self, bots: &mut HashMap<String, Bot>, ctx: &mut TickCtx) -> ManagerReport {
        let mut report = ManagerReport::default();

        if let Some(symbol) = self.surveyor.clone() {
            if schedulable(ctx, &symbol).is_some() {
                if let Some(bot) = bots.get_mut(&symbol) {
                    let outcome = mine::step_bot(bot, ctx);
                    report.record("pair", bot, outcome);
                }
            }
        }

        self.step_hauler(bots, ctx, &mut report);
        self.step_miner(bots, ctx, &mut report);
        report
    }

    fn step_hauler(
        &self,
        bots: &mut HashMap<String, Bot>,
        ctx: &mut TickCtx,
        report: &mut ManagerReport,
    ) {
        if schedulable(ctx, &self.hauler).is_none() {
            return;
        }
        let planned = {
            let has_route = bots
                .get(&self.hauler)
                .is_some_and(|b| b.trade_route.is_some());
            if has_route {
                None
            } else {
                self.plan_hauler_route(ctx)
            }
        };
        let Some(bot) = bots.get_mut(&self.hauler) else {
            return;
        };
        if let Some(route) = planned {
            bot.trade_route = Some(route);
        }

        // A collecting hauler heads for market early when it is nearly
        // full, or when its miner has settled somewhere else and no more
        // transfers are coming. A miner still in transit may be inbound,
        // so it keeps the hauler waiting.
        let nearly_full = ctx
            .ships
            .get(&self.hauler)
            .is_some_and(|s| s.cargo.space_remaining() <= ctx.config.mining.cargo_full_buffer);
        let filler_present = ctx.ships.get(&self.miner).is_some_and(|m| {
            m.in_transit(ctx.now)
                || ctx
                    .ships
                    .get(&self.hauler)
                    .is_some_and(|h| m.nav.waypoint_symbol == h.nav.waypoint_symbol)
        });
        if nearly_full || !filler_present {
            if let Some(route) = bot.trade_route.as_mut() {
                route.release();
            }
        }

        let outcome = match bot.trade_route.is_some() {
            true => run_route(bot, ctx),
            // Nothing to haul yet; hold position at the mining site
            false => match rendezvous_site(ctx, &self.miner) {
                Some(site) => bot.navigate_to(ctx, &site, None),
                None => StepOutcome::Idle,
            },
        };
        report.record("pair", bot, outcome);
    }

    fn step_miner(
        &self,
        bots: &mut HashMap<String, Bot>,
        ctx: &mut TickCtx,
        report: &mut ManagerReport,
    ) {
        if schedulable(ctx, &self.miner).is_none() {
            return;
        }
        let transfer = {
            let hauler_collecting = bots
                .get(&self.hauler)
                .and_then(|b| b.trade_route.as_ref())
                .is_some_and(|r| r.collecting());
            self.transfer_decision(ctx, hauler_collecting)
        };
        let Some(bot) = bots.get_mut(&self.miner) else {
            return;
        };
        let outcome = match transfer {
            Transfer::Send { good, units } => bot.transfer_to(ctx, &self.hauler, &good, units),
            Transfer::HoldFull => StepOutcome::Idle,
            Transfer::NotFull => mine::step_bot(bot, ctx),
        };
        report.record("pair", bot, outcome);
    }

    fn transfer_decision(&self, ctx: &TickCtx, hauler_collecting: bool) -> Transfer {
        let Some(miner) = ctx.ships.get(&self.miner) else {
            return Transfer::HoldFull;
        };
        if miner.cargo.units == 0
            || miner.cargo.space_remaining() > ctx.config.mining.cargo_full_buffer
        {
            return Transfer::NotFull;
        }
        let Some(hauler) = ctx.ships.get(&self.hauler) else {
            return Transfer::HoldFull;
        };
        let co_located = hauler.nav.waypoint_symbol == miner.nav.waypoint_symbol
            && !hauler.in_transit(ctx.now);
        let space = hauler.cargo.space_remaining();
        if !hauler_collecting || !co_located || space <= 0 {
            return Transfer::HoldFull;
        }
        match miner.cargo.inventory.iter().find(|item| item.units > 0) {
            Some(item) => Transfer::Send {
                good: item.symbol.clone(),
                units: item.units.min(space),
            },
            None => Transfer::NotFull,
        }
    }

    fn plan_hauler_route(&self, ctx: &TickCtx) -> Option<TradeRoute> {
        let hauler = ctx.ships.get(&self.hauler)?;
        let view = ctx.world.systems.get(&hauler.nav.system_symbol)?;
        let fuel_price =
            average_fuel_price(ctx.world, view).unwrap_or(ctx.config.fuel.default_fuel_price);
        let reserved = ctx.world.reserved_goods();

        // Sell off anything already in the hold first
        if let Some(from) = view.waypoint(&hauler.nav.waypoint_symbol) {
            for item in &hauler.cargo.inventory {
                if item.units <= 0 || !can_sell_or_jettison_cargo(&item.symbol, &reserved) {
                    continue;
                }
                if let Some(option) =
                    best_sell_market(ctx.world, view, from, &item.symbol, fuel_price)
                {
                    let mode = pick_flight_mode(
                        hauler,
                        view,
                        &hauler.nav.waypoint_symbol,
                        &option.waypoint_symbol,
                        ctx,
                    );
                    return Some(TradeRoute::sell_off(
                        item.symbol.clone(),
                        option.waypoint_symbol,
                        option.unit_price,
                        mode,
                    ));
                }
            }
        }

        // Rendezvous for whatever the miner is digging up
        let miner = ctx.ships.get(&self.miner)?;
        let site = view.mining_site(false)?;
        let good = miner
            .cargo
            .inventory
            .iter()
            .filter(|item| item.units > 0 && can_sell_or_jettison_cargo(&item.symbol, &reserved))
            .max_by_key(|item| item.units)?
            .symbol
            .clone();
        let option = best_sell_market(ctx.world, view, site, &good, fuel_price)?;
        let mode = pick_flight_mode(hauler, view, &site.symbol, &option.waypoint_symbol, ctx);
        Some(TradeRoute::collection(
            good,
            site.symbol.clone(),
            option.waypoint_symbol,
            option.unit_price,
            mode,
        ))
    }
}

enum Transfer {
    Send { good: String, units: i32 },
    HoldFull,
    NotFull,
}

fn rendezvous_site(ctx: &TickCtx, miner: &str) -> Option<String> {
    let ship = ctx.ships.get(miner)?;
    let view = ctx.world.systems.get(&ship.nav.system_symbol)?;
    view.mining_site(false).map(|w| w.symbol.clone())
}
