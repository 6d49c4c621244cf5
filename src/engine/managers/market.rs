// Market manager - keeps price data of the bot's current system fresh by
// walking its ship between stale marketplaces

use crate::engine::bot::Bot;
use crate::engine::context::TickCtx;
use crate::engine::managers::{schedulable, ManagerReport};
use crate::engine::step::StepOutcome;
use chrono::Duration;
use std::collections::HashMap;

#[derive(Default)]
pub struct MarketManager {
    pub bots: Vec<String>,
}

impl MarketManager {
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
            let outcome = step_bot(bot, ctx);
            report.record("market", bot, outcome);
        }
        report
    }
}

fn step_bot(bot: &mut Bot, ctx: &mut TickCtx) -> StepOutcome {
    let target = {
        let Some(ship) = ctx.ships.get(&bot.ship_symbol) else {
            return StepOutcome::Failed(format!("no state for ship {}", bot.ship_symbol));
        };
        let Some(view) = ctx.world.systems.get(&ship.nav.system_symbol) else {
            return StepOutcome::Idle;
        };
        let stale_after = Duration::minutes(ctx.config.market.price_stale_minutes);
        let here = view.waypoint(&ship.nav.waypoint_symbol);
        let mut stale: Vec<_> = view
            .marketplaces()
            .filter(|w| match ctx.world.market_snapshot(&w.symbol) {
                Some(snap) => ctx.now - snap.fetched_at >= stale_after,
                None => true,
            })
            .collect();
        match here {
            Some(from) => stale.sort_by(|a, b| {
                from.distance_to(a)
                    .partial_cmp(&from.distance_to(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
            None => {}
        }
        stale.first().map(|w| w.symbol.clone())
    };

    match target {
        None => StepOutcome::Idle,
        Some(waypoint) => {
            let here = ctx
                .ships
                .get(&bot.ship_symbol)
                .is_some_and(|s| s.nav.waypoint_symbol == waypoint);
            if here {
                bot.refresh_market(ctx)
            } else {
                bot.navigate_to(ctx, &waypoint, None)
            }
        }
    }
}
