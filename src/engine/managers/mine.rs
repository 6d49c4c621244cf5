// Mine manager - extraction crews: surveyors keep fresh surveys banked,
// extractors dig against the best survey and haul their ore to market
// when the hold fills up

use crate::engine::bot::Bot;
use crate::engine::context::{SystemView, TickCtx, WorldContext};
use crate::engine::managers::{schedulable, ManagerReport};
use crate::engine::role::Role;
use crate::engine::scoring::{
    average_fuel_price, best_sell_market, best_survey, can_sell_or_jettison_cargo,
};
use crate::engine::step::StepOutcome;
use crate::models::{Ship, Survey};
use std::collections::HashMap;

#[derive(Default)]
pub struct MineManager {
    pub bots: Vec<String>,
}

pub(crate) enum MinePlan {
    Navigate(String),
    Survey,
    Mine(Option<Survey>),
    Siphon,
    Transfer { target: String, good: String, units: i32 },
    Sell { good: String, units: i32 },
    Jettison { good: String, units: i32 },
    Wait,
    Abort(String),
}

impl MineManager {
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
            report.record("mine", bot, outcome);
        }
        report
    }
}

pub(crate) fn step_bot(bot: &Bot, ctx: &mut TickCtx) -> StepOutcome {
    match make_plan(bot, ctx) {
        MinePlan::Navigate(waypoint) => bot.navigate_to(ctx, &waypoint, None),
        MinePlan::Survey => bot.survey(ctx),
        MinePlan::Mine(survey) => bot.mine(ctx, survey),
        MinePlan::Siphon => bot.siphon(ctx),
        MinePlan::Transfer {
            target,
            good,
            units,
        } => bot.transfer_to(ctx, &target, &good, units),
        MinePlan::Sell { good, units } => bot.sell(ctx, &good, units),
        MinePlan::Jettison { good, units } => bot.jettison(ctx, &good, units),
        MinePlan::Wait => StepOutcome::Idle,
        MinePlan::Abort(reason) => StepOutcome::Failed(reason),
    }
}

fn make_plan(bot: &Bot, ctx: &TickCtx) -> MinePlan {
    let Some(ship) = ctx.ships.get(&bot.ship_symbol) else {
        return MinePlan::Abort(format!("no state for ship {}", bot.ship_symbol));
    };
    let Some(view) = ctx.world.systems.get(&ship.nav.system_symbol) else {
        return MinePlan::Wait;
    };
    let Some(site) = view.mining_site(bot.role == Role::Siphoner) else {
        return MinePlan::Wait;
    };
    let site_symbol = site.symbol.clone();

    // Full hold: hand the ore to a bigger co-located ship, else haul it
    // off before digging any further
    if bot.role != Role::Surveyor
        && ship.cargo.space_remaining() <= ctx.config.mining.cargo_full_buffer
        && ship.cargo.units > 0
    {
        if let Some(plan) = consolidation_plan(ship, ctx) {
            return plan;
        }
        let fuel_price =
            average_fuel_price(ctx.world, view).unwrap_or(ctx.config.fuel.default_fuel_price);
        return offload_plan(ship, ctx.world, view, fuel_price);
    }

    if ship.nav.waypoint_symbol != site_symbol {
        return MinePlan::Navigate(site_symbol);
    }

    let fresh_surveys = ctx
        .world
        .surveys
        .get(&site_symbol)
        .map(|surveys| surveys.iter().filter(|s| s.is_fresh(ctx.now)).count())
        .unwrap_or(0);

    match bot.role {
        Role::Surveyor => {
            if fresh_surveys < ctx.config.mining.surveys_per_site {
                MinePlan::Survey
            } else {
                MinePlan::Wait
            }
        }
        Role::SurveyorMiner if fresh_surveys < ctx.config.mining.surveys_per_site => {
            MinePlan::Survey
        }
        Role::Siphoner => MinePlan::Siphon,
        _ => {
            let fuel_price =
                average_fuel_price(ctx.world, view).unwrap_or(ctx.config.fuel.default_fuel_price);
            let survey = ctx
                .world
                .surveys
                .get(&site_symbol)
                .and_then(|surveys| {
                    best_survey(surveys, ctx.world, view, site, fuel_price, ctx.now)
                })
                .cloned();
            MinePlan::Mine(survey)
        }
    }
}

/// Hand cargo to the roomiest co-located ship with a bigger hold, so the
/// extractor keeps digging while someone else hauls.
fn consolidation_plan(ship: &Ship, ctx: &TickCtx) -> Option<MinePlan> {
    let target = ctx
        .ships
        .values()
        .filter(|other| {
            other.symbol != ship.symbol
                && other.nav.waypoint_symbol == ship.nav.waypoint_symbol
                && !other.in_transit(ctx.now)
                && other.cargo.capacity > ship.cargo.capacity
                && other.cargo.space_remaining() > 0
        })
        .max_by_key(|other| other.cargo.space_remaining())?;
    let item = ship.cargo.inventory.iter().find(|item| item.units > 0)?;
    Some(MinePlan::Transfer {
        target: target.symbol.clone(),
        good: item.symbol.clone(),
        units: item.units.min(target.cargo.space_remaining()),
    })
}

/// Decide where a full hold goes: the best net-value market for any held
/// good, a jettison for goods nobody buys, or a hold while everything left
/// is reserved for a fleet goal.
fn offload_plan(
    ship: &Ship,
    world: &WorldContext,
    view: &SystemView,
    fuel_price: i32,
) -> MinePlan {
    let Some(from) = view.waypoint(&ship.nav.waypoint_symbol) else {
        return MinePlan::Wait;
    };
    let reserved = world.reserved_goods();

    let mut best: Option<(String, i32, String, f64)> = None;
    let mut unsold: Option<(String, i32)> = None;
    for item in &ship.cargo.inventory {
        if item.units <= 0 || !can_sell_or_jettison_cargo(&item.symbol, &reserved) {
            continue;
        }
        match best_sell_market(world, view, from, &item.symbol, fuel_price) {
            Some(option) if option.net_value > 0.0 => {
                let better = best
                    .as_ref()
                    .map(|(_, _, _, net)| option.net_value > *net)
                    .unwrap_or(true);
                if better {
                    best = Some((
                        item.symbol.clone(),
                        item.units,
                        option.waypoint_symbol,
                        option.net_value,
                    ));
                }
            }
            _ => {
                if unsold.is_none() {
                    unsold = Some((item.symbol.clone(), item.units));
                }
            }
        }
    }

    if let Some((good, units, market, _)) = best {
        if ship.nav.waypoint_symbol == market {
            return MinePlan::Sell { good, units };
        }
        return MinePlan::Navigate(market);
    }
    if let Some((good, units)) = unsold {
        return MinePlan::Jettison { good, units };
    }
    // Everything left is reserved; hold it for a hauler
    MinePlan::Wait
}
