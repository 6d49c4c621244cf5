// Explore manager - explorers chart waypoints, pull price and shipyard
// data, resolve jump gates, and jump to the closest unexplored systems
// over the discovered gate graph

use crate::engine::bot::Bot;
use crate::engine::context::TickCtx;
use crate::engine::managers::{schedulable, ManagerReport};
use crate::engine::step::StepOutcome;
use crate::{v_debug, v_info};
use std::collections::HashMap;

#[derive(Default)]
pub struct ExploreManager {
    pub bots: Vec<String>,
}

impl ExploreManager {
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
            report.record("explore", bot, outcome);
        }
        report
    }
}

fn step_bot(bot: &mut Bot, ctx: &mut TickCtx) -> StepOutcome {
    let Some(ship) = ctx.ships.get(&bot.ship_symbol) else {
        return StepOutcome::Failed(format!("no state for ship {}", bot.ship_symbol));
    };
    let system = ship.nav.system_symbol.clone();
    let here = ship.nav.waypoint_symbol.clone();

    // Drop path legs already behind us
    while bot.exploration_path.first() == Some(&system) {
        bot.exploration_path.remove(0);
    }
    if bot.exploration_path.is_empty() {
        ctx.world
            .claimed_systems
            .retain(|_, claimant| claimant != &bot.ship_symbol);
    }

    // Keep traveling a committed path
    if let Some(next) = bot.exploration_path.first().cloned() {
        return travel_leg(bot, ctx, &system, &here, &next);
    }

    // Visit unexplored waypoints of the current system
    if let Some(target) = nearest_local_target(ctx, &system, &here) {
        if target == here {
            return explore_here(bot, ctx, &system, &here);
        }
        return bot.navigate_to(ctx, &target, None);
    }

    // Pick a new frontier system and commit to the trip
    let matches = ctx.world.jump_graph.closest_gate_systems(&system, |s| {
        ctx.world.system_needs_exploring(s) && !ctx.world.claimed_systems.contains_key(s)
    });
    let Some(target) = matches.into_iter().next() else {
        return StepOutcome::Idle;
    };
    let Some(mut path) = ctx.world.jump_graph.find_shortest_path(&system, &target) else {
        return StepOutcome::Idle;
    };
    path.retain(|s| s != &system);
    if path.is_empty() {
        return StepOutcome::Idle;
    }
    v_info!(
        "🗺️ {} heading out to explore {} ({} jumps)",
        bot.ship_symbol,
        target,
        path.len()
    );
    ctx.world
        .claimed_systems
        .insert(target, bot.ship_symbol.clone());
    bot.exploration_path = path;
    let next = bot.exploration_path[0].clone();
    travel_leg(bot, ctx, &system, &here, &next)
}

/// Move to the local gate, then jump toward the next system on the path
fn travel_leg(
    bot: &mut Bot,
    ctx: &mut TickCtx,
    system: &str,
    here: &str,
    next: &str,
) -> StepOutcome {
    let local_gate = ctx
        .world
        .jump_graph
        .gate_waypoint(system)
        .cloned()
        .or_else(|| {
            ctx.world
                .systems
                .get(system)
                .and_then(|view| view.jump_gate())
                .map(|w| w.symbol.clone())
        });
    let dest_gate = ctx.world.jump_graph.gate_waypoint(next).cloned();
    match (local_gate, dest_gate) {
        (Some(local), Some(dest)) => {
            if here == local {
                bot.jump_to(ctx, &dest)
            } else {
                bot.navigate_to(ctx, &local, None)
            }
        }
        _ => {
            v_debug!(
                "🗺️ {} dropping exploration path: gate for {} unknown",
                bot.ship_symbol,
                next
            );
            bot.exploration_path.clear();
            ctx.world
                .claimed_systems
                .retain(|_, claimant| claimant != &bot.ship_symbol);
            StepOutcome::Idle
        }
    }
}

fn nearest_local_target(ctx: &TickCtx, system: &str, here: &str) -> Option<String> {
    let targets = ctx.world.needs_exploring.get(system)?;
    let view = ctx.world.systems.get(system)?;
    let from = view.waypoint(here);
    targets
        .iter()
        .min_by(|a, b| {
            let da = distance_from(view, from, a);
            let db = distance_from(view, from, b);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .cloned()
}

fn distance_from(
    view: &crate::engine::context::SystemView,
    from: Option<&crate::models::Waypoint>,
    symbol: &str,
) -> f64 {
    match (from, view.waypoint(symbol)) {
        (Some(a), Some(b)) => a.distance_to(b),
        _ => f64::MAX,
    }
}

/// Do whatever the waypoint under the ship still needs
fn explore_here(bot: &Bot, ctx: &mut TickCtx, system: &str, here: &str) -> StepOutcome {
    let action = {
        let Some(view) = ctx.world.systems.get(system) else {
            return StepOutcome::Idle;
        };
        let Some(waypoint) = view.waypoint(here) else {
            return StepOutcome::Idle;
        };
        if waypoint.is_uncharted() && !waypoint.is_asteroid() {
            LocalAction::Chart
        } else if waypoint.has_marketplace() && !ctx.world.markets.contains_key(here) {
            LocalAction::Market
        } else if waypoint.has_shipyard() && !ctx.world.shipyards.contains_key(here) {
            LocalAction::Shipyard
        } else if waypoint.is_jump_gate() && !ctx.world.jump_graph.contains(system) {
            LocalAction::Gate
        } else {
            LocalAction::Nothing
        }
    };
    match action {
        LocalAction::Chart => bot.chart(ctx),
        LocalAction::Market => bot.refresh_market(ctx),
        LocalAction::Shipyard => bot.refresh_shipyard(ctx),
        LocalAction::Gate => bot.resolve_jump_gate(ctx),
        LocalAction::Nothing => StepOutcome::Idle,
    }
}

enum LocalAction {
    Chart,
    Market,
    Shipyard,
    Gate,
    Nothing,
}
