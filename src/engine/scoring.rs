// Heuristic scoring for resource extraction and sale decisions

use crate::engine::context::{SystemView, WorldContext};
use crate::models::{Survey, Waypoint};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// One FUEL trade good refuels this many fuel units
const FUEL_UNITS_PER_GOOD: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct SellOption {
    pub waypoint_symbol: String,
    pub unit_price: i32,
    pub distance: f64,
    /// Unit price minus the per-unit share of round-trip fuel
    pub net_value: f64,
}

/// Average FUEL purchase price across the system's cached markets,
/// used as a proxy when a specific market has no fuel price.
pub fn average_fuel_price(world: &WorldContext, view: &SystemView) -> Option<i32> {
    let prices: Vec<i32> = view
        .marketplaces()
        .filter_map(|w| world.purchase_price(&w.symbol, "FUEL"))
        .collect();
    if prices.is_empty() {
        return None;
    }
    Some(prices.iter().sum::<i32>() / prices.len() as i32)
}

pub fn round_trip_fuel_cost(distance: f64, fuel_price: i32) -> f64 {
    2.0 * distance / FUEL_UNITS_PER_GOOD * fuel_price as f64
}

/// Best market in the system to sell a good at, judged by sell price less
/// round-trip fuel cost from `from`.
pub fn best_sell_market(
    world: &WorldContext,
    view: &SystemView,
    from: &Waypoint,
    good: &str,
    fuel_price: i32,
) -> Option<SellOption> {
    let mut best: Option<SellOption> = None;
    for market in view.marketplaces() {
        let Some(unit_price) = world.sell_price(&market.symbol, good) else {
            continue;
        };
        let distance = from.distance_to(market);
        let net_value = unit_price as f64 - round_trip_fuel_cost(distance, fuel_price);
        let better = match &best {
            Some(current) => net_value > current.net_value,
            None => true,
        };
        if better {
            best = Some(SellOption {
                waypoint_symbol: market.symbol.clone(),
                unit_price,
                distance,
                net_value,
            });
        }
    }
    best
}

/// Average over a survey's deposits of (best sell price - round-trip fuel
/// cost to reach that market). Deposits nobody buys contribute zero.
pub fn survey_score(
    world: &WorldContext,
    view: &SystemView,
    from: &Waypoint,
    survey: &Survey,
    fuel_price: i32,
) -> f64 {
    if survey.deposits.is_empty() {
        return 0.0;
    }
    let total: f64 = survey
        .deposits
        .iter()
        .map(|deposit| {
            best_sell_market(world, view, from, &deposit.symbol, fuel_price)
                .map(|option| option.net_value.max(0.0))
                .unwrap_or(0.0)
        })
        .sum();
    total / survey.deposits.len() as f64
}

/// Pick the highest-scoring fresh survey for a mining site
pub fn best_survey<'a>(
    surveys: &'a [Survey],
    world: &WorldContext,
    view: &SystemView,
    from: &Waypoint,
    fuel_price: i32,
    now: DateTime<Utc>,
) -> Option<&'a Survey> {
    surveys
        .iter()
        .filter(|s| s.is_fresh(now))
        .max_by(|a, b| {
            let score_a = survey_score(world, view, from, a, fuel_price);
            let score_b = survey_score(world, view, from, b, fuel_price);
            score_a
                .partial_cmp(&score_b)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

/// Whether a cargo item may be sold off or jettisoned. Antimatter, mounts,
/// and modules are never let go; neither are goods reserved for the current
/// contract, construction site, or an active trade route.
pub fn can_sell_or_jettison_cargo(symbol: &str, reserved: &HashSet<String>) -> bool {
    if symbol.contains("ANTIMATTER") {
        return false;
    }
    if symbol.starts_with("MODULE") || symbol.starts_with("MOUNT") {
        return false;
    }
    !reserved.contains(symbol)
}
