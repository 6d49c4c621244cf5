// Pair team coordination: when a collecting hauler keeps waiting and when
// it gives up on its miner

mod common;

use chrono::Utc;
use common::*;
use fleet_engine::config::EngineConfig;
use fleet_engine::engine::context::{MarketSnapshot, SystemView, TickCtx, WorldContext};
use fleet_engine::engine::managers::PairManager;
use fleet_engine::engine::{Bot, Role, StepTracker, TradeRoute, TradeRouteState};
use fleet_engine::models::FlightMode;
use std::collections::HashMap;

const HQ: &str = "X1-A-HQ";
const SITE: &str = "X1-A-SITE";
const SELL: &str = "X1-A-SELL";

fn pair_world() -> WorldContext {
    let view = SystemView::new(vec![
        waypoint(HQ, "X1-A", "PLANET", 0, 0),
        waypoint(SITE, "X1-A", "ENGINEERED_ASTEROID", 10, 10),
        with_trait(waypoint(SELL, "X1-A", "PLANET", 30, 0), "MARKETPLACE"),
    ]);
    let mut world = WorldContext::new("X1-A".to_string());
    world.systems.insert("X1-A".to_string(), view);
    world.markets.insert(
        SELL.to_string(),
        MarketSnapshot {
            market: market(
                SELL,
                vec![market_good("IRON_ORE", 70, 60), market_good("FUEL", 72, 70)],
            ),
            fetched_at: Utc::now(),
        },
    );
    world.credits = 100_000;
    world
}

fn collecting_route() -> TradeRoute {
    let mut route = TradeRoute::collection(
        "IRON_ORE".to_string(),
        SITE.to_string(),
        SELL.to_string(),
        60,
        FlightMode::Cruise,
    );
    route.state = TradeRouteState::Collect;
    route
}

fn pair_fixture(
    miner_waypoint: &str,
) -> (
    fleet_engine::api::Collaborators,
    HashMap<String, fleet_engine::models::Ship>,
    HashMap<String, Bot>,
) {
    let fake = FakeApi::new(agent("TESTER", HQ, 100_000));
    let hauler = with_cargo(in_orbit(ship("HAULER-1", "X1-A", SITE)), "IRON_ORE", 10);
    let miner = in_orbit(with_mount(
        ship("MINER-1", "X1-A", miner_waypoint),
        "MOUNT_MINING_LASER_II",
    ));
    fake.add_ship(hauler.clone());
    fake.add_ship(miner.clone());
    let api = collaborators(&fake);

    let mut ships = HashMap::new();
    ships.insert(hauler.symbol.clone(), hauler);
    ships.insert(miner.symbol.clone(), miner);

    let mut bots = HashMap::new();
    let mut hauler_bot = Bot::new("HAULER-1".to_string(), Role::Hauler);
    hauler_bot.trade_route = Some(collecting_route());
    bots.insert("HAULER-1".to_string(), hauler_bot);
    bots.insert(
        "MINER-1".to_string(),
        Bot::new("MINER-1".to_string(), Role::Miner),
    );
    (api, ships, bots)
}

#[tokio::test]
async fn hauler_keeps_collecting_while_its_miner_works_the_site() {
    let (api, mut ships, mut bots) = pair_fixture(SITE);
    let mut world = pair_world();
    let mut steps = StepTracker::new();
    let config = EngineConfig::default();
    let mut manager = PairManager::new("MINER-1".to_string(), "HAULER-1".to_string());

    let mut ctx = TickCtx {
        ships: &mut ships,
        world: &mut world,
        api: &api,
        steps: &mut steps,
        config: &config,
        now: Utc::now(),
    };
    manager.step(&mut bots, &mut ctx);

    let route = bots
        .get("HAULER-1")
        .and_then(|b| b.trade_route.as_ref())
        .expect("route survives the tick");
    assert_eq!(
        route.state,
        TradeRouteState::Collect,
        "hold position while the miner is still digging"
    );
}

#[tokio::test]
async fn hauler_releases_when_its_miner_settles_elsewhere() {
    let (api, mut ships, mut bots) = pair_fixture(HQ);
    let mut world = pair_world();
    let mut steps = StepTracker::new();
    let config = EngineConfig::default();
    let mut manager = PairManager::new("MINER-1".to_string(), "HAULER-1".to_string());

    let mut ctx = TickCtx {
        ships: &mut ships,
        world: &mut world,
        api: &api,
        steps: &mut steps,
        config: &config,
        now: Utc::now(),
    };
    manager.step(&mut bots, &mut ctx);

    let route = bots
        .get("HAULER-1")
        .and_then(|b| b.trade_route.as_ref())
        .expect("route survives the tick");
    assert_eq!(
        route.state,
        TradeRouteState::GoSell,
        "partial load heads to market once no filler remains at the site"
    );
}
