// Scheduler behavior: single-flight actions, watchdog eviction, pauses,
// halting, and manager assignment

mod common;

use common::*;
use fleet_engine::api::ApiError;
use fleet_engine::config::EngineConfig;
use fleet_engine::engine::{AutomationService, Manager};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

/// One explorer alone in its home system with a marketplace left to visit
fn lone_explorer() -> Arc<FakeApi> {
    let fake = FakeApi::new(agent("TESTER", "X1-A-HQ", 100_000));
    fake.add_ship(in_orbit(ship("EXPLORER-1", "X1-A", "X1-A-HQ")));
    fake.add_system(
        "X1-A",
        vec![
            waypoint("X1-A-HQ", "X1-A", "PLANET", 0, 0),
            with_trait(waypoint("X1-A-M1", "X1-A", "PLANET", 30, 0), "MARKETPLACE"),
        ],
    );
    fake.add_market("X1-A-M1", market("X1-A-M1", vec![market_good("FUEL", 72, 70)]));
    fake
}

#[tokio::test]
async fn busy_agents_are_never_stepped_twice() {
    let fake = lone_explorer();
    fake.hang_navigation.store(true, Ordering::SeqCst);
    let mut service = AutomationService::new(collaborators(&fake), EngineConfig::default());
    service.bootstrap().await.expect("bootstrap");

    let report = service.step().await;
    assert_eq!(report.actions_started, 1, "explorer should start moving");
    settle().await;
    assert_eq!(fake.navigate_calls.load(Ordering::SeqCst), 1);

    let report = service.step().await;
    assert_eq!(report.actions_started, 0, "agent is still busy");
    assert_eq!(
        fake.navigate_calls.load(Ordering::SeqCst),
        1,
        "one remote operation in flight per agent, never more"
    );
}

#[tokio::test]
async fn watchdog_eviction_makes_the_agent_schedulable_again() {
    let fake = lone_explorer();
    fake.hang_navigation.store(true, Ordering::SeqCst);
    let mut config = EngineConfig::default();
    config.scheduler.watchdog_seconds = 0;
    let mut service = AutomationService::new(collaborators(&fake), config);
    service.bootstrap().await.expect("bootstrap");

    service.step().await;
    settle().await;
    let report = service.step().await;
    assert_eq!(report.evicted, 1, "stale step should be force-cleared");
    settle().await;
    assert_eq!(
        fake.navigate_calls.load(Ordering::SeqCst),
        2,
        "evicted agent gets scheduled again in the same tick"
    );
}

#[tokio::test]
async fn rate_limit_pauses_all_remote_work() {
    let fake = lone_explorer();
    *fake.fail_actions.lock().unwrap() = Some(ApiError::new("rate limit exceeded"));
    let mut service = AutomationService::new(collaborators(&fake), EngineConfig::default());
    service.bootstrap().await.expect("bootstrap");

    service.step().await;
    settle().await;
    service.step().await; // drains the rate-limit error, sets the pause
    settle().await;
    let report = service.step().await;
    assert!(report.paused, "third tick should sit out the pause window");
    assert_eq!(report.actions_started, 0);
}

#[tokio::test]
async fn persistent_errors_halt_the_engine() {
    let fake = lone_explorer();
    *fake.fail_actions.lock().unwrap() = Some(ApiError::new("catastrophic failure"));
    let mut config = EngineConfig::default();
    config.scheduler.error_threshold = 3;
    let mut service = AutomationService::new(collaborators(&fake), config);
    service.bootstrap().await.expect("bootstrap");

    let mut halted = false;
    for _ in 0..10 {
        let report = service.step().await;
        settle().await;
        if report.halted {
            halted = true;
            break;
        }
    }
    assert!(halted, "error budget should trip after repeated failures");
    assert!(service.is_halted());
    let report = service.step().await;
    assert!(report.halted, "a halted engine refuses further ticks");
    assert_eq!(report.actions_started, 0);
}

fn varied_fleet() -> Arc<FakeApi> {
    let fake = FakeApi::new(agent("TESTER", "X1-A-HQ", 100_000));
    fake.add_ship(in_orbit(with_mount(
        ship("MINER-1", "X1-A", "X1-A-SITE"),
        "MOUNT_MINING_LASER_II",
    )));
    fake.add_ship(in_orbit(with_module(
        ship("HAULER-1", "X1-A", "X1-A-M1"),
        "MODULE_CARGO_HOLD_II",
    )));
    fake.add_ship(in_orbit(with_mount(
        ship("SURVEYOR-1", "X1-A", "X1-A-SITE"),
        "MOUNT_SENSOR_ARRAY_I",
    )));
    fake.add_ship(in_orbit(ship("SCOUT-1", "X1-A", "X1-A-HQ")));
    fake.add_ship(in_orbit(ship("SCOUT-2", "X1-A", "X1-A-HQ")));
    fake.add_ship(in_orbit(with_module(
        ship("REFINERY-1", "X1-A", "X1-A-M1"),
        "MODULE_ORE_REFINERY_I",
    )));
    fake.add_system(
        "X1-A",
        vec![
            waypoint("X1-A-HQ", "X1-A", "PLANET", 0, 0),
            waypoint("X1-A-SITE", "X1-A", "ENGINEERED_ASTEROID", 10, 10),
            with_trait(waypoint("X1-A-M1", "X1-A", "PLANET", 30, 0), "MARKETPLACE"),
        ],
    );
    fake.add_market("X1-A-M1", market("X1-A-M1", vec![market_good("FUEL", 72, 70)]));
    fake
}

#[tokio::test]
async fn every_bot_belongs_to_exactly_one_manager() {
    let fake = varied_fleet();
    let mut service = AutomationService::new(collaborators(&fake), EngineConfig::default());
    service.bootstrap().await.expect("bootstrap");
    service.step().await;

    for symbol in [
        "MINER-1",
        "HAULER-1",
        "SURVEYOR-1",
        "SCOUT-1",
        "SCOUT-2",
        "REFINERY-1",
    ] {
        let owners: usize = service
            .managers()
            .iter()
            .map(|m| m.bots().iter().filter(|s| s.as_str() == symbol).count())
            .sum();
        assert_eq!(owners, 1, "{} must be owned by exactly one manager", symbol);
    }
}

#[tokio::test]
async fn roles_land_with_their_expected_managers() {
    let fake = varied_fleet();
    let mut service = AutomationService::new(collaborators(&fake), EngineConfig::default());
    service.bootstrap().await.expect("bootstrap");
    service.step().await;

    assert_eq!(service.manager_name("MINER-1"), Some("mine"));
    assert_eq!(service.manager_name("HAULER-1"), Some("trade"));
    assert_eq!(
        service.manager_name("SURVEYOR-1"),
        Some("mine"),
        "no pair exists yet, so the surveyor mines"
    );
    assert_eq!(
        service.manager_name("REFINERY-1"),
        Some("trade"),
        "no construction site, refinery hauls trades"
    );

    // One scout staffs the market watch, the other explores
    let scout_managers = [
        service.manager_name("SCOUT-1").unwrap(),
        service.manager_name("SCOUT-2").unwrap(),
    ];
    assert!(scout_managers.contains(&"market"));
    assert!(scout_managers.contains(&"explore"));
}

#[tokio::test]
async fn excess_haulers_get_paired_with_a_miner() {
    let fake = FakeApi::new(agent("TESTER", "X1-A-HQ", 100_000));
    fake.add_ship(in_orbit(with_mount(
        ship("MINER-1", "X1-A", "X1-A-SITE"),
        "MOUNT_MINING_LASER_II",
    )));
    for i in 1..=4 {
        fake.add_ship(in_orbit(with_module(
            ship(&format!("HAULER-{}", i), "X1-A", "X1-A-M1"),
            "MODULE_CARGO_HOLD_II",
        )));
    }
    fake.add_system(
        "X1-A",
        vec![
            waypoint("X1-A-HQ", "X1-A", "PLANET", 0, 0),
            waypoint("X1-A-SITE", "X1-A", "ENGINEERED_ASTEROID", 10, 10),
            with_trait(waypoint("X1-A-M1", "X1-A", "PLANET", 30, 0), "MARKETPLACE"),
        ],
    );
    fake.add_market("X1-A-M1", market("X1-A-M1", vec![market_good("FUEL", 72, 70)]));

    let mut service = AutomationService::new(collaborators(&fake), EngineConfig::default());
    service.bootstrap().await.expect("bootstrap");
    service.step().await;

    assert!(
        service
            .managers()
            .iter()
            .any(|m| matches!(m, Manager::Pair(_))),
        "a pair team should have been extracted"
    );
    assert_eq!(service.manager_name("MINER-1"), Some("pair"));
    let trade_haulers = service
        .managers()
        .iter()
        .find(|m| m.name() == "trade")
        .map(|m| m.bots().len())
        .unwrap_or(0);
    assert_eq!(trade_haulers, 3, "trading keeps at most its hauler cap");
}

#[tokio::test]
async fn each_occupied_system_gets_its_own_market_watch() {
    let fake = FakeApi::new(agent("TESTER", "X1-A-HQ", 100_000));
    fake.add_ship(in_orbit(ship("SCOUT-A1", "X1-A", "X1-A-HQ")));
    fake.add_ship(in_orbit(ship("SCOUT-A2", "X1-A", "X1-A-HQ")));
    fake.add_ship(in_orbit(ship("SCOUT-B1", "X1-B", "X1-B-HQ")));
    fake.add_ship(in_orbit(with_mount(
        ship("MINER-B1", "X1-B", "X1-B-HQ"),
        "MOUNT_MINING_LASER_II",
    )));
    fake.add_system(
        "X1-A",
        vec![
            waypoint("X1-A-HQ", "X1-A", "PLANET", 0, 0),
            with_trait(waypoint("X1-A-M1", "X1-A", "PLANET", 30, 0), "MARKETPLACE"),
        ],
    );
    fake.add_system("X1-B", vec![waypoint("X1-B-HQ", "X1-B", "PLANET", 0, 0)]);
    fake.add_market("X1-A-M1", market("X1-A-M1", vec![market_good("FUEL", 72, 70)]));

    let mut service = AutomationService::new(collaborators(&fake), EngineConfig::default());
    service.bootstrap().await.expect("bootstrap");
    service.step().await;

    assert_eq!(
        service.manager_name("SCOUT-B1"),
        Some("market"),
        "a watcher in one system must not cover for another"
    );
    let a_scouts = [
        service.manager_name("SCOUT-A1"),
        service.manager_name("SCOUT-A2"),
    ];
    assert!(a_scouts.contains(&Some("market")));
    assert!(a_scouts.contains(&Some("explore")));
}

#[tokio::test]
async fn missing_system_snapshot_aborts_the_tick() {
    let fake = FakeApi::new(agent("TESTER", "X1-A-HQ", 100_000));
    fake.add_ship(in_orbit(ship("EXPLORER-1", "X1-B", "X1-B-GATE")));
    fake.add_system("X1-A", vec![waypoint("X1-A-HQ", "X1-A", "PLANET", 0, 0)]);
    // X1-B is deliberately unknown to the fake

    let mut service = AutomationService::new(collaborators(&fake), EngineConfig::default());
    service.bootstrap().await.expect("bootstrap");
    let report = service.step().await;
    assert_eq!(report.waiting_on_system.as_deref(), Some("X1-B"));
    assert_eq!(report.actions_started, 0, "no bot runs without its system");
}

#[tokio::test]
async fn first_failed_snapshot_fetch_is_budget_neutral() {
    let fake = FakeApi::new(agent("TESTER", "X1-A-HQ", 100_000));
    fake.add_ship(in_orbit(ship("EXPLORER-1", "X1-B", "X1-B-GATE")));
    fake.add_system("X1-A", vec![waypoint("X1-A-HQ", "X1-A", "PLANET", 0, 0)]);

    let mut service = AutomationService::new(collaborators(&fake), EngineConfig::default());
    service.bootstrap().await.expect("bootstrap");

    let report = service.step().await;
    assert_eq!(report.waiting_on_system.as_deref(), Some("X1-B"));
    assert_eq!(service.error_counter(), 0, "one flaky fetch costs nothing");

    service.step().await;
    assert!(
        service.error_counter() > 0,
        "repeat fetch failures count against the budget"
    );
}

#[tokio::test]
async fn market_visit_caches_price_data() {
    let fake = FakeApi::new(agent("TESTER", "X1-A-HQ", 100_000));
    fake.add_ship(in_orbit(ship("EXPLORER-1", "X1-A", "X1-A-M1")));
    fake.add_system(
        "X1-A",
        vec![
            waypoint("X1-A-HQ", "X1-A", "PLANET", 0, 0),
            with_trait(waypoint("X1-A-M1", "X1-A", "PLANET", 30, 0), "MARKETPLACE"),
        ],
    );
    fake.add_market(
        "X1-A-M1",
        market("X1-A-M1", vec![market_good("IRON_ORE", 30, 40)]),
    );

    let mut service = AutomationService::new(collaborators(&fake), EngineConfig::default());
    service.bootstrap().await.expect("bootstrap");
    service.step().await; // explorer reads prices where it stands
    settle().await;
    service.step().await; // completion lands
    assert!(
        service.world().markets.contains_key("X1-A-M1"),
        "price snapshot should be cached after the visit"
    );
    assert_eq!(service.world().sell_price("X1-A-M1", "IRON_ORE"), Some(40));
}
