// Shared test fixtures: in-memory fakes for every remote capability plus
// builders for ships, waypoints, and market data.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use fleet_engine::api::*;
use fleet_engine::models::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub struct FakeApi {
    pub agent: Mutex<AgentInfo>,
    pub ships: Mutex<HashMap<String, Ship>>,
    pub waypoints: Mutex<HashMap<String, Vec<Waypoint>>>,
    pub markets: Mutex<HashMap<String, MarketData>>,
    pub contracts: Mutex<Vec<Contract>>,
    pub construction: Mutex<Option<ConstructionSite>>,
    pub gate_connections: Mutex<HashMap<String, Vec<String>>>,
    pub navigate_calls: AtomicUsize,
    pub dock_calls: AtomicUsize,
    pub orbit_calls: AtomicUsize,
    pub purchase_calls: AtomicUsize,
    pub sell_calls: AtomicUsize,
    pub extract_calls: AtomicUsize,
    /// Navigation futures never resolve while set
    pub hang_navigation: AtomicBool,
    /// Every ship action fails with this error while set
    pub fail_actions: Mutex<Option<ApiError>>,
}

impl FakeApi {
    pub fn new(agent: AgentInfo) -> Arc<Self> {
        Arc::new(Self {
            agent: Mutex::new(agent),
            ships: Mutex::new(HashMap::new()),
            waypoints: Mutex::new(HashMap::new()),
            markets: Mutex::new(HashMap::new()),
            contracts: Mutex::new(Vec::new()),
            construction: Mutex::new(None),
            gate_connections: Mutex::new(HashMap::new()),
            navigate_calls: AtomicUsize::new(0),
            dock_calls: AtomicUsize::new(0),
            orbit_calls: AtomicUsize::new(0),
            purchase_calls: AtomicUsize::new(0),
            sell_calls: AtomicUsize::new(0),
            extract_calls: AtomicUsize::new(0),
            hang_navigation: AtomicBool::new(false),
            fail_actions: Mutex::new(None),
        })
    }

    pub fn add_ship(&self, ship: Ship) {
        self.ships.lock().unwrap().insert(ship.symbol.clone(), ship);
    }

    pub fn add_system(&self, system: &str, waypoints: Vec<Waypoint>) {
        self.waypoints
            .lock()
            .unwrap()
            .insert(system.to_string(), waypoints);
    }

    pub fn add_market(&self, waypoint: &str, market: MarketData) {
        self.markets
            .lock()
            .unwrap()
            .insert(waypoint.to_string(), market);
    }

    fn action_gate(&self) -> ApiResult<()> {
        match self.fail_actions.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn ship_nav(&self, symbol: &str) -> ApiResult<ShipNav> {
        self.ships
            .lock()
            .unwrap()
            .get(symbol)
            .map(|s| s.nav.clone())
            .ok_or_else(|| ApiError::new(format!("unknown ship {}", symbol)))
    }
}

pub fn collaborators(fake: &Arc<FakeApi>) -> Collaborators {
    Collaborators {
        fleet: fake.clone(),
        galaxy: fake.clone(),
        markets: fake.clone(),
        shipyards: fake.clone(),
        jump_gates: fake.clone(),
        contracts: fake.clone(),
        construction: fake.clone(),
    }
}

#[async_trait]
impl FleetApi for FakeApi {
    async fn agent(&self) -> ApiResult<AgentInfo> {
        Ok(self.agent.lock().unwrap().clone())
    }

    async fn list_ships(&self) -> ApiResult<Vec<Ship>> {
        let mut ships: Vec<Ship> = self.ships.lock().unwrap().values().cloned().collect();
        ships.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(ships)
    }

    async fn get_ship(&self, ship: &str) -> ApiResult<Ship> {
        self.ships
            .lock()
            .unwrap()
            .get(ship)
            .cloned()
            .ok_or_else(|| ApiError::new(format!("unknown ship {}", ship)))
    }

    async fn orbit(&self, ship: &str) -> ApiResult<ShipNav> {
        self.action_gate()?;
        self.orbit_calls.fetch_add(1, Ordering::SeqCst);
        let mut ships = self.ships.lock().unwrap();
        let entry = ships
            .get_mut(ship)
            .ok_or_else(|| ApiError::new(format!("unknown ship {}", ship)))?;
        entry.nav.status = NavStatus::InOrbit;
        Ok(entry.nav.clone())
    }

    async fn dock(&self, ship: &str) -> ApiResult<ShipNav> {
        self.action_gate()?;
        self.dock_calls.fetch_add(1, Ordering::SeqCst);
        let mut ships = self.ships.lock().unwrap();
        let entry = ships
            .get_mut(ship)
            .ok_or_else(|| ApiError::new(format!("unknown ship {}", ship)))?;
        entry.nav.status = NavStatus::Docked;
        Ok(entry.nav.clone())
    }

    async fn set_flight_mode(&self, ship: &str, mode: FlightMode) -> ApiResult<ShipNav> {
        self.action_gate()?;
        let mut ships = self.ships.lock().unwrap();
        let entry = ships
            .get_mut(ship)
            .ok_or_else(|| ApiError::new(format!("unknown ship {}", ship)))?;
        entry.nav.flight_mode = mode;
        Ok(entry.nav.clone())
    }

    async fn navigate(&self, ship: &str, waypoint: &str) -> ApiResult<NavigationData> {
        self.action_gate()?;
        self.navigate_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_navigation.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let mut ships = self.ships.lock().unwrap();
        let entry = ships
            .get_mut(ship)
            .ok_or_else(|| ApiError::new(format!("unknown ship {}", ship)))?;
        entry.nav.waypoint_symbol = waypoint.to_string();
        entry.nav.status = NavStatus::InOrbit;
        entry.nav.route.destination.symbol = waypoint.to_string();
        entry.nav.route.arrival = Utc::now() - Duration::seconds(1);
        entry.fuel.current = (entry.fuel.current - 10).max(0);
        Ok(NavigationData {
            nav: entry.nav.clone(),
            fuel: entry.fuel.clone(),
        })
    }

    async fn jump(&self, ship: &str, gate_waypoint: &str) -> ApiResult<JumpData> {
        self.action_gate()?;
        let mut ships = self.ships.lock().unwrap();
        let entry = ships
            .get_mut(ship)
            .ok_or_else(|| ApiError::new(format!("unknown ship {}", ship)))?;
        entry.nav.waypoint_symbol = gate_waypoint.to_string();
        entry.nav.system_symbol = system_symbol_of(gate_waypoint);
        entry.nav.status = NavStatus::InOrbit;
        entry.cooldown = cooldown(ship, 60);
        Ok(JumpData {
            nav: entry.nav.clone(),
            cooldown: entry.cooldown.clone(),
        })
    }

    async fn extract(&self, ship: &str, _survey: Option<Survey>) -> ApiResult<ExtractionData> {
        self.action_gate()?;
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        let mut ships = self.ships.lock().unwrap();
        let entry = ships
            .get_mut(ship)
            .ok_or_else(|| ApiError::new(format!("unknown ship {}", ship)))?;
        add_cargo(&mut entry.cargo, "IRON_ORE", 5);
        entry.cooldown = cooldown(ship, 70);
        Ok(ExtractionData {
            cargo: entry.cargo.clone(),
            cooldown: entry.cooldown.clone(),
            extracted: ExtractionYield {
                symbol: "IRON_ORE".to_string(),
                units: 5,
            },
        })
    }

    async fn siphon(&self, ship: &str) -> ApiResult<ExtractionData> {
        self.extract(ship, None).await
    }

    async fn survey(&self, ship: &str) -> ApiResult<SurveyData> {
        self.action_gate()?;
        let mut ships = self.ships.lock().unwrap();
        let entry = ships
            .get_mut(ship)
            .ok_or_else(|| ApiError::new(format!("unknown ship {}", ship)))?;
        entry.cooldown = cooldown(ship, 70);
        Ok(SurveyData {
            surveys: vec![survey(
                "SIG-FAKE",
                &entry.nav.waypoint_symbol,
                &["IRON_ORE"],
                30,
            )],
            cooldown: entry.cooldown.clone(),
        })
    }

    async fn refuel(&self, ship: &str) -> ApiResult<RefuelData> {
        self.action_gate()?;
        let mut ships = self.ships.lock().unwrap();
        let entry = ships
            .get_mut(ship)
            .ok_or_else(|| ApiError::new(format!("unknown ship {}", ship)))?;
        entry.fuel.current = entry.fuel.capacity;
        let credits = self.agent.lock().unwrap().credits;
        Ok(RefuelData {
            fuel: entry.fuel.clone(),
            transaction: transaction(ship, &entry.nav.waypoint_symbol, "FUEL", 1, 72),
            credits,
        })
    }

    async fn purchase_cargo(&self, ship: &str, good: &str, units: i32) -> ApiResult<TradeData> {
        self.action_gate()?;
        self.purchase_calls.fetch_add(1, Ordering::SeqCst);
        let mut ships = self.ships.lock().unwrap();
        let entry = ships
            .get_mut(ship)
            .ok_or_else(|| ApiError::new(format!("unknown ship {}", ship)))?;
        add_cargo(&mut entry.cargo, good, units);
        let mut agent = self.agent.lock().unwrap();
        agent.credits -= (units as i64) * 10;
        Ok(TradeData {
            cargo: entry.cargo.clone(),
            transaction: transaction(ship, &entry.nav.waypoint_symbol, good, units, 10),
            credits: agent.credits,
        })
    }

    async fn sell_cargo(&self, ship: &str, good: &str, units: i32) -> ApiResult<TradeData> {
        self.action_gate()?;
        self.sell_calls.fetch_add(1, Ordering::SeqCst);
        let mut ships = self.ships.lock().unwrap();
        let entry = ships
            .get_mut(ship)
            .ok_or_else(|| ApiError::new(format!("unknown ship {}", ship)))?;
        remove_cargo(&mut entry.cargo, good, units);
        let mut agent = self.agent.lock().unwrap();
        agent.credits += (units as i64) * 20;
        Ok(TradeData {
            cargo: entry.cargo.clone(),
            transaction: transaction(ship, &entry.nav.waypoint_symbol, good, units, 20),
            credits: agent.credits,
        })
    }

    async fn transfer_cargo(
        &self,
        from: &str,
        to: &str,
        good: &str,
        units: i32,
    ) -> ApiResult<ShipCargo> {
        self.action_gate()?;
        let mut ships = self.ships.lock().unwrap();
        {
            let target = ships
                .get_mut(to)
                .ok_or_else(|| ApiError::new(format!("unknown ship {}", to)))?;
            add_cargo(&mut target.cargo, good, units);
        }
        let source = ships
            .get_mut(from)
            .ok_or_else(|| ApiError::new(format!("unknown ship {}", from)))?;
        remove_cargo(&mut source.cargo, good, units);
        Ok(source.cargo.clone())
    }

    async fn jettison(&self, ship: &str, good: &str, units: i32) -> ApiResult<ShipCargo> {
        self.action_gate()?;
        let mut ships = self.ships.lock().unwrap();
        let entry = ships
            .get_mut(ship)
            .ok_or_else(|| ApiError::new(format!("unknown ship {}", ship)))?;
        remove_cargo(&mut entry.cargo, good, units);
        Ok(entry.cargo.clone())
    }

    async fn chart(&self, ship: &str) -> ApiResult<ChartData> {
        self.action_gate()?;
        let nav = self.ship_nav(ship)?;
        let waypoints = self.waypoints.lock().unwrap();
        let mut waypoint = waypoints
            .get(&nav.system_symbol)
            .and_then(|list| list.iter().find(|w| w.symbol == nav.waypoint_symbol))
            .cloned()
            .ok_or_else(|| ApiError::new("waypoint not found"))?;
        waypoint.chart = Some(Chart {
            submitted_by: Some(ship.to_string()),
            submitted_on: None,
        });
        waypoint.traits.retain(|t| t.symbol != "UNCHARTED");
        Ok(ChartData { waypoint })
    }

    async fn negotiate_contract(&self, _ship: &str) -> ApiResult<Contract> {
        self.contracts
            .lock()
            .unwrap()
            .first()
            .cloned()
            .ok_or_else(|| ApiError::new("no contract available"))
    }
}

#[async_trait]
impl GalaxyApi for FakeApi {
    async fn system_waypoints(&self, system: &str) -> ApiResult<Vec<Waypoint>> {
        self.waypoints
            .lock()
            .unwrap()
            .get(system)
            .cloned()
            .ok_or_else(|| ApiError::new(format!("unknown system {}", system)))
    }

    async fn reconcile(&self) -> ApiResult<Vec<System>> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl MarketApi for FakeApi {
    async fn market(&self, _system: &str, waypoint: &str) -> ApiResult<MarketData> {
        self.markets
            .lock()
            .unwrap()
            .get(waypoint)
            .cloned()
            .ok_or_else(|| ApiError::new(format!("no market at {}", waypoint)))
    }
}

#[async_trait]
impl ShipyardApi for FakeApi {
    async fn shipyard(&self, _system: &str, waypoint: &str) -> ApiResult<Shipyard> {
        Ok(Shipyard {
            symbol: waypoint.to_string(),
            ship_types: Vec::new(),
        })
    }
}

#[async_trait]
impl JumpGateApi for FakeApi {
    async fn connections(&self, _system: &str, waypoint: &str) -> ApiResult<Vec<String>> {
        self.gate_connections
            .lock()
            .unwrap()
            .get(waypoint)
            .cloned()
            .ok_or_else(|| ApiError::new(format!("gate {} not found", waypoint)))
    }
}

#[async_trait]
impl ContractApi for FakeApi {
    async fn list(&self) -> ApiResult<Vec<Contract>> {
        Ok(self.contracts.lock().unwrap().clone())
    }

    async fn accept(&self, contract_id: &str) -> ApiResult<Contract> {
        let mut contracts = self.contracts.lock().unwrap();
        let contract = contracts
            .iter_mut()
            .find(|c| c.id == contract_id)
            .ok_or_else(|| ApiError::new(format!("unknown contract {}", contract_id)))?;
        contract.accepted = true;
        Ok(contract.clone())
    }

    async fn deliver(
        &self,
        ship: &str,
        contract_id: &str,
        good: &str,
        units: i32,
    ) -> ApiResult<DeliveryData> {
        let cargo = {
            let mut ships = self.ships.lock().unwrap();
            let entry = ships
                .get_mut(ship)
                .ok_or_else(|| ApiError::new(format!("unknown ship {}", ship)))?;
            remove_cargo(&mut entry.cargo, good, units);
            entry.cargo.clone()
        };
        let mut contracts = self.contracts.lock().unwrap();
        let contract = contracts
            .iter_mut()
            .find(|c| c.id == contract_id)
            .ok_or_else(|| ApiError::new(format!("unknown contract {}", contract_id)))?;
        for delivery in contract.terms.deliver.iter_mut() {
            if delivery.trade_symbol == good {
                delivery.units_fulfilled += units;
            }
        }
        Ok(DeliveryData {
            contract: contract.clone(),
            cargo,
        })
    }

    async fn fulfill(&self, contract_id: &str) -> ApiResult<Contract> {
        let mut contracts = self.contracts.lock().unwrap();
        let contract = contracts
            .iter_mut()
            .find(|c| c.id == contract_id)
            .ok_or_else(|| ApiError::new(format!("unknown contract {}", contract_id)))?;
        contract.fulfilled = true;
        Ok(contract.clone())
    }
}

#[async_trait]
impl ConstructionApi for FakeApi {
    async fn site(&self, _system: &str, waypoint: &str) -> ApiResult<ConstructionSite> {
        self.construction
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ApiError::new(format!("no construction at {}", waypoint)))
    }

    async fn supply(
        &self,
        ship: &str,
        _waypoint: &str,
        good: &str,
        units: i32,
    ) -> ApiResult<ConstructionSupplyData> {
        let cargo = {
            let mut ships = self.ships.lock().unwrap();
            let entry = ships
                .get_mut(ship)
                .ok_or_else(|| ApiError::new(format!("unknown ship {}", ship)))?;
            remove_cargo(&mut entry.cargo, good, units);
            entry.cargo.clone()
        };
        let mut slot = self.construction.lock().unwrap();
        let site = slot
            .as_mut()
            .ok_or_else(|| ApiError::new("no construction site"))?;
        for material in site.materials.iter_mut() {
            if material.trade_symbol == good {
                material.fulfilled += units;
            }
        }
        Ok(ConstructionSupplyData {
            construction: site.clone(),
            cargo,
        })
    }
}

// ---- builders -------------------------------------------------------------

pub fn agent(symbol: &str, headquarters: &str, credits: i64) -> AgentInfo {
    AgentInfo {
        symbol: symbol.to_string(),
        headquarters: headquarters.to_string(),
        credits,
        ship_count: 0,
    }
}

pub fn ship(symbol: &str, system: &str, waypoint: &str) -> Ship {
    Ship {
        symbol: symbol.to_string(),
        registration: ShipRegistration {
            name: symbol.to_string(),
            role: "COMMAND".to_string(),
        },
        nav: nav(system, waypoint),
        frame: ShipFrame {
            symbol: "FRAME_FRIGATE".to_string(),
            module_slots: 5,
            mounting_points: 3,
            fuel_capacity: 400,
        },
        cooldown: cooldown(symbol, 0),
        modules: Vec::new(),
        mounts: Vec::new(),
        cargo: ShipCargo {
            capacity: 40,
            units: 0,
            inventory: Vec::new(),
        },
        fuel: ShipFuel {
            current: 400,
            capacity: 400,
        },
    }
}

pub fn nav(system: &str, waypoint: &str) -> ShipNav {
    let point = ShipRouteWaypoint {
        symbol: waypoint.to_string(),
        system_symbol: system.to_string(),
        x: 0,
        y: 0,
    };
    ShipNav {
        system_symbol: system.to_string(),
        waypoint_symbol: waypoint.to_string(),
        route: ShipRoute {
            origin: point.clone(),
            destination: point,
            departure_time: Utc::now() - Duration::minutes(5),
            arrival: Utc::now() - Duration::minutes(1),
        },
        status: NavStatus::Docked,
        flight_mode: FlightMode::Cruise,
    }
}

pub fn cooldown(ship: &str, remaining: i64) -> ShipCooldown {
    ShipCooldown {
        ship_symbol: ship.to_string(),
        total_seconds: remaining,
        remaining_seconds: remaining,
        expiration: if remaining > 0 {
            Some(Utc::now() + Duration::seconds(remaining))
        } else {
            None
        },
    }
}

pub fn with_mount(mut ship: Ship, mount: &str) -> Ship {
    ship.mounts.push(ShipMount {
        symbol: mount.to_string(),
        strength: Some(10),
        deposits: None,
    });
    ship
}

pub fn with_module(mut ship: Ship, module: &str) -> Ship {
    ship.modules.push(ShipModule {
        symbol: module.to_string(),
        capacity: None,
    });
    ship
}

pub fn with_cargo(mut ship: Ship, good: &str, units: i32) -> Ship {
    add_cargo(&mut ship.cargo, good, units);
    ship
}

pub fn in_orbit(mut ship: Ship) -> Ship {
    ship.nav.status = NavStatus::InOrbit;
    ship
}

pub fn waypoint(symbol: &str, system: &str, waypoint_type: &str, x: i32, y: i32) -> Waypoint {
    Waypoint {
        symbol: symbol.to_string(),
        waypoint_type: waypoint_type.to_string(),
        system_symbol: system.to_string(),
        x,
        y,
        traits: Vec::new(),
        chart: Some(Chart {
            submitted_by: None,
            submitted_on: None,
        }),
        is_under_construction: false,
    }
}

pub fn with_trait(mut waypoint: Waypoint, symbol: &str) -> Waypoint {
    waypoint.traits.push(Trait {
        symbol: symbol.to_string(),
    });
    waypoint
}

pub fn uncharted(mut waypoint: Waypoint) -> Waypoint {
    waypoint.chart = None;
    waypoint
}

pub fn market_good(symbol: &str, purchase: i32, sell: i32) -> MarketTradeGood {
    MarketTradeGood {
        symbol: symbol.to_string(),
        trade_volume: 60,
        supply: "MODERATE".to_string(),
        purchase_price: purchase,
        sell_price: sell,
    }
}

pub fn market(symbol: &str, goods: Vec<MarketTradeGood>) -> MarketData {
    MarketData {
        symbol: symbol.to_string(),
        exports: Vec::new(),
        imports: Vec::new(),
        exchange: Vec::new(),
        trade_goods: goods,
    }
}

pub fn survey(signature: &str, site: &str, deposits: &[&str], fresh_minutes: i64) -> Survey {
    Survey {
        signature: signature.to_string(),
        symbol: site.to_string(),
        deposits: deposits
            .iter()
            .map(|d| SurveyDeposit {
                symbol: d.to_string(),
            })
            .collect(),
        expiration: Utc::now() + Duration::minutes(fresh_minutes),
        size: "MODERATE".to_string(),
    }
}

pub fn contract(id: &str, good: &str, destination: &str, required: i32) -> Contract {
    Contract {
        id: id.to_string(),
        faction_symbol: "COSMIC".to_string(),
        contract_type: "PROCUREMENT".to_string(),
        terms: ContractTerms {
            payment: ContractPayment {
                on_accepted: 10_000,
                on_fulfilled: 50_000,
            },
            deliver: vec![DeliveryItem {
                trade_symbol: good.to_string(),
                destination_symbol: destination.to_string(),
                units_required: required,
                units_fulfilled: 0,
            }],
        },
        accepted: false,
        fulfilled: false,
    }
}

fn transaction(
    ship: &str,
    waypoint: &str,
    good: &str,
    units: i32,
    price: i32,
) -> MarketTransaction {
    MarketTransaction {
        waypoint_symbol: waypoint.to_string(),
        ship_symbol: ship.to_string(),
        trade_symbol: good.to_string(),
        units,
        price_per_unit: price,
        total_price: price * units,
    }
}

pub fn add_cargo(cargo: &mut ShipCargo, good: &str, units: i32) {
    cargo.units += units;
    match cargo.inventory.iter_mut().find(|i| i.symbol == good) {
        Some(item) => item.units += units,
        None => cargo.inventory.push(CargoItem {
            symbol: good.to_string(),
            units,
        }),
    }
}

pub fn remove_cargo(cargo: &mut ShipCargo, good: &str, units: i32) {
    if let Some(item) = cargo.inventory.iter_mut().find(|i| i.symbol == good) {
        let taken = units.min(item.units);
        item.units -= taken;
        cargo.units -= taken;
    }
    cargo.inventory.retain(|i| i.units > 0);
}
