// Role strategies - a closed set of managers, each owning a group of
// bots by symbol. The scheduler holds managers in an arena and steps
// them in order every tick.

pub mod construction;
pub mod explore;
pub mod market;
pub mod mine;
pub mod pair;
pub mod trade;

pub use construction::ConstructionManager;
pub use explore::ExploreManager;
pub use market::MarketManager;
pub use mine::MineManager;
pub use pair::PairManager;
pub use trade::TradeManager;

use crate::engine::bot::Bot;
use crate::engine::context::TickCtx;
use crate::engine::step::StepOutcome;
use crate::models::Ship;
use crate::v_error;
use std::collections::HashMap;

/// Per-manager tick tally returned to the scheduler
#[derive(Debug, Default, Clone, Copy)]
pub struct ManagerReport {
    pub started: u32,
    pub failed: u32,
}

impl ManagerReport {
    pub fn record(&mut self, manager: &str, bot: &mut Bot, outcome: StepOutcome) {
        match outcome {
            StepOutcome::Idle => {}
            StepOutcome::ActionStarted => self.started += 1,
            StepOutcome::Failed(reason) => {
                v_error!("💥 [{}] {}: {}", manager, bot.ship_symbol, reason);
                bot.errors += 1;
                self.failed += 1;
            }
        }
    }
}

pub enum Manager {
    Market(MarketManager),
    Trade(TradeManager),
    Mine(MineManager),
    Construction(ConstructionManager),
    Explore(ExploreManager),
    Pair(PairManager),
}

impl Manager {
    pub fn name(&self) -> &'static str {
        match self {
            Manager::Market(_) => "market",
            Manager::Trade(_) => "trade",
            Manager::Mine(_) => "mine",
            Manager::Construction(_) => "construction",
            Manager::Explore(_) => "explore",
            Manager::Pair(_) => "pair",
        }
    }

    pub fn bots(&self) -> &[String] {
        match self {
            Manager::Market(m) => &m.bots,
            Manager::Trade(m) => &m.bots,
            Manager::Mine(m) => &m.bots,
            Manager::Construction(m) => &m.bots,
            Manager::Explore(m) => &m.bots,
            Manager::Pair(m) => &m.bots,
        }
    }

    pub fn add_bot(&mut self, symbol: String) {
        match self {
            Manager::Market(m) => m.bots.push(symbol),
            Manager::Trade(m) => m.bots.push(symbol),
            Manager::Mine(m) => m.bots.push(symbol),
            Manager::Construction(m) => m.bots.push(symbol),
            Manager::Explore(m) => m.bots.push(symbol),
            Manager::Pair(m) => m.adopt(symbol),
        }
    }

    pub fn remove_bot(&mut self, symbol: &str) {
        match self {
            Manager::Market(m) => m.bots.retain(|s| s != symbol),
            Manager::Trade(m) => m.bots.retain(|s| s != symbol),
            Manager::Mine(m) => m.bots.retain(|s| s != symbol),
            Manager::Construction(m) => m.bots.retain(|s| s != symbol),
            Manager::Explore(m) => m.bots.retain(|s| s != symbol),
            Manager::Pair(m) => m.release_member(symbol),
        }
    }

    pub fn step(&mut self, bots: &mut HashMap<String, Bot>, ctx: &mut TickCtx) -> ManagerReport {
        match self {
            Manager::Market(m) => m.step(bots, ctx),
            Manager::Trade(m) => m.step(bots, ctx),
            Manager::Mine(m) => m.step(bots, ctx),
            Manager::Construction(m) => m.step(bots, ctx),
            Manager::Explore(m) => m.step(bots, ctx),
            Manager::Pair(m) => m.step(bots, ctx),
        }
    }
}

/// Whether an agent may be stepped this tick: it must exist, have no
/// outstanding remote operation, and not be mid-transit.
pub(crate) fn schedulable<'c>(ctx: &'c TickCtx, symbol: &str) -> Option<&'c Ship> {
    if ctx.steps.is_busy(symbol) {
        return None;
    }
    let ship = ctx.ships.get(symbol)?;
    if ship.in_transit(ctx.now) {
        return None;
    }
    Some(ship)
}
