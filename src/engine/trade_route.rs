// Trade route state machine - one route per hauling bot, advanced a few
// transitions per tick so a single agent can never monopolize the scheduler

use crate::engine::bot::Bot;
use crate::engine::context::TickCtx;
use crate::engine::step::StepOutcome;
use crate::models::FlightMode;
use crate::{v_debug, v_info};

/// Transitions processed per route per tick before yielding
const MAX_TRANSITIONS_PER_TICK: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeRouteState {
    /// Traveling to the purchase (or rendezvous) waypoint
    GoBuy,
    /// Docked at the purchase waypoint, filling the hold
    Buy,
    /// Holding at a rendezvous point while miners transfer cargo over
    Collect,
    /// Traveling to the sale waypoint
    GoSell,
    /// Docked at the sale waypoint, delivering and selling off
    Sell,
}

/// Where the cargo ultimately goes instead of the open market
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryTarget {
    Contract { id: String },
    Construction { waypoint: String },
}

#[derive(Debug, Clone)]
pub struct TradeRoute {
    pub state: TradeRouteState,
    pub good: String,
    pub buy_waypoint: String,
    pub sell_waypoint: String,
    pub purchase_price: i32,
    pub sell_price: i32,
    pub expected_profit: i32,
    pub flight_mode: FlightMode,
    /// Cargo arrives by transfer from paired miners rather than purchase
    pub rendezvous: bool,
    pub deliver_to: Option<DeliveryTarget>,
    /// Set once the route has run to completion or been abandoned
    pub complete: bool,
}

/// What one transition of the state machine decided to do
enum Decision {
    Transition(TradeRouteState),
    Navigate(String),
    Buy(i32),
    Sell(i32),
    DeliverContract { id: String, units: i32 },
    SupplyConstruction { site: String, units: i32 },
    Wait,
    Discard(String),
    Complete,
}

impl TradeRoute {
    /// A market-to-market (or market-to-goal) purchase route
    pub fn purchase(
        good: String,
        buy_waypoint: String,
        sell_waypoint: String,
        purchase_price: i32,
        sell_price: i32,
        flight_mode: FlightMode,
        deliver_to: Option<DeliveryTarget>,
    ) -> Self {
        Self {
            state: TradeRouteState::GoBuy,
            expected_profit: sell_price - purchase_price,
            good,
            buy_waypoint,
            sell_waypoint,
            purchase_price,
            sell_price,
            flight_mode,
            rendezvous: false,
            deliver_to,
            complete: false,
        }
    }

    /// A rendezvous route: hold at a mining site while paired miners
    /// transfer ore over, then haul it to the sale waypoint.
    pub fn collection(
        good: String,
        rendezvous_waypoint: String,
        sell_waypoint: String,
        sell_price: i32,
        flight_mode: FlightMode,
    ) -> Self {
        Self {
            state: TradeRouteState::GoBuy,
            good,
            buy_waypoint: rendezvous_waypoint,
            sell_waypoint,
            purchase_price: 0,
            sell_price,
            expected_profit: sell_price,
            flight_mode,
            rendezvous: true,
            deliver_to: None,
            complete: false,
        }
    }

    /// A sell-only route for cargo already in the hold
    pub fn sell_off(
        good: String,
        sell_waypoint: String,
        sell_price: i32,
        flight_mode: FlightMode,
    ) -> Self {
        Self {
            state: TradeRouteState::GoSell,
            buy_waypoint: sell_waypoint.clone(),
            good,
            sell_waypoint,
            purchase_price: 0,
            sell_price,
            expected_profit: sell_price,
            flight_mode,
            rendezvous: false,
            deliver_to: None,
            complete: false,
        }
    }

    /// Whether the hauler is currently holding for miner transfers
    pub fn collecting(&self) -> bool {
        self.state == TradeRouteState::Collect
    }

    /// Release a collecting hauler toward its sale waypoint even if the
    /// hold is not full (used when its paired miners go quiet).
    pub fn release(&mut self) {
        if self.state == TradeRouteState::Collect {
            self.state = TradeRouteState::GoSell;
        }
    }

    /// Advance the route. At most a handful of internal transitions run
    /// per call, and at most one remote operation is issued.
    pub fn execute(&mut self, bot: &Bot, ctx: &mut TickCtx) -> StepOutcome {
        for _ in 0..MAX_TRANSITIONS_PER_TICK {
            let decision = self.decide(bot, ctx);
            match decision {
                Decision::Transition(next) => {
                    v_debug!(
                        "🔀 {} route {} -> {:?}",
                        bot.ship_symbol,
                        self.good,
                        next
                    );
                    self.state = next;
                }
                Decision::Navigate(waypoint) => {
                    return bot.navigate_to(ctx, &waypoint, Some(self.flight_mode));
                }
                Decision::Buy(units) => return bot.buy(ctx, &self.good, units),
                Decision::Sell(units) => return bot.sell(ctx, &self.good, units),
                Decision::DeliverContract { id, units } => {
                    return bot.deliver_contract(ctx, &id, &self.good, units);
                }
                Decision::SupplyConstruction { site, units } => {
                    return bot.supply_construction(ctx, &site, &self.good, units);
                }
                Decision::Wait => return StepOutcome::Idle,
                Decision::Discard(reason) => {
                    v_info!(
                        "🗑️ {} abandoning {} route: {}",
                        bot.ship_symbol,
                        self.good,
                        reason
                    );
                    self.complete = true;
                    return StepOutcome::Idle;
                }
                Decision::Complete => {
                    v_info!(
                        "✅ {} finished {} route ({} -> {})",
                        bot.ship_symbol,
                        self.good,
                        self.buy_waypoint,
                        self.sell_waypoint
                    );
                    self.complete = true;
                    return StepOutcome::Idle;
                }
            }
        }
        StepOutcome::Idle
    }

    fn decide(&self, bot: &Bot, ctx: &TickCtx) -> Decision {
        let Some(ship) = ctx.ships.get(&bot.ship_symbol) else {
            return Decision::Discard(format!("no state for ship {}", bot.ship_symbol));
        };

        match self.state {
            TradeRouteState::GoBuy => {
                if ship.nav.waypoint_symbol == self.buy_waypoint {
                    if self.rendezvous {
                        Decision::Transition(TradeRouteState::Collect)
                    } else {
                        Decision::Transition(TradeRouteState::Buy)
                    }
                } else {
                    Decision::Navigate(self.buy_waypoint.clone())
                }
            }
            TradeRouteState::Buy => {
                let held = ship.cargo.units_of(&self.good);
                let space = ship.cargo.space_remaining();
                if space <= 0 {
                    return if held > 0 {
                        Decision::Transition(TradeRouteState::GoSell)
                    } else {
                        Decision::Discard("hold full of other cargo".to_string())
                    };
                }
                // Arbitrage routes stop buying once the spread collapses;
                // delivery routes are paid by the goal, not the spread
                if self.deliver_to.is_none() && !self.rendezvous {
                    let current = ctx
                        .world
                        .purchase_price(&self.buy_waypoint, &self.good)
                        .unwrap_or(self.purchase_price);
                    if current >= self.sell_price {
                        return if held > 0 {
                            Decision::Transition(TradeRouteState::GoSell)
                        } else {
                            Decision::Discard(format!(
                                "{} costs {} against a {} sale",
                                self.good, current, self.sell_price
                            ))
                        };
                    }
                }
                let mut units = space;
                if self.purchase_price > 0 {
                    let spendable = ctx.world.credits - ctx.config.trading.credit_reserve;
                    let affordable = (spendable / self.purchase_price as i64)
                        .clamp(0, i32::MAX as i64) as i32;
                    units = units.min(affordable);
                }
                if let Some(good) = ctx
                    .world
                    .market_snapshot(&self.buy_waypoint)
                    .and_then(|snap| snap.market.good(&self.good))
                {
                    units = units.min(good.trade_volume);
                }
                if units <= 0 {
                    if held > 0 {
                        Decision::Transition(TradeRouteState::GoSell)
                    } else {
                        Decision::Discard("cannot afford a single unit".to_string())
                    }
                } else {
                    Decision::Buy(units)
                }
            }
            TradeRouteState::Collect => {
                if ship.cargo.space_remaining() <= 0 {
                    Decision::Transition(TradeRouteState::GoSell)
                } else {
                    Decision::Wait
                }
            }
            TradeRouteState::GoSell => {
                if ship.cargo.units_of(&self.good) <= 0 {
                    return Decision::Discard("nothing acquired to haul".to_string());
                }
                if ship.nav.waypoint_symbol == self.sell_waypoint {
                    Decision::Transition(TradeRouteState::Sell)
                } else {
                    Decision::Navigate(self.sell_waypoint.clone())
                }
            }
            TradeRouteState::Sell => {
                let held = ship.cargo.units_of(&self.good);
                if held <= 0 {
                    return Decision::Complete;
                }
                match &self.deliver_to {
                    Some(DeliveryTarget::Contract { id }) => {
                        let remaining = ctx
                            .world
                            .contract
                            .as_ref()
                            .filter(|c| c.id == *id)
                            .and_then(|c| {
                                c.terms
                                    .deliver
                                    .iter()
                                    .find(|d| d.trade_symbol == self.good)
                            })
                            .map(|d| d.units_remaining())
                            .unwrap_or(0);
                        if remaining > 0 {
                            Decision::DeliverContract {
                                id: id.clone(),
                                units: held.min(remaining),
                            }
                        } else {
                            // Goal satisfied; leftovers are the manager's problem
                            Decision::Complete
                        }
                    }
                    Some(DeliveryTarget::Construction { waypoint }) => {
                        let remaining = ctx
                            .world
                            .construction
                            .as_ref()
                            .filter(|site| site.symbol == *waypoint)
                            .and_then(|site| {
                                site.materials
                                    .iter()
                                    .find(|m| m.trade_symbol == self.good)
                            })
                            .map(|m| (m.required - m.fulfilled).max(0))
                            .unwrap_or(0);
                        if remaining > 0 {
                            Decision::SupplyConstruction {
                                site: waypoint.clone(),
                                units: held.min(remaining),
                            }
                        } else {
                            Decision::Complete
                        }
                    }
                    None => Decision::Sell(held),
                }
            }
        }
    }
}
