//! Position manager: owns the cash ledger and every open position.
//!
//! Per bar, each open position is checked in fixed priority order:
//! 1. stop-loss touch (low <= stop), exits at the stop price
//! 2. take-profit touch (high >= target), exits at the target price
//! 3. pending exit signal, exits at this bar's close less slippage
//!
//! Capital is reserved once on open (notional + entry commission) and
//! released once on close (proceeds - exit commission).

use tracing::debug;

use super::cost_model::CostModel;
use crate::domain::{Bar, ExitReason, OpenPosition, Position, Trade};
use crate::indicators::IndicatorSnapshot;

/// The bar being processed.
#[derive(Debug, Clone, Copy)]
pub struct BarContext<'a> {
    pub index: usize,
    pub bar: &'a Bar,
    pub snapshot: &'a IndicatorSnapshot,
}

/// How a position leaves the book.
#[derive(Debug, Clone)]
pub struct ExitFill {
    pub reason: ExitReason,
    /// Price before slippage.
    pub raw_price: f64,
    /// Price actually received.
    pub price: f64,
    pub snapshot: IndicatorSnapshot,
}

/// Advance one open position through one bar.
pub fn step(
    mut position: OpenPosition,
    ctx: &BarContext<'_>,
    symbol: &str,
    costs: &CostModel,
) -> Position {
    let bar = ctx.bar;
    position.update_excursions(bar.high, bar.low);
    position.bars_held += 1;

    if let Some(stop) = position.stop_loss.filter(|s| bar.low <= *s) {
        let fill = ExitFill {
            reason: ExitReason::StopLoss,
            raw_price: stop,
            price: stop,
            snapshot: ctx.snapshot.clone(),
        };
        return Position::Closed(settle(position, ctx, fill, symbol, costs));
    }

    if let Some(target) = position.take_profit.filter(|t| bar.high >= *t) {
        let fill = ExitFill {
            reason: ExitReason::TakeProfit,
            raw_price: target,
            price: target,
            snapshot: ctx.snapshot.clone(),
        };
        return Position::Closed(settle(position, ctx, fill, symbol, costs));
    }

    if let Some(signal_snapshot) = position.exit_signal.take() {
        let fill = ExitFill {
            reason: ExitReason::Signal,
            raw_price: bar.close,
            price: costs.sell_price(bar.close),
            snapshot: signal_snapshot,
        };
        return Position::Closed(settle(position, ctx, fill, symbol, costs));
    }

    Position::Open(position)
}

/// Close a position and build its trade record.
pub fn settle(
    position: OpenPosition,
    ctx: &BarContext<'_>,
    fill: ExitFill,
    symbol: &str,
    costs: &CostModel,
) -> Trade {
    let shares = position.shares;
    let exit_commission = costs.commission(fill.price, shares);
    let exit_slippage = costs.slippage_cost(fill.raw_price, fill.price, shares);
    let gross_pnl = (fill.price - position.entry_price) * shares;
    let commission = position.entry_commission + exit_commission;
    let net_pnl = gross_pnl - commission;
    let pnl_pct = if position.cost > 0.0 {
        net_pnl / position.cost * 100.0
    } else {
        0.0
    };

    Trade {
        symbol: symbol.to_string(),
        entry_bar: position.entry_bar,
        entry_time: position.entry_time,
        entry_price: position.entry_price,
        exit_bar: ctx.index,
        exit_time: ctx.bar.timestamp,
        exit_price: fill.price,
        shares,
        gross_pnl,
        net_pnl,
        pnl_pct,
        commission,
        slippage: position.entry_slippage + exit_slippage,
        exit_reason: fill.reason,
        mae: position.mae(),
        mfe: position.mfe(),
        bars_held: position.bars_held,
        entry_snapshot: position.entry_snapshot,
        exit_snapshot: fill.snapshot,
    }
}

/// Cash proceeds returned to the ledger when `trade` closed.
fn release(trade: &Trade, costs: &CostModel) -> f64 {
    let proceeds = trade.exit_price * trade.shares;
    proceeds - costs.commission(trade.exit_price, trade.shares)
}

#[derive(Debug, Clone)]
pub struct PositionManager {
    symbol: String,
    costs: CostModel,
    stop_loss_pct: Option<f64>,
    take_profit_pct: Option<f64>,
    cash: f64,
    open: Vec<OpenPosition>,
}

impl PositionManager {
    pub fn new(
        symbol: impl Into<String>,
        initial_capital: f64,
        costs: CostModel,
        stop_loss_pct: Option<f64>,
        take_profit_pct: Option<f64>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            costs,
            stop_loss_pct,
            take_profit_pct,
            cash: initial_capital,
            open: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn costs(&self) -> &CostModel {
        &self.costs
    }

    pub fn open_positions(&self) -> &[OpenPosition] {
        &self.open
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// cash + market value of every open position at `close`.
    pub fn equity(&self, close: f64) -> f64 {
        self.cash + self.open.iter().map(|p| p.market_value(close)).sum::<f64>()
    }

    /// Run exit checks for every open position. Returns the trades closed this bar.
    pub fn manage_bar(&mut self, ctx: &BarContext<'_>) -> Vec<Trade> {
        let mut closed = Vec::new();
        let mut still_open = Vec::with_capacity(self.open.len());

        for position in std::mem::take(&mut self.open) {
            match step(position, ctx, &self.symbol, &self.costs) {
                Position::Open(p) => still_open.push(p),
                Position::Closed(trade) => {
                    self.cash += release(&trade, &self.costs);
                    debug!(
                        symbol = %self.symbol,
                        bar = ctx.index,
                        reason = %trade.exit_reason,
                        price = trade.exit_price,
                        net_pnl = trade.net_pnl,
                        "position closed"
                    );
                    closed.push(trade);
                }
            }
        }

        self.open = still_open;
        closed
    }

    /// Flag every open position for a signal exit on the next bar.
    pub fn signal_exits(&mut self, snapshot: &IndicatorSnapshot) {
        for position in self.open.iter_mut().filter(|p| p.exit_signal.is_none()) {
            position.exit_signal = Some(snapshot.clone());
        }
    }

    /// Open a long position of `shares` at this bar's open plus slippage.
    ///
    /// Returns `None` (and leaves cash untouched) when `shares` is zero or the
    /// cost plus commission exceeds available cash.
    pub fn enter(
        &mut self,
        ctx: &BarContext<'_>,
        shares: f64,
        entry_snapshot: IndicatorSnapshot,
    ) -> Option<&OpenPosition> {
        if shares <= 0.0 {
            return None;
        }
        let raw_price = ctx.bar.open;
        let price = self.costs.buy_price(raw_price);
        let cost = shares * price;
        let commission = self.costs.commission(price, shares);
        if cost + commission > self.cash {
            debug!(
                symbol = %self.symbol,
                bar = ctx.index,
                cost,
                commission,
                cash = self.cash,
                "entry skipped: insufficient cash"
            );
            return None;
        }

        self.cash -= cost + commission;
        let position = OpenPosition {
            entry_bar: ctx.index,
            entry_time: ctx.bar.timestamp,
            entry_price: price,
            shares,
            cost,
            entry_commission: commission,
            entry_slippage: self.costs.slippage_cost(raw_price, price, shares),
            stop_loss: self.stop_loss_pct.map(|pct| price * (1.0 - pct / 100.0)),
            take_profit: self.take_profit_pct.map(|pct| price * (1.0 + pct / 100.0)),
            lowest_low: None,
            highest_high: None,
            bars_held: 0,
            entry_snapshot,
            exit_signal: None,
        };
        debug!(
            symbol = %self.symbol,
            bar = ctx.index,
            price,
            shares,
            "position opened"
        );
        self.open.push(position);
        self.open.last()
    }

    /// Force-close everything at this bar's close, without slippage.
    pub fn close_all(&mut self, ctx: &BarContext<'_>) -> Vec<Trade> {
        let mut closed = Vec::with_capacity(self.open.len());
        for position in std::mem::take(&mut self.open) {
            let fill = ExitFill {
                reason: ExitReason::EndOfData,
                raw_price: ctx.bar.close,
                price: ctx.bar.close,
                snapshot: ctx.snapshot.clone(),
            };
            let trade = settle(position, ctx, fill, &self.symbol, &self.costs);
            self.cash += release(&trade, &self.costs);
            closed.push(trade);
        }
        closed
    }
}
