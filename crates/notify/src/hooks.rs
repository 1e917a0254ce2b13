//! Reporting backend hooks.
//!
//! The trading framework reports strategies, screeners, backtests and order
//! activity through these hooks. The default backend discards everything; a
//! monitoring service plugs in by implementing [`ReportingBackend`].

use serde_json::Value;

/// Which order lifecycle event is being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    MarketPlaced,
    LimitPlaced,
    Updated,
}

impl OrderEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderEvent::MarketPlaced => "market_order",
            OrderEvent::LimitPlaced => "limit_order",
            OrderEvent::Updated => "order_update",
        }
    }
}

/// Receiver for framework reporting events. Every hook defaults to a no-op.
pub trait ReportingBackend: Send + Sync {
    fn record_strategy(&self, _strategy: &str) {}

    fn record_screener(&self, _screener: &str) {}

    fn record_screener_result(&self, _screener: &str, _result: &Value) {}

    fn record_backtest_result(&self, _result: &Value) {}

    fn record_exchange(&self, _exchange: &str) {}

    fn record_symbol(&self, _symbol: &str) {}

    /// `exchange_out` is the raw exchange response for the order.
    fn record_order(&self, _event: OrderEvent, _exchange_out: &Value, _exchange_type: &str) {}

    fn annotate_order(&self, _order_id: &str, _annotation: &str) {}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBackend;

impl ReportingBackend for NoopBackend {}

/// Emits every event as a `tracing` debug event under the `blankly_notify::hooks` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingBackend;

impl ReportingBackend for TracingBackend {
    fn record_strategy(&self, strategy: &str) {
        tracing::debug!(strategy, "strategy exported");
    }

    fn record_screener(&self, screener: &str) {
        tracing::debug!(screener, "screener exported");
    }

    fn record_screener_result(&self, screener: &str, result: &Value) {
        tracing::debug!(screener, %result, "screener result exported");
    }

    fn record_backtest_result(&self, result: &Value) {
        tracing::debug!(%result, "backtest result exported");
    }

    fn record_exchange(&self, exchange: &str) {
        tracing::debug!(exchange, "exchange in use");
    }

    fn record_symbol(&self, symbol: &str) {
        tracing::debug!(symbol, "symbol in use");
    }

    fn record_order(&self, event: OrderEvent, exchange_out: &Value, exchange_type: &str) {
        tracing::debug!(
            event = event.as_str(),
            exchange_type,
            order = %exchange_out,
            "order event"
        );
    }

    fn annotate_order(&self, order_id: &str, annotation: &str) {
        tracing::debug!(order_id, annotation, "order annotated");
    }
}

/// Errors raised by the reporting facade itself.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HookError {
    #[error("Currently only a single screener can be created per model (already exported '{0}')")]
    ScreenerAlreadyExported(String),
}
