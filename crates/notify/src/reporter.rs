//! The reporting facade handed to strategies.
//!
//! Bundles notification dispatch, the live-variable registry and the
//! reporting backend hooks behind one object.

use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::card::Payload;
use crate::dispatcher::Dispatcher;
use crate::hooks::{HookError, NoopBackend, OrderEvent, ReportingBackend};
use crate::live_vars::{LiveVarError, LiveVarHandle, LiveVarRegistry};
use crate::traits::NotifyError;

pub struct Reporter {
    dispatcher: Dispatcher,
    live_vars: Arc<LiveVarRegistry>,
    backend: Arc<dyn ReportingBackend>,
    screener: Mutex<Option<String>>,
}

impl Reporter {
    /// Reporter with the no-op backend and the process-wide registry.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self::with_parts(dispatcher, LiveVarRegistry::global(), Arc::new(NoopBackend))
    }

    pub fn with_parts(
        dispatcher: Dispatcher,
        live_vars: Arc<LiveVarRegistry>,
        backend: Arc<dyn ReportingBackend>,
    ) -> Self {
        Self {
            dispatcher,
            live_vars,
            backend,
            screener: Mutex::new(None),
        }
    }

    /// Reporter reading `notify.json` from the working directory.
    pub fn from_env() -> Self {
        Self::new(Dispatcher::from_env())
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn live_vars(&self) -> &LiveVarRegistry {
        &self.live_vars
    }

    // ── Notifications ───────────────────────────────────────────────

    /// Send a text message to the configured phone number.
    pub async fn text(&self, text: &str) -> Result<(), NotifyError> {
        self.dispatcher.send_text(text).await
    }

    /// Send an email to the configured receiver.
    pub async fn email(&self, email: &str) -> Result<(), NotifyError> {
        self.dispatcher.send_email(email).await
    }

    /// Post to the configured chat space; `header` titles structured cards.
    pub async fn chat(
        &self,
        message: impl Into<Payload>,
        header: Option<&str>,
    ) -> Result<(), NotifyError> {
        self.dispatcher.send_chat(message, header).await
    }

    // ── Live variables ──────────────────────────────────────────────

    pub fn export_live_var(
        &self,
        value: impl Into<Value>,
        name: &str,
        description: Option<&str>,
    ) -> LiveVarHandle {
        self.live_vars.export(value, name, description)
    }

    /// Current value of an exported variable, including external changes.
    pub fn update_live_var(&self, handle: LiveVarHandle) -> Result<Value, LiveVarError> {
        self.live_vars.get(handle)
    }

    // ── Framework hooks ─────────────────────────────────────────────

    pub fn export_strategy(&self, strategy: &str) {
        self.backend.record_strategy(strategy);
    }

    /// Register the model's screener. Only one screener may be exported.
    pub fn export_screener(&self, screener: &str) -> Result<(), HookError> {
        let mut slot = self.screener.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = slot.as_ref() {
            return Err(HookError::ScreenerAlreadyExported(existing.clone()));
        }
        *slot = Some(screener.to_string());
        drop(slot);

        self.backend.record_screener(screener);
        Ok(())
    }

    pub fn screener(&self) -> Option<String> {
        self.screener
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn export_screener_result(&self, screener: &str, result: &Value) {
        self.backend.record_screener_result(screener, result);
    }

    pub fn export_backtest_result(&self, result: &Value) {
        self.backend.record_backtest_result(result);
    }

    pub fn export_used_exchange(&self, exchange: &str) {
        self.backend.record_exchange(exchange);
    }

    pub fn export_used_symbol(&self, symbol: &str) {
        self.backend.record_symbol(symbol);
    }

    pub fn log_market_order(&self, exchange_out: &Value, exchange_type: &str) {
        self.backend
            .record_order(OrderEvent::MarketPlaced, exchange_out, exchange_type);
    }

    pub fn log_limit_order(&self, exchange_out: &Value, exchange_type: &str) {
        self.backend
            .record_order(OrderEvent::LimitPlaced, exchange_out, exchange_type);
    }

    pub fn update_order(&self, exchange_out: &Value, exchange_type: &str) {
        self.backend
            .record_order(OrderEvent::Updated, exchange_out, exchange_type);
    }

    pub fn annotate_order(&self, order_id: &str, annotation: &str) {
        self.backend.annotate_order(order_id, annotation);
    }
}
