//! Event publication to audit/observability listeners.
//!
//! # Design Decisions
//! - One explicit publisher instance, passed by reference (no global bus)
//! - Each listener runs on the blocking pool; errors and panics are logged, never propagated
//! - The whole publication is bounded by `budget`; stragglers are detached
//! - Detached stragglers keep their blocking thread until they return. Each listener may hold
//!   at most `max_in_flight` deliveries; beyond that its deliveries are skipped and counted,
//!   so one hung listener cannot exhaust the blocking pool or starve the others

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::events::SecurityEvent;
use crate::observability::metrics;

/// Error a listener may report. Logged by the publisher and otherwise ignored.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ListenerError(pub String);

/// Receives every published security event.
///
/// Implementations should be fast and non-blocking; slow ones are cut off by the budget.
pub trait SecurityEventListener: Send + Sync {
    fn name(&self) -> &str;

    fn on_event(&self, event: &SecurityEvent) -> Result<(), ListenerError>;
}

/// Outcome of one publication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub failed: usize,
    pub timed_out: usize,
    /// Deliveries not started because the listener was at its in-flight cap.
    pub skipped: usize,
}

/// Default cap on unfinished deliveries per listener.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 16;

struct Registered {
    listener: Arc<dyn SecurityEventListener>,
    in_flight: Arc<Semaphore>,
}

/// Fans security events out to registered listeners.
pub struct EventPublisher {
    listeners: Vec<Registered>,
    budget: Duration,
    max_in_flight: usize,
}

impl EventPublisher {
    pub fn new(budget: Duration) -> Self {
        Self {
            listeners: Vec::new(),
            budget,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn SecurityEventListener>) -> Self {
        self.listeners.push(Registered {
            listener,
            in_flight: Arc::new(Semaphore::new(self.max_in_flight)),
        });
        self
    }

    /// Cap unfinished deliveries per listener. Applies to listeners already registered too.
    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = max.max(1);
        for registered in &mut self.listeners {
            registered.in_flight = Arc::new(Semaphore::new(self.max_in_flight));
        }
        self
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver `event` to every listener, waiting at most `budget`.
    pub async fn publish(&self, event: SecurityEvent) -> PublishReport {
        let mut report = PublishReport::default();
        if self.listeners.is_empty() {
            return report;
        }

        let event = Arc::new(event);
        let mut tasks = JoinSet::new();
        for registered in &self.listeners {
            let Ok(permit) = registered.in_flight.clone().try_acquire_owned() else {
                report.skipped += 1;
                tracing::warn!(
                    listener = %registered.listener.name(),
                    event_id = %event.id,
                    max_in_flight = self.max_in_flight,
                    "Security event listener saturated, skipping delivery"
                );
                metrics::record_listener_failure(registered.listener.name(), "saturated");
                continue;
            };
            let listener = registered.listener.clone();
            let event = event.clone();
            tasks.spawn_blocking(move || {
                let result = listener.on_event(&event);
                drop(permit);
                (listener.name().to_string(), result)
            });
        }

        let deadline = Instant::now() + self.budget;
        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((_, Ok(()))))) => report.delivered += 1,
                Ok(Some(Ok((name, Err(e))))) => {
                    report.failed += 1;
                    tracing::warn!(listener = %name, event_id = %event.id, error = %e, "Security event listener failed");
                    metrics::record_listener_failure(&name, "error");
                }
                Ok(Some(Err(join_error))) => {
                    report.failed += 1;
                    tracing::error!(event_id = %event.id, error = %join_error, "Security event listener panicked");
                    metrics::record_listener_failure("unknown", "panic");
                }
                Ok(None) => break,
                Err(_) => {
                    report.timed_out = tasks.len();
                    tracing::warn!(
                        event_id = %event.id,
                        pending = report.timed_out,
                        budget_ms = self.budget.as_millis() as u64,
                        "Security event listeners exceeded budget"
                    );
                    metrics::record_listener_failure("unknown", "timeout");
                    tasks.detach_all();
                    break;
                }
            }
        }

        report
    }
}

/// Writes each event to the `security_audit` tracing target.
#[derive(Debug, Default)]
pub struct AuditLogListener;

impl SecurityEventListener for AuditLogListener {
    fn name(&self) -> &str {
        "audit_log"
    }

    fn on_event(&self, event: &SecurityEvent) -> Result<(), ListenerError> {
        tracing::info!(
            target: "security_audit",
            event_id = %event.id,
            kind = %event.kind,
            method = %event.request.method,
            path = %event.request.path,
            request_id = event.request.request_id.as_deref().unwrap_or("-"),
            principal = event.principal.as_ref().map(|p| p.username.as_str()).unwrap_or("-"),
            cause = event.cause.as_ref().map(|c| c.to_string()).unwrap_or_default(),
            "Security event"
        );
        Ok(())
    }
}
