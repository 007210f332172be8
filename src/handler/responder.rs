//! The single entry point for answering a security event.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::response::Response;

use crate::events::{EventKind, EventPublisher, SecurityEvent};
use crate::handler::composer::{DefaultHandler, FrameworkDefaults, ResponseComposer};
use crate::handler::mode::{self, HandleMode};
use crate::observability::metrics;
use crate::security::rule_table::RuleTable;

/// Resolve, compose, publish. One call per event, one response per call.
#[derive(Clone)]
pub struct SecurityResponder {
    composer: ResponseComposer,
    defaults: Arc<dyn DefaultHandler>,
    bound: BTreeSet<EventKind>,
    publisher: Arc<EventPublisher>,
}

impl SecurityResponder {
    pub fn new(
        composer: ResponseComposer,
        defaults: Arc<dyn DefaultHandler>,
        bound: impl IntoIterator<Item = EventKind>,
        publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            composer,
            defaults,
            bound: bound.into_iter().collect(),
            publisher,
        }
    }

    /// Responder whose defaults and bindings come from a built rule table.
    pub fn for_table(table: &RuleTable, composer: ResponseComposer, publisher: Arc<EventPublisher>) -> Self {
        Self::new(
            composer,
            Arc::new(FrameworkDefaults::from_features(table.features())),
            table.bound_events(),
            publisher,
        )
    }

    /// Publisher shared by every responder built for this process.
    pub fn publisher(&self) -> &Arc<EventPublisher> {
        &self.publisher
    }

    /// Configured mode for `kind`; kinds no provider bound always use the default handler.
    pub fn configured_mode(&self, kind: EventKind) -> HandleMode {
        if self.bound.contains(&kind) {
            self.composer.template(kind).mode
        } else {
            HandleMode::Default
        }
    }

    pub async fn respond(&self, event: SecurityEvent) -> Response {
        let configured = self.configured_mode(event.kind);
        let resolved = mode::resolve(event.kind, configured, &event.request.signals);
        let response = self.composer.compose(&event, resolved, self.defaults.as_ref());

        tracing::info!(
            event_id = %event.id,
            kind = %event.kind,
            configured = configured.as_str(),
            resolved = resolved.as_str(),
            status = response.status().as_u16(),
            path = %event.request.path,
            "Security event handled"
        );
        metrics::record_security_event(event.kind.as_str(), resolved.as_str());

        let report = self.publisher.publish(event).await;
        if report.failed > 0 || report.timed_out > 0 || report.skipped > 0 {
            tracing::warn!(
                failed = report.failed,
                timed_out = report.timed_out,
                skipped = report.skipped,
                "Some security event listeners did not complete"
            );
        }
        response
    }
}
