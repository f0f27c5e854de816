//! Transport-agnostic boundary surface.

use std::sync::{Arc, Mutex, PoisonError};

use host::Host;
use registry::{Endpoint, Registry};
use serde::Serialize;
use tracing::info;

use crate::{Discovery, DiscoveryReport, Dispatcher, ExecutionResult, Parameters, Result, Timeouts};

/// Liveness summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub endpoints_registered: usize,
}

/// Result of a re-discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub status: &'static str,
    pub endpoints_registered: usize,
    pub report: DiscoveryReport,
}

/// Discovery, registry and dispatch wired together for one host.
///
/// Transports (the RPC server, the CLI) call into this and never reach the
/// registry or the host directly.
pub struct Broker<H> {
    registry: Arc<Registry>,
    discovery: Discovery<H>,
    dispatcher: Dispatcher<H>,
    last_report: Mutex<Option<DiscoveryReport>>,
}

impl<H: Host> Broker<H> {
    pub fn new(host: H, timeouts: Timeouts) -> Self {
        Self::with_registry(Arc::new(host), Arc::new(Registry::new()), timeouts)
    }

    pub fn with_registry(host: Arc<H>, registry: Arc<Registry>, timeouts: Timeouts) -> Self {
        Self {
            discovery: Discovery::new(host.clone(), registry.clone(), timeouts),
            dispatcher: Dispatcher::new(host, registry.clone(), timeouts),
            registry,
            last_report: Mutex::new(None),
        }
    }

    /// Run the initial discovery pass.
    pub async fn start(&self) -> DiscoveryReport {
        let report = self.discovery.discover_all().await;
        info!(endpoints = self.registry.count(), "broker ready");
        self.store_report(report.clone());
        report
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Registered endpoints sorted by id, optionally limited to one category.
    pub fn list_capabilities(&self, category: Option<&str>) -> Vec<Arc<Endpoint>> {
        match category {
            Some(category) => self.registry.get_by_category(category),
            None => self.registry.get_all(),
        }
    }

    pub fn health(&self) -> Health {
        Health {
            status: "healthy",
            endpoints_registered: self.registry.count(),
        }
    }

    pub async fn execute(&self, id: &str, parameters: Option<Parameters>) -> Result<ExecutionResult> {
        self.dispatcher.execute(id, parameters).await
    }

    /// Re-run discovery, replacing the registry content.
    pub async fn refresh(&self) -> RefreshSummary {
        let report = self.discovery.refresh().await;
        self.store_report(report.clone());
        RefreshSummary {
            status: "refreshed",
            endpoints_registered: self.registry.count(),
            report,
        }
    }

    /// Report of the most recent discovery pass, if any ran.
    pub fn last_report(&self) -> Option<DiscoveryReport> {
        self.last_report
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store_report(&self, report: DiscoveryReport) {
        *self
            .last_report
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DispatchError;
    use crate::testing::FakeHost;
    use serde_json::json;

    async fn started(host: FakeHost) -> Broker<FakeHost> {
        let broker = Broker::new(host, Timeouts::default());
        broker.start().await;
        broker
    }

    #[tokio::test]
    async fn health_counts_endpoints() {
        let broker = started(FakeHost::new()).await;
        let health = broker.health();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.endpoints_registered, 15);
        assert_eq!(
            serde_json::to_value(&health).unwrap(),
            json!({"status": "healthy", "endpoints_registered": 15})
        );
    }

    #[tokio::test]
    async fn list_filters_by_category() {
        let broker = started(FakeHost::new()).await;

        let all = broker.list_capabilities(None);
        assert_eq!(all.len(), 15);
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));

        let math = broker.list_capabilities(Some("Math Operations"));
        assert_eq!(math.len(), 3);
        assert!(math.iter().all(|e| e.category == "Math Operations"));

        assert!(broker.list_capabilities(Some("Nope")).is_empty());
    }

    #[tokio::test]
    async fn execute_routes_to_dispatcher() {
        let broker = started(FakeHost::new()).await;

        let result = broker
            .execute("sample_string_concat", json!({"str1": "cap", "str2": "broker"}).as_object().cloned())
            .await
            .unwrap();
        assert_eq!(result.output.as_deref(), Some("capbroker"));

        let err = broker.execute("nonexistent_id", None).await.unwrap_err();
        assert!(matches!(err, DispatchError::NotFound { .. }));
    }

    #[tokio::test]
    async fn refresh_reports_and_stores() {
        let broker = Broker::new(FakeHost::new(), Timeouts::default());
        assert!(broker.last_report().is_none());

        broker.start().await;
        broker
            .registry()
            .register(Endpoint::new("tool_gone", "Gone", "uninstalled", "Tools").unwrap());

        let summary = broker.refresh().await;
        assert_eq!(summary.status, "refreshed");
        assert_eq!(summary.endpoints_registered, 15);
        assert!(broker.registry().get("tool_gone").is_none());
        assert_eq!(broker.last_report(), Some(summary.report));
    }
}
