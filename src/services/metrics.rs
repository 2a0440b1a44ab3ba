//! Prometheus metrics for admission decisions.

use prometheus::{CounterVec, Opts, Registry, TextEncoder};

/// Decision counters, labeled by route and outcome (`allow` or the
/// rejection label).
#[derive(Clone)]
pub struct AdmissionMetrics {
    pub registry: Registry,
    pub decisions_total: CounterVec,
}

impl AdmissionMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let decisions_total = CounterVec::new(
            Opts::new(
                "admission_decisions_total",
                "Admission pipeline decisions by route and outcome",
            ),
            &["route", "outcome"],
        )?;

        registry.register(Box::new(decisions_total.clone()))?;

        Ok(Self {
            registry,
            decisions_total,
        })
    }

    pub fn record(&self, route: &str, outcome: &str) {
        self.decisions_total
            .with_label_values(&[route, outcome])
            .inc();
    }

    /// Render the registry in Prometheus text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        encoder.encode_to_string(&self.registry.gather())
    }
}
