//! Prometheus registry behind `/metrics`
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

pub struct ApiMetrics {
    registry: Registry,
    requests: IntCounterVec,
}

impl ApiMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let requests = IntCounterVec::new(
            Opts::new("minewatch_requests_total", "Requests handled, by operation"),
            &["operation"],
        )?;
        registry.register(Box::new(requests.clone()))?;

        Ok(Self { registry, requests })
    }

    pub fn record(&self, operation: &str) {
        self.requests.with_label_values(&[operation]).inc();
    }

    pub fn count(&self, operation: &str) -> u64 {
        self.requests.with_label_values(&[operation]).get()
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
