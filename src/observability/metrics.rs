use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub samples_recorded_total: IntCounterVec,
    pub samples_purged_total: IntCounter,
    pub nearby_query_seconds: Histogram,
    pub couriers_registered: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let samples_recorded_total = IntCounterVec::new(
            Opts::new("samples_recorded_total", "Location samples by outcome"),
            &["outcome"],
        )
        .expect("valid samples_recorded_total metric");

        let samples_purged_total = IntCounter::new(
            "samples_purged_total",
            "Samples deleted by the retention sweep",
        )
        .expect("valid samples_purged_total metric");

        let nearby_query_seconds = Histogram::with_opts(HistogramOpts::new(
            "nearby_query_seconds",
            "Latency of proximity queries in seconds",
        ))
        .expect("valid nearby_query_seconds metric");

        let couriers_registered = IntGauge::new(
            "couriers_registered",
            "Couriers currently known to the service",
        )
        .expect("valid couriers_registered metric");

        registry
            .register(Box::new(samples_recorded_total.clone()))
            .expect("register samples_recorded_total");
        registry
            .register(Box::new(samples_purged_total.clone()))
            .expect("register samples_purged_total");
        registry
            .register(Box::new(nearby_query_seconds.clone()))
            .expect("register nearby_query_seconds");
        registry
            .register(Box::new(couriers_registered.clone()))
            .expect("register couriers_registered");

        Self {
            registry,
            samples_recorded_total,
            samples_purged_total,
            nearby_query_seconds,
            couriers_registered,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
