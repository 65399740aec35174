use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};

/// Report generation metrics, served on `/metrics`.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub reports_generated: IntCounterVec,
    pub generation_failures: IntCounterVec,
    pub generation_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let reports_generated = IntCounterVec::new(
            Opts::new("crosstab_reports_generated_total", "Report workbooks generated"),
            &["subset"],
        )?;
        let generation_failures = IntCounterVec::new(
            Opts::new("crosstab_generation_failures_total", "Failed report generation runs"),
            &["code"],
        )?;
        let generation_seconds = Histogram::with_opts(HistogramOpts::new(
            "crosstab_generation_seconds",
            "Time spent generating and packaging reports",
        ))?;

        registry.register(Box::new(reports_generated.clone()))?;
        registry.register(Box::new(generation_failures.clone()))?;
        registry.register(Box::new(generation_seconds.clone()))?;

        Ok(Self {
            registry,
            reports_generated,
            generation_failures,
            generation_seconds,
        })
    }

    pub fn render(&self) -> String {
        TextEncoder::new()
            .encode_to_string(&self.registry.gather())
            .unwrap_or_else(|_| "Error encoding metrics".to_string())
    }
}
