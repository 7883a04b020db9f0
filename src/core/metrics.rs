use std::sync::OnceLock;

use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    describe();
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

fn describe() {
    describe_counter!("http_requests_total", "HTTP requests by response status");
    describe_histogram!(
        "http_request_duration_seconds",
        Unit::Seconds,
        "HTTP request latency by response status"
    );
    describe_counter!("task_generation_total", "Task generation attempts by outcome");
    describe_histogram!(
        "llm_request_duration_seconds",
        Unit::Seconds,
        "Latency of generateContent calls"
    );
    describe_counter!("mock_exams_started_total", "Mock exams started");
    describe_counter!("mock_exams_submitted_total", "Mock exams submitted and scored");
    describe_counter!("mock_exams_abandoned_total", "Mock exams marked abandoned by the sweep");
}
