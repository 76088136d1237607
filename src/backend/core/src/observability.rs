//! Observability: distributed tracing, metrics, and logging.

use opentelemetry_otlp::WithExportConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the observability stack.
pub fn init(service_name: &str, otlp_endpoint: Option<&str>) -> anyhow::Result<()> {
    // Set up OpenTelemetry tracing if endpoint is provided
    if let Some(endpoint) = otlp_endpoint {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(
                opentelemetry_otlp::new_exporter()
                    .tonic()
                    .with_endpoint(endpoint),
            )
            .with_trace_config(
                opentelemetry_sdk::trace::config()
                    .with_resource(opentelemetry_sdk::Resource::new(vec![
                        opentelemetry::KeyValue::new("service.name", service_name.to_string()),
                    ])),
            )
            .install_batch(opentelemetry_sdk::runtime::Tokio)?;

        let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);

        tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(telemetry_layer)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        // Just use local logging
        tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    }

    Ok(())
}

/// Shutdown OpenTelemetry.
pub fn shutdown() {
    opentelemetry::global::shutdown_tracer_provider();
}

/// Metrics registry and helpers.
pub mod metrics {
    use metrics::{counter, describe_counter, describe_histogram, histogram};
    use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

    /// Install the Prometheus recorder and return the handle backing the
    /// metrics endpoint.
    pub fn install_prometheus() -> anyhow::Result<PrometheusHandle> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        register_metrics();
        Ok(handle)
    }

    /// Register all metric descriptions.
    pub fn register_metrics() {
        describe_counter!(
            "coterie_http_requests_total",
            "Total number of HTTP requests handled"
        );
        describe_counter!(
            "coterie_errors_total",
            "Total number of errors by code, category, and severity"
        );
        describe_counter!(
            "coterie_projects_created_total",
            "Total number of projects created"
        );
        describe_counter!(
            "coterie_members_added_total",
            "Total number of memberships granted"
        );
        describe_counter!(
            "coterie_comments_added_total",
            "Total number of comments posted"
        );
        describe_histogram!(
            "coterie_http_request_duration_seconds",
            "HTTP request latency in seconds"
        );
    }

    /// Record a handled HTTP request.
    pub fn record_request(method: &str, path: &str, status: u16, duration_secs: f64) {
        counter!(
            "coterie_http_requests_total",
            "method" => method.to_string(),
            "path" => path.to_string(),
            "status" => status.to_string(),
        )
        .increment(1);
        histogram!(
            "coterie_http_request_duration_seconds",
            "method" => method.to_string(),
            "path" => path.to_string(),
        )
        .record(duration_secs);
    }

    /// Record a project creation.
    pub fn record_project_created() {
        counter!("coterie_projects_created_total").increment(1);
    }

    /// Record a membership grant.
    pub fn record_member_added(role: &str) {
        counter!("coterie_members_added_total", "role" => role.to_string()).increment(1);
    }

    /// Record a posted comment.
    pub fn record_comment_added() {
        counter!("coterie_comments_added_total").increment(1);
    }
}
