//! Observability infrastructure - Prometheus metrics

mod config;
mod metrics;

pub use config::MetricsConfig;
pub use metrics::{
    create_metrics_router, init_metrics, record_cache_write, record_http_request,
    record_network_failure, record_proxy_response, PrometheusMetrics,
};
