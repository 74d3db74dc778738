// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 初始化指标系统
///
/// 安装 Prometheus 记录器并在配置的地址上暴露指标，
/// 未启用或安装失败时指标调用退化为空操作
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        return;
    }

    let addr: SocketAddr = match settings.listen.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics listen address '{}': {}", settings.listen, e);
            return;
        }
    };

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}", e);
        return;
    }
    info!("Prometheus metrics exposed on {}", addr);

    describe_counter!("task_runs_total", "Scheduled task executions by task and outcome");
    describe_histogram!(
        "task_run_duration_seconds",
        "Duration of scheduled task executions in seconds"
    );
    describe_counter!(
        "source_attempts_total",
        "Extraction source attempts by source and outcome"
    );
    describe_counter!(
        "validation_rejections_total",
        "Extraction results rejected before storage"
    );
    describe_gauge!("dataset_records", "Records in the current dataset per entity type");
}
