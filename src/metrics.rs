// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for menu-sync.
//!
//! Uses the `metrics` crate for backend-agnostic collection. The host
//! application chooses the exporter.
//!
//! # Metric Naming Convention
//! - `menu_sync_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `source`: cache, network, not_modified, stale_cache, repository, fallback, empty
//! - `operation`: fetch_menus, fetch_all_menus, fetch_chains, save, bulk_save
//! - `status`: success, error, or an HTTP status class

use metrics::{counter, histogram};
use std::time::Duration;

/// Where a fetch was ultimately served from.
pub fn record_fetch(operation: &str, source: &str) {
    counter!(
        "menu_sync_fetch_total",
        "operation" => operation.to_string(),
        "source" => source.to_string()
    )
    .increment(1);
}

/// Degraded answer: stale cache, repository, hardcoded list or empty.
pub fn record_fallback(operation: &str, source: &str) {
    counter!(
        "menu_sync_fallback_total",
        "operation" => operation.to_string(),
        "source" => source.to_string()
    )
    .increment(1);
}

/// Fresh-cache lookup result: hit, miss, expired.
pub fn record_cache_lookup(result: &str) {
    counter!(
        "menu_sync_cache_lookups_total",
        "result" => result.to_string()
    )
    .increment(1);
}

/// One HTTP request, labelled by outcome (`200`, `304`, `5xx`, `transport`).
pub fn record_http_request(operation: &str, status: &str, duration: Duration) {
    counter!(
        "menu_sync_http_requests_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "menu_sync_http_request_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Repository write outcome and latency.
pub fn record_repository_op(operation: &str, success: bool, duration: Duration) {
    let status = if success { "success" } else { "error" };
    counter!(
        "menu_sync_repository_operations_total",
        "operation" => operation.to_string(),
        "status" => status
    )
    .increment(1);
    histogram!(
        "menu_sync_repository_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Items written to the repository by a sync.
pub fn record_items_persisted(count: usize) {
    counter!("menu_sync_items_persisted_total").increment(count as u64);
}

/// Caller waited on an identical in-flight request.
pub fn record_inflight_wait(operation: &str) {
    counter!(
        "menu_sync_inflight_waits_total",
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Fetch outcome that failed hard (storage or validation).
pub fn record_error(operation: &str, error_type: &str) {
    counter!(
        "menu_sync_errors_total",
        "operation" => operation.to_string(),
        "error_type" => error_type.to_string()
    )
    .increment(1);
}
