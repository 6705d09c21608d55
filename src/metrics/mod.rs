/*!
 * # Metrics Module
 *
 * In-process counters, gauges and histograms for the restaurant API.
 *
 * - HTTP request metrics per matched route (count, latency, status class)
 * - Business metrics (orders, table collections, archival, backups)
 * - Cache hit ratio of the menu cache
 *
 * Exposed as Prometheus text at `/metrics` and JSON at `/metrics/json`.
 */

use axum::{
    extract::{MatchedPath, Request},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Latency bucket upper bounds in seconds.
const LATENCY_BUCKETS: [f64; 9] = [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5];

#[derive(Debug, Clone, Default)]
pub struct Counter {
    value: Arc<AtomicU64>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, value: u64) {
        self.value.fetch_add(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Gauge holding an `f64` as raw bits.
#[derive(Debug, Clone, Default)]
pub struct Gauge {
    bits: Arc<AtomicU64>,
}

impl Gauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn add(&self, delta: f64) {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self
                .bits
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

#[derive(Debug, Clone)]
pub struct Histogram {
    buckets: Arc<Vec<AtomicU64>>,
    /// Sum of observations in microseconds
    sum_micros: Arc<AtomicU64>,
    count: Arc<AtomicU64>,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    pub fn new() -> Self {
        Self {
            buckets: Arc::new(LATENCY_BUCKETS.iter().map(|_| AtomicU64::new(0)).collect()),
            sum_micros: Arc::new(AtomicU64::new(0)),
            count: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn observe(&self, seconds: f64) {
        for (bound, bucket) in LATENCY_BUCKETS.iter().zip(self.buckets.iter()) {
            if seconds <= *bound {
                bucket.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.sum_micros
            .fetch_add((seconds * 1_000_000.0) as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn get_sum(&self) -> f64 {
        self.sum_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0
    }

    fn bucket_counts(&self) -> Vec<(f64, u64)> {
        LATENCY_BUCKETS
            .iter()
            .zip(self.buckets.iter())
            .map(|(bound, count)| (*bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Splits `name{labels}` into its base name and label block.
fn split_labels(key: &str) -> (&str, &str) {
    match key.find('{') {
        Some(idx) => (&key[..idx], &key[idx..]),
        None => (key, ""),
    }
}

fn with_extra_label(labels: &str, extra: &str) -> String {
    if labels.is_empty() {
        format!("{{{}}}", extra)
    } else {
        format!("{},{}}}", &labels[..labels.len() - 1], extra)
    }
}

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    counters: DashMap<String, Counter>,
    gauges: DashMap<String, Gauge>,
    histograms: DashMap<String, Histogram>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create_counter(&self, name: &str) -> Counter {
        self.counters
            .entry(name.to_string())
            .or_insert_with(Counter::new)
            .clone()
    }

    pub fn get_or_create_gauge(&self, name: &str) -> Gauge {
        self.gauges
            .entry(name.to_string())
            .or_insert_with(Gauge::new)
            .clone()
    }

    pub fn get_or_create_histogram(&self, name: &str) -> Histogram {
        self.histograms
            .entry(name.to_string())
            .or_insert_with(Histogram::new)
            .clone()
    }

    /// Prometheus text exposition format.
    pub fn export_metrics(&self) -> String {
        let mut output = String::new();
        let mut typed = BTreeSet::new();

        let mut counters: Vec<_> = self
            .counters
            .iter()
            .map(|e| (e.key().clone(), e.value().get()))
            .collect();
        counters.sort();
        for (key, value) in counters {
            let (base, _) = split_labels(&key);
            if typed.insert(base.to_string()) {
                output.push_str(&format!("# TYPE {} counter\n", base));
            }
            output.push_str(&format!("{} {}\n", key, value));
        }

        let mut gauges: Vec<_> = self
            .gauges
            .iter()
            .map(|e| (e.key().clone(), e.value().get()))
            .collect();
        gauges.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, value) in gauges {
            let (base, _) = split_labels(&key);
            if typed.insert(base.to_string()) {
                output.push_str(&format!("# TYPE {} gauge\n", base));
            }
            output.push_str(&format!("{} {}\n", key, value));
        }

        let mut histograms: Vec<_> = self
            .histograms
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        histograms.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, histogram) in histograms {
            let (base, labels) = split_labels(&key);
            if typed.insert(base.to_string()) {
                output.push_str(&format!("# TYPE {} histogram\n", base));
            }
            for (bound, count) in histogram.bucket_counts() {
                output.push_str(&format!(
                    "{}_bucket{} {}\n",
                    base,
                    with_extra_label(labels, &format!("le=\"{}\"", bound)),
                    count
                ));
            }
            output.push_str(&format!(
                "{}_bucket{} {}\n",
                base,
                with_extra_label(labels, "le=\"+Inf\""),
                histogram.get_count()
            ));
            output.push_str(&format!("{}_sum{} {}\n", base, labels, histogram.get_sum()));
            output.push_str(&format!("{}_count{} {}\n", base, labels, histogram.get_count()));
        }

        output
    }

    pub fn export_metrics_json(&self) -> serde_json::Value {
        let mut counters = serde_json::Map::new();
        for entry in self.counters.iter() {
            counters.insert(entry.key().clone(), json!(entry.value().get()));
        }

        let mut gauges = serde_json::Map::new();
        for entry in self.gauges.iter() {
            gauges.insert(entry.key().clone(), json!(entry.value().get()));
        }

        let mut histograms = serde_json::Map::new();
        for entry in self.histograms.iter() {
            let histogram = entry.value();
            let count = histogram.get_count();
            let sum = histogram.get_sum();
            histograms.insert(
                entry.key().clone(),
                json!({
                    "count": count,
                    "sum": sum,
                    "avg": if count == 0 { 0.0 } else { sum / count as f64 },
                }),
            );
        }

        json!({
            "counters": counters,
            "gauges": gauges,
            "histograms": histograms,
        })
    }
}

lazy_static::lazy_static! {
    pub static ref METRICS: MetricsRegistry = MetricsRegistry::new();
    pub static ref BUSINESS_METRICS: BusinessMetrics = BusinessMetrics::new();
}

pub fn increment_counter(name: &str) {
    METRICS.get_or_create_counter(name).inc();
}

pub fn increment_counter_by(name: &str, value: u64) {
    METRICS.get_or_create_counter(name).inc_by(value);
}

pub fn set_gauge(name: &str, value: f64) {
    METRICS.get_or_create_gauge(name).set(value);
}

pub fn observe_histogram(name: &str, value: f64) {
    METRICS.get_or_create_histogram(name).observe(value);
}

pub struct BusinessMetrics {
    pub orders_placed: Counter,
    pub orders_cancelled: Counter,
    pub orders_completed: Counter,
    pub tables_collected: Counter,
    pub collected_revenue: Gauge,
    pub orders_archived: Counter,
    pub backups_written: Counter,
    pub backups_failed: Counter,
    pub menu_cache_hits: Counter,
    pub menu_cache_misses: Counter,
    pub chat_messages: Counter,
}

impl BusinessMetrics {
    pub fn new() -> Self {
        Self {
            orders_placed: METRICS.get_or_create_counter("orders_placed_total"),
            orders_cancelled: METRICS.get_or_create_counter("orders_cancelled_total"),
            orders_completed: METRICS.get_or_create_counter("orders_completed_total"),
            tables_collected: METRICS.get_or_create_counter("table_collections_total"),
            collected_revenue: METRICS.get_or_create_gauge("table_collected_revenue"),
            orders_archived: METRICS.get_or_create_counter("orders_archived_total"),
            backups_written: METRICS.get_or_create_counter("backups_written_total"),
            backups_failed: METRICS.get_or_create_counter("backups_failed_total"),
            menu_cache_hits: METRICS.get_or_create_counter("menu_cache_hits_total"),
            menu_cache_misses: METRICS.get_or_create_counter("menu_cache_misses_total"),
            chat_messages: METRICS.get_or_create_counter("chat_messages_total"),
        }
    }

    pub fn record_order_placed(&self) {
        self.orders_placed.inc();
    }

    pub fn record_order_cancelled(&self) {
        self.orders_cancelled.inc();
    }

    pub fn record_orders_completed(&self, count: u64) {
        self.orders_completed.inc_by(count);
    }

    pub fn record_table_collected(&self, amount: Decimal) {
        self.tables_collected.inc();
        self.collected_revenue.add(amount.to_f64().unwrap_or(0.0));
    }

    pub fn record_orders_archived(&self, count: u64) {
        self.orders_archived.inc_by(count);
    }

    pub fn record_backup(&self, success: bool) {
        if success {
            self.backups_written.inc();
        } else {
            self.backups_failed.inc();
        }
    }

    pub fn record_menu_cache(&self, hit: bool) {
        if hit {
            self.menu_cache_hits.inc();
        } else {
            self.menu_cache_misses.inc();
        }
    }

    pub fn record_chat_message(&self) {
        self.chat_messages.inc();
    }
}

impl Default for BusinessMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Records count, status class and latency of every request keyed by its matched route.
pub async fn track_http_metrics(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    record_http_request(method.as_str(), &route, response.status(), started.elapsed());
    response
}

pub fn record_http_request(method: &str, route: &str, status: StatusCode, elapsed: Duration) {
    let labels = format!("method=\"{}\",route=\"{}\"", method, route);
    increment_counter(&format!("http_requests_total{{{}}}", labels));
    observe_histogram(
        &format!("http_request_duration_seconds{{{}}}", labels),
        elapsed.as_secs_f64(),
    );

    let class = match status.as_u16() {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    };
    increment_counter(&format!("http_responses_total{{status=\"{}\"}}", class));

    if elapsed >= Duration::from_secs(1) {
        increment_counter("http_slow_requests_total");
        tracing::warn!(%method, %route, elapsed_ms = elapsed.as_millis() as u64, "slow request");
    }
}

pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        METRICS.export_metrics(),
    )
}

pub async fn metrics_json_handler() -> impl IntoResponse {
    Json(METRICS.export_metrics_json())
}
