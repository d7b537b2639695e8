/// Request metrics for backend endpoints
///
/// Tracks success rates, latency and failure categories per endpoint

use crate::error::{ApiError, ErrorKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointMetrics {
    pub endpoint: String,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub average_response_time_ms: f64,
    pub total_response_time_ms: u64,
    pub auth_expirations: u64,
    pub server_rejections: u64,
    pub network_failures: u64,
    pub invalid_requests: u64,
    pub timeout_count: u64,
}

impl EndpointMetrics {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            last_success: None,
            last_failure: None,
            last_error: None,
            average_response_time_ms: 0.0,
            total_response_time_ms: 0,
            auth_expirations: 0,
            server_rejections: 0,
            network_failures: 0,
            invalid_requests: 0,
            timeout_count: 0,
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            (self.successful_requests as f64 / self.total_requests as f64) * 100.0
        }
    }

    pub fn record_success(&mut self, response_time: Duration) {
        self.total_requests += 1;
        self.successful_requests += 1;
        self.last_success = Some(Utc::now());

        let response_ms = response_time.as_millis() as u64;
        self.total_response_time_ms += response_ms;
        self.average_response_time_ms =
            self.total_response_time_ms as f64 / self.successful_requests as f64;
    }

    pub fn record_failure(&mut self, error: &ApiError) {
        self.total_requests += 1;
        self.failed_requests += 1;
        self.last_failure = Some(Utc::now());
        self.last_error = Some(error.message.clone());

        match error.kind {
            ErrorKind::AuthenticationExpired => self.auth_expirations += 1,
            ErrorKind::ServerRejected => self.server_rejections += 1,
            ErrorKind::NetworkUnreachable => {
                self.network_failures += 1;
                if error.timed_out {
                    self.timeout_count += 1;
                }
            }
            ErrorKind::RequestInvalid => self.invalid_requests += 1,
        }
    }
}

/// Shared per-endpoint metrics
#[derive(Clone, Default)]
pub struct MetricsTracker {
    metrics: Arc<Mutex<HashMap<String, EndpointMetrics>>>,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, EndpointMetrics>> {
        self.metrics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record_success(&self, endpoint: &str, response_time: Duration) {
        let mut metrics = self.lock();
        let endpoint_metrics = metrics
            .entry(endpoint.to_string())
            .or_insert_with(|| EndpointMetrics::new(endpoint.to_string()));
        endpoint_metrics.record_success(response_time);

        log::debug!(
            "[{}] {}ms - success rate {:.2}%",
            endpoint,
            response_time.as_millis(),
            endpoint_metrics.success_rate()
        );
    }

    pub fn record_failure(&self, endpoint: &str, error: &ApiError) {
        let mut metrics = self.lock();
        let endpoint_metrics = metrics
            .entry(endpoint.to_string())
            .or_insert_with(|| EndpointMetrics::new(endpoint.to_string()));
        endpoint_metrics.record_failure(error);

        log::debug!(
            "[{}] {:?}: {} - success rate {:.2}%",
            endpoint,
            error.kind,
            error.message,
            endpoint_metrics.success_rate()
        );
    }

    pub fn get_metrics(&self, endpoint: &str) -> Option<EndpointMetrics> {
        self.lock().get(endpoint).cloned()
    }

    pub fn get_all_metrics(&self) -> Vec<EndpointMetrics> {
        self.lock().values().cloned().collect()
    }

    pub fn export_json(&self) -> String {
        let metrics = self.lock();
        serde_json::to_string_pretty(&*metrics).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metrics_creation() {
        let metrics = EndpointMetrics::new("GET mangas".to_string());
        assert_eq!(metrics.endpoint, "GET mangas");
        assert_eq!(metrics.total_requests, 0);
        assert_eq!(metrics.success_rate(), 0.0);
    }

    #[test]
    fn test_failures_counted_by_kind() {
        let mut metrics = EndpointMetrics::new("GET mangas".to_string());
        metrics.record_failure(&ApiError::timed_out());
        metrics.record_failure(&ApiError::network_unreachable());
        metrics.record_failure(&ApiError::server_rejected(429, json!({"message": "slow"})));
        metrics.record_failure(&ApiError::authentication_expired(json!({})));

        assert_eq!(metrics.failed_requests, 4);
        assert_eq!(metrics.network_failures, 2);
        assert_eq!(metrics.timeout_count, 1);
        assert_eq!(metrics.server_rejections, 1);
        assert_eq!(metrics.auth_expirations, 1);
        assert_eq!(metrics.last_error.as_deref(), Some("Request failed with status code 401"));
    }

    #[test]
    fn test_success_rate_calculation() {
        let mut metrics = EndpointMetrics::new("GET mangas".to_string());

        metrics.record_success(Duration::from_millis(100));
        metrics.record_success(Duration::from_millis(200));
        metrics.record_failure(&ApiError::request_invalid("bad url"));

        assert_eq!(metrics.total_requests, 3);
        assert_eq!(metrics.invalid_requests, 1);
        assert!((metrics.success_rate() - 66.66).abs() < 0.1);
        assert!((metrics.average_response_time_ms - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tracker() {
        let tracker = MetricsTracker::new();

        tracker.record_success("GET mangas", Duration::from_millis(100));
        tracker.record_failure("POST auth/login", &ApiError::network_unreachable());

        assert_eq!(tracker.get_metrics("GET mangas").unwrap().success_rate(), 100.0);
        assert_eq!(tracker.get_metrics("POST auth/login").unwrap().success_rate(), 0.0);
        assert_eq!(tracker.get_all_metrics().len(), 2);
        assert!(tracker.export_json().contains("POST auth/login"));
    }
}
