//! Request metrics
//!
//! Counters and latency histograms per handler, rendered in the Prometheus
//! text exposition format for `/metrics`.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Mutex;
use std::time::Duration;

/// Histogram bucket upper bounds in seconds
pub const DURATION_BUCKETS: [f64; 7] = [0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0];

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct SeriesKey {
    handler: &'static str,
    method: String,
    code: u16,
}

#[derive(Debug, Default, Clone)]
struct Series {
    count: u64,
    sum: f64,
    buckets: [u64; DURATION_BUCKETS.len()],
}

/// Request metrics registry
#[derive(Debug)]
pub struct Metrics {
    version: &'static str,
    inflight: Mutex<BTreeMap<&'static str, i64>>,
    requests: Mutex<BTreeMap<SeriesKey, Series>>,
}

/// Decrements the in-flight gauge of its handler when dropped
pub struct InflightGuard<'a> {
    metrics: &'a Metrics,
    handler: &'static str,
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.metrics.add_inflight(self.handler, -1);
    }
}

impl Metrics {
    pub fn new(version: &'static str) -> Self {
        Self {
            version,
            inflight: Mutex::new(BTreeMap::new()),
            requests: Mutex::new(BTreeMap::new()),
        }
    }

    /// Count a request as in flight until the guard is dropped
    pub fn track_inflight(&self, handler: &'static str) -> InflightGuard<'_> {
        self.add_inflight(handler, 1);
        InflightGuard {
            metrics: self,
            handler,
        }
    }

    fn add_inflight(&self, handler: &'static str, delta: i64) {
        if let Ok(mut inflight) = self.inflight.lock() {
            *inflight.entry(handler).or_insert(0) += delta;
        }
    }

    /// Record a finished request
    pub fn observe(&self, handler: &'static str, method: &str, code: u16, elapsed: Duration) {
        let Ok(mut requests) = self.requests.lock() else {
            return;
        };
        let series = requests
            .entry(SeriesKey {
                handler,
                method: method.to_string(),
                code,
            })
            .or_default();

        let secs = elapsed.as_secs_f64();
        series.count += 1;
        series.sum += secs;
        for (bucket, bound) in series.buckets.iter_mut().zip(DURATION_BUCKETS) {
            if secs <= bound {
                *bucket += 1;
            }
        }
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str("# HELP whoami_build_info Build information.\n");
        out.push_str("# TYPE whoami_build_info gauge\n");
        let _ = writeln!(out, "whoami_build_info{{version=\"{}\"}} 1", self.version);

        out.push_str("# HELP whoami_http_requests_inflight Requests currently being served.\n");
        out.push_str("# TYPE whoami_http_requests_inflight gauge\n");
        if let Ok(inflight) = self.inflight.lock() {
            for (handler, value) in inflight.iter() {
                let _ = writeln!(
                    out,
                    "whoami_http_requests_inflight{{handler=\"{handler}\"}} {value}"
                );
            }
        }

        let Ok(requests) = self.requests.lock() else {
            return out;
        };

        out.push_str("# HELP whoami_http_requests_total Requests served.\n");
        out.push_str("# TYPE whoami_http_requests_total counter\n");
        for (key, series) in requests.iter() {
            let _ = writeln!(
                out,
                "whoami_http_requests_total{{{}}} {}",
                key.labels(),
                series.count
            );
        }

        out.push_str(
            "# HELP whoami_http_request_duration_seconds Time until the response head was ready.\n",
        );
        out.push_str("# TYPE whoami_http_request_duration_seconds histogram\n");
        for (key, series) in requests.iter() {
            let labels = key.labels();
            for (bound, bucket) in DURATION_BUCKETS.iter().zip(series.buckets) {
                let _ = writeln!(
                    out,
                    "whoami_http_request_duration_seconds_bucket{{{labels},le=\"{bound}\"}} {bucket}"
                );
            }
            let _ = writeln!(
                out,
                "whoami_http_request_duration_seconds_bucket{{{labels},le=\"+Inf\"}} {}",
                series.count
            );
            let _ = writeln!(
                out,
                "whoami_http_request_duration_seconds_sum{{{labels}}} {}",
                series.sum
            );
            let _ = writeln!(
                out,
                "whoami_http_request_duration_seconds_count{{{labels}}} {}",
                series.count
            );
        }

        out
    }
}

impl SeriesKey {
    fn labels(&self) -> String {
        format!(
            "code=\"{}\",handler=\"{}\",method=\"{}\"",
            self.code, self.handler, self.method
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_info() {
        let metrics = Metrics::new("1.2.3");
        assert!(metrics
            .render()
            .contains("whoami_build_info{version=\"1.2.3\"} 1"));
    }

    #[test]
    fn test_counter_and_histogram() {
        let metrics = Metrics::new("test");
        metrics.observe("/data", "GET", 200, Duration::from_millis(20));
        metrics.observe("/data", "GET", 200, Duration::from_millis(700));
        metrics.observe("/data", "GET", 400, Duration::from_millis(1));

        let text = metrics.render();
        assert!(text.contains(
            "whoami_http_requests_total{code=\"200\",handler=\"/data\",method=\"GET\"} 2"
        ));
        assert!(text.contains(
            "whoami_http_requests_total{code=\"400\",handler=\"/data\",method=\"GET\"} 1"
        ));
        assert!(text.contains(
            "whoami_http_request_duration_seconds_bucket{code=\"200\",handler=\"/data\",method=\"GET\",le=\"0.05\"} 1"
        ));
        assert!(text.contains(
            "whoami_http_request_duration_seconds_bucket{code=\"200\",handler=\"/data\",method=\"GET\",le=\"1\"} 2"
        ));
        assert!(text.contains(
            "whoami_http_request_duration_seconds_bucket{code=\"200\",handler=\"/data\",method=\"GET\",le=\"+Inf\"} 2"
        ));
    }

    #[test]
    fn test_inflight_guard() {
        let metrics = Metrics::new("test");
        {
            let _guard = metrics.track_inflight("/api");
            assert!(metrics
                .render()
                .contains("whoami_http_requests_inflight{handler=\"/api\"} 1"));
        }
        assert!(metrics
            .render()
            .contains("whoami_http_requests_inflight{handler=\"/api\"} 0"));
    }
}
