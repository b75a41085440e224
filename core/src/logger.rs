#![deny(missing_docs)]

//! # Phase Logger
//!
//! Scoped timing spans around the pipeline phases. `begin` hands out a token,
//! `end` closes it, records the elapsed time and emits a `tracing` event.

use serde::Serialize;
use std::time::{Duration, Instant};

/// Handle for an open timing span. Consumed by [`Logger::end`].
#[derive(Debug)]
#[must_use = "a timing span is only recorded when passed to Logger::end"]
pub struct TimingToken {
    name: String,
    depth: usize,
    started: Instant,
}

/// A closed timing span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseTiming {
    /// Phase name, e.g. `build-graph`.
    pub name: String,
    /// Nesting level at which the phase was opened.
    pub depth: usize,
    /// Wall-clock duration.
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}

/// Collects phase timings in completion order.
#[derive(Debug, Default)]
pub struct Logger {
    open: usize,
    timings: Vec<PhaseTiming>,
}

impl Logger {
    /// Creates an empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a timing span.
    pub fn begin(&mut self, name: &str) -> TimingToken {
        tracing::debug!(phase = name, "begin");
        let token = TimingToken {
            name: name.to_string(),
            depth: self.open,
            started: Instant::now(),
        };
        self.open += 1;
        token
    }

    /// Closes a timing span and records it.
    pub fn end(&mut self, token: TimingToken) {
        let elapsed = token.started.elapsed();
        self.open = self.open.saturating_sub(1);
        tracing::info!(
            phase = %token.name,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "phase complete"
        );
        self.timings.push(PhaseTiming {
            name: token.name,
            depth: token.depth,
            elapsed,
        });
    }

    /// Completed spans, innermost first for nested spans.
    pub fn timings(&self) -> &[PhaseTiming] {
        &self.timings
    }

    /// Names of completed spans, in completion order.
    pub fn phase_names(&self) -> Vec<&str> {
        self.timings.iter().map(|t| t.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_record_in_completion_order() {
        let mut logger = Logger::new();
        let outer = logger.begin("read-write-split");
        let inner = logger.begin("split-schemas");
        logger.end(inner);
        logger.end(outer);

        assert_eq!(logger.phase_names(), vec!["split-schemas", "read-write-split"]);
        assert_eq!(logger.timings()[0].depth, 1);
        assert_eq!(logger.timings()[1].depth, 0);
    }

    #[test]
    fn test_timing_serializes_millis() {
        let timing = PhaseTiming {
            name: "build-graph".into(),
            depth: 0,
            elapsed: Duration::from_millis(3),
        };
        let json = serde_json::to_value(&timing).unwrap();
        assert_eq!(json["name"], "build-graph");
        assert!((json["elapsed"].as_f64().unwrap() - 3.0).abs() < 1e-9);
    }
}
