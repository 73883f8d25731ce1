use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::id::SpanId;
use crate::status::SpanStatus;
use crate::step::Step;

/// An immutable causal node in a trace.
///
/// A span is created `running` and finalized exactly once via
/// [`Span::complete`]/[`Span::fail`]/[`Span::error`]; nothing else mutates a
/// span after creation (§3 "Lifecycle and ownership").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub id: SpanId,
    pub parent: Option<SpanId>,
    pub step: Step,
    pub timestamp_ms: i64,
    pub summary: String,
    pub status: SpanStatus,
    pub meta: BTreeMap<String, Value>,
    pub completed_ms: Option<i64>,
}

impl Span {
    pub fn root(id: SpanId, step: Step, timestamp_ms: i64, summary: impl Into<String>) -> Self {
        Self {
            id,
            parent: None,
            step,
            timestamp_ms,
            summary: summary.into(),
            status: SpanStatus::Running,
            meta: BTreeMap::new(),
            completed_ms: None,
        }
    }

    pub fn child(
        id: SpanId,
        parent: SpanId,
        step: Step,
        timestamp_ms: i64,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            id,
            parent: Some(parent),
            step,
            timestamp_ms,
            summary: summary.into(),
            status: SpanStatus::Running,
            meta: BTreeMap::new(),
            completed_ms: None,
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    /// Finalize as completed. No-op on an already-terminal span other than
    /// overwriting summary/completed_ms — callers must only call this once.
    pub fn complete(&mut self, completed_ms: i64, summary: impl Into<String>) {
        self.status = SpanStatus::Completed;
        self.summary = summary.into();
        self.completed_ms = Some(completed_ms);
    }

    pub fn fail(&mut self, completed_ms: i64, summary: impl Into<String>) {
        self.status = SpanStatus::Failed;
        self.summary = summary.into();
        self.completed_ms = Some(completed_ms);
    }

    pub fn error(&mut self, completed_ms: i64, summary: impl Into<String>) {
        self.status = SpanStatus::Error;
        self.summary = summary.into();
        self.completed_ms = Some(completed_ms);
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Structured fields for a log line, mirroring this span's identity and
    /// outcome without the full meta payload.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("span_id", self.id.to_string()),
            ("step", self.step.to_string()),
            ("status", self.status.to_string()),
        ]
    }
}

#[cfg(test)]
#[path = "span_tests.rs"]
mod tests;
