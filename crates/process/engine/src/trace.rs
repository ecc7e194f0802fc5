//! Trace log: a bounded record of what happened on each tick
//!
//! A stalled process is the usual failure mode of a miswired graph, and
//! it raises no error. The trace keeps the transitions, faults and event
//! firings that lead up to the stall so they can be inspected after the
//! fact. Records are also mirrored to `tracing` at `trace` level.

use crate::container::{TaskFault, TickReport, Transition};
use chrono::{DateTime, Utc};
use process_types::RunState;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// What a trace record describes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceEvent {
    Transition { from: RunState, to: RunState },
    Fault,
    EventFired,
}

impl std::fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transition { from, to } => write!(f, "{from} -> {to}"),
            Self::Fault => f.write_str("fault"),
            Self::EventFired => f.write_str("event fired"),
        }
    }
}

/// A single trace entry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraceRecord {
    pub epoch: u64,
    /// Element id the record is about
    pub element: String,
    pub event: TraceEvent,
    pub detail: String,
    pub recorded_at: DateTime<Utc>,
}

impl TraceRecord {
    pub fn new(
        epoch: u64,
        element: impl Into<String>,
        event: TraceEvent,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            epoch,
            element: element.into(),
            event,
            detail: detail.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// Ring buffer of trace records; the oldest record is dropped first
#[derive(Clone, Debug)]
pub struct TraceLog {
    records: VecDeque<TraceRecord>,
    capacity: usize,
}

impl TraceLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity,
        }
    }

    pub fn record(&mut self, record: TraceRecord) {
        if self.capacity == 0 {
            return;
        }
        tracing::trace!(
            epoch = record.epoch,
            element = %record.element,
            event = %record.event,
            "Trace recorded"
        );
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn record_transition(&mut self, transition: &Transition) {
        self.record(TraceRecord::new(
            transition.epoch,
            transition.element.as_str(),
            TraceEvent::Transition {
                from: transition.from,
                to: transition.to,
            },
            format!("{} -> {}", transition.from, transition.to),
        ));
    }

    pub fn record_fault(&mut self, fault: &TaskFault) {
        self.record(TraceRecord::new(
            fault.epoch,
            fault.task.as_str(),
            TraceEvent::Fault,
            fault.message.as_str(),
        ));
    }

    pub fn record_event(&mut self, epoch: u64, event: &str) {
        self.record(TraceRecord::new(
            epoch,
            event,
            TraceEvent::EventFired,
            format!("Event '{event}' fired"),
        ));
    }

    /// Record everything a tick reported
    pub fn record_tick(&mut self, report: &TickReport) {
        for fault in &report.faults {
            self.record_fault(fault);
        }
        for transition in &report.transitions {
            self.record_transition(transition);
        }
        for event in &report.fired_events {
            self.record_event(report.epoch, event);
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &TraceRecord> {
        self.records.iter()
    }

    /// Records about one element, oldest first
    pub fn events_for<'a>(&'a self, element: &'a str) -> impl Iterator<Item = &'a TraceRecord> {
        self.records.iter().filter(move |r| r.element == element)
    }

    /// The states an element entered, in order
    pub fn states_of(&self, element: &str) -> Vec<RunState> {
        self.events_for(element)
            .filter_map(|r| match r.event {
                TraceEvent::Transition { to, .. } => Some(to),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
