//! Deterministic in-memory [`RenderHost`] and a small driver around it.
//!
//! `SimHost` records every effect the renderer asks for and fires nothing on
//! its own; the caller decides when a drain runs, when an anchor becomes
//! visible and when a render settles. [`run_to_completion`] is the canned
//! event loop used by `gallery simulate`.

use super::{DrainTrigger, LazyRenderer, RenderHost};
use crate::models::ChartSpec;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Observe(String),
    Unobserve(String),
    ScheduleDrain(DrainTrigger),
    Dispatch(String),
    ShowError(String),
}

#[derive(Debug, Clone, Default)]
pub struct SimHost {
    pub runtime: bool,
    pub visibility: bool,
    pub idle: bool,
    /// Anchors currently registered for visibility.
    pub observed: BTreeSet<String>,
    /// Drain triggers scheduled but not yet fired, oldest first.
    pub pending_drains: VecDeque<DrainTrigger>,
    /// Dispatched, unsettled renders in dispatch order.
    pub in_flight: Vec<String>,
    pub peak_in_flight: usize,
    /// Anchor -> placeholder text.
    pub errors: BTreeMap<String, String>,
    pub events: Vec<HostEvent>,
}

impl SimHost {
    /// Modern browser: runtime, IntersectionObserver and requestIdleCallback.
    pub fn browser() -> Self {
        Self {
            runtime: true,
            visibility: true,
            idle: true,
            ..Self::default()
        }
    }

    /// Runtime present but neither visibility nor idle callbacks.
    pub fn legacy() -> Self {
        Self {
            runtime: true,
            ..Self::default()
        }
    }

    /// Page where the vega scripts failed to load.
    pub fn without_runtime() -> Self {
        Self {
            visibility: true,
            idle: true,
            ..Self::default()
        }
    }

    /// Fire the oldest scheduled drain. False when none is pending.
    pub fn fire_drain(&mut self, renderer: &mut LazyRenderer) -> bool {
        match self.pending_drains.pop_front() {
            Some(_) => {
                renderer.drain(self);
                true
            }
            None => false,
        }
    }

    /// Settle the oldest in-flight render. False when nothing is in flight.
    pub fn settle_next(&mut self, renderer: &mut LazyRenderer, fail: &BTreeSet<String>) -> bool {
        if self.in_flight.is_empty() {
            return false;
        }
        let id = self.in_flight.remove(0);
        let result = if fail.contains(&id) {
            Err("simulated render failure".to_string())
        } else {
            Ok(())
        };
        renderer.on_settled(self, &id, result);
        true
    }
}

impl RenderHost for SimHost {
    fn has_runtime(&self) -> bool {
        self.runtime
    }

    fn supports_visibility(&self) -> bool {
        self.visibility
    }

    fn supports_idle(&self) -> bool {
        self.idle
    }

    fn observe(&mut self, anchor_id: &str, _root_margin: &str) {
        self.observed.insert(anchor_id.to_string());
        self.events.push(HostEvent::Observe(anchor_id.to_string()));
    }

    fn unobserve(&mut self, anchor_id: &str) {
        self.observed.remove(anchor_id);
        self.events.push(HostEvent::Unobserve(anchor_id.to_string()));
    }

    fn schedule_drain(&mut self, trigger: DrainTrigger) {
        self.pending_drains.push_back(trigger);
        self.events.push(HostEvent::ScheduleDrain(trigger));
    }

    fn dispatch(&mut self, anchor_id: &str, _spec: &ChartSpec, _embed_options: &Value) {
        self.in_flight.push(anchor_id.to_string());
        self.peak_in_flight = self.peak_in_flight.max(self.in_flight.len());
        self.events.push(HostEvent::Dispatch(anchor_id.to_string()));
    }

    fn show_error(&mut self, anchor_id: &str, message: &str) {
        self.errors.insert(anchor_id.to_string(), message.to_string());
        self.events.push(HostEvent::ShowError(anchor_id.to_string()));
    }
}

/// Outcome of [`run_to_completion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimReport {
    pub dispatch_order: Vec<String>,
    pub peak_in_flight: usize,
    pub drain_passes: usize,
    pub settled: usize,
    pub failed: Vec<String>,
    /// Anchors that never became visible and so never rendered.
    pub never_visible: Vec<String>,
}

/// Drive `renderer` until nothing is left to do.
///
/// Each step runs the first applicable action: fire a pending drain, settle
/// the oldest in-flight render, or reveal the next batch of anchors from
/// `reveal`. Anchors listed in `fail` settle with an error.
pub fn run_to_completion(
    renderer: &mut LazyRenderer,
    host: &mut SimHost,
    reveal: &[Vec<String>],
    fail: &BTreeSet<String>,
) -> SimReport {
    let mut batches = reveal.iter();
    let mut drain_passes = 0;
    loop {
        if host.fire_drain(renderer) {
            drain_passes += 1;
            continue;
        }
        if host.settle_next(renderer, fail) {
            continue;
        }
        match batches.next() {
            Some(batch) => {
                for id in batch {
                    renderer.on_visible(host, id);
                }
            }
            None => break,
        }
    }
    SimReport {
        dispatch_order: renderer.dispatch_order().to_vec(),
        peak_in_flight: host.peak_in_flight,
        drain_passes,
        settled: renderer.settled_count(),
        failed: renderer.failed().into_iter().map(String::from).collect(),
        never_visible: host.observed.iter().cloned().collect(),
    }
}
