//! Lazy, concurrency-bounded chart rendering.
//!
//! [`LazyRenderer`] is the reference implementation of the protocol that the
//! browser loader (`assets/lazy-loader.js`) runs. It never talks to a DOM
//! directly; every effect goes through a [`RenderHost`], and every event
//! (an anchor became visible, the host granted a drain pass, a render settled)
//! is fed back in by the caller. That keeps ordering explicit and lets tests
//! drive the state machine step by step with [`sim::SimHost`].
//!
//! Task lifecycle: `Queued -> Observed -> Dispatched -> Settled`.
//!
//! - Anchors are observed once; the first visibility event moves a task to the
//!   FIFO render queue. Without visibility support every task is queued eagerly.
//! - Drain passes are never run inline. They are requested from the host
//!   (idle callback with a timeout, or next tick) and coalesced.
//! - At most `max_concurrent` dispatches are in flight.
//! - A failed render shows an inline placeholder and frees its slot; other
//!   tasks are unaffected.
//! - There are no render timeouts: a render that never settles keeps its slot.

pub mod sim;

use crate::models::{ChartSpec, EmbeddedManifest};
use indexmap::IndexMap;
use log::{debug, error, warn};
use serde_json::Value;
use std::collections::VecDeque;

/// Upper bound handed to `requestIdleCallback`.
pub const IDLE_TIMEOUT_MS: u32 = 200;

/// How the host should schedule the next drain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainTrigger {
    /// Run when the host is idle, or after `timeout_ms` at the latest.
    Idle { timeout_ms: u32 },
    /// Run on the next event-loop turn.
    NextTick,
}

/// Environment the renderer runs in (a browser page, or a simulation).
pub trait RenderHost {
    /// The visualization runtime (vega-embed) is available.
    fn has_runtime(&self) -> bool;
    fn supports_visibility(&self) -> bool;
    fn supports_idle(&self) -> bool;

    fn observe(&mut self, anchor_id: &str, root_margin: &str);
    fn unobserve(&mut self, anchor_id: &str);
    fn schedule_drain(&mut self, trigger: DrainTrigger);
    /// Start an asynchronous render. Completion is reported back through
    /// [`LazyRenderer::on_settled`].
    fn dispatch(&mut self, anchor_id: &str, spec: &ChartSpec, embed_options: &Value);
    fn show_error(&mut self, anchor_id: &str, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Ok,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Queued,
    Observed,
    Dispatched,
    Settled(Settlement),
}

#[derive(Debug, Clone)]
struct RenderTask {
    spec: ChartSpec,
    state: TaskState,
}

/// Placeholder text shown in place of a chart that failed to render.
pub fn error_placeholder(anchor_id: &str, message: &str) -> String {
    format!("Chart {} failed to render: {}", anchor_id, message)
}

#[derive(Debug)]
pub struct LazyRenderer {
    tasks: IndexMap<String, RenderTask>,
    queue: VecDeque<String>,
    active: usize,
    peak_active: usize,
    drain_requested: bool,
    max_concurrent: usize,
    root_margin: String,
    embed_options: Value,
    dispatch_order: Vec<String>,
}

impl LazyRenderer {
    /// Build a renderer from the embedded manifest. A zero concurrency cap is
    /// raised to one so the queue can always make progress.
    pub fn new(manifest: EmbeddedManifest) -> Self {
        let mut tasks = IndexMap::with_capacity(manifest.specs.len());
        for s in manifest.specs {
            if tasks.contains_key(&s.id) {
                warn!("duplicate anchor `{}` in manifest, keeping the first", s.id);
                continue;
            }
            tasks.insert(
                s.id,
                RenderTask {
                    spec: s.spec,
                    state: TaskState::Queued,
                },
            );
        }
        Self {
            tasks,
            queue: VecDeque::new(),
            active: 0,
            peak_active: 0,
            drain_requested: false,
            max_concurrent: manifest.max_concurrent.max(1),
            root_margin: manifest.root_margin,
            embed_options: manifest.embed_options,
            dispatch_order: Vec::new(),
        }
    }

    /// Page entry point: validate the environment, parse the manifest and
    /// start. Any problem is logged and yields `None`; the page stays usable.
    pub fn boot<H: RenderHost>(host: &mut H, manifest_json: Option<&str>) -> Option<Self> {
        if !host.has_runtime() {
            error!("visualization runtime not available; charts will not render");
            return None;
        }
        let Some(text) = manifest_json else {
            error!("no chart manifest found on page");
            return None;
        };
        let manifest: EmbeddedManifest = match serde_json::from_str(text) {
            Ok(m) => m,
            Err(e) => {
                error!("unreadable chart manifest: {}", e);
                return None;
            }
        };
        let mut renderer = Self::new(manifest);
        renderer.start(host);
        Some(renderer)
    }

    /// Register anchors for visibility, or queue everything when the host
    /// cannot observe visibility.
    pub fn start<H: RenderHost>(&mut self, host: &mut H) {
        if host.supports_visibility() {
            for id in self.tasks.keys() {
                host.observe(id, &self.root_margin);
            }
        } else {
            debug!("no visibility observer, rendering {} charts eagerly", self.tasks.len());
            let ids: Vec<String> = self.tasks.keys().cloned().collect();
            for id in ids {
                self.enqueue(&id);
            }
            self.request_drain(host);
        }
    }

    /// Visibility callback for `anchor_id`. Only the first event counts.
    pub fn on_visible<H: RenderHost>(&mut self, host: &mut H, anchor_id: &str) {
        if !self.enqueue(anchor_id) {
            return;
        }
        if host.supports_visibility() {
            host.unobserve(anchor_id);
        }
        self.request_drain(host);
    }

    /// One drain pass, run when the host fires a scheduled [`DrainTrigger`].
    pub fn drain<H: RenderHost>(&mut self, host: &mut H) {
        self.drain_requested = false;
        while self.active < self.max_concurrent {
            let Some(id) = self.queue.pop_front() else {
                break;
            };
            let Some(task) = self.tasks.get_mut(&id) else {
                continue;
            };
            if task.state != TaskState::Observed {
                continue;
            }
            task.state = TaskState::Dispatched;
            self.active += 1;
            self.peak_active = self.peak_active.max(self.active);
            self.dispatch_order.push(id.clone());
            host.dispatch(&id, &task.spec, &self.embed_options);
        }
    }

    /// Completion callback for a dispatched render.
    pub fn on_settled<H: RenderHost>(
        &mut self,
        host: &mut H,
        anchor_id: &str,
        result: Result<(), String>,
    ) {
        let Some(task) = self.tasks.get_mut(anchor_id) else {
            warn!("settlement for unknown anchor `{}` ignored", anchor_id);
            return;
        };
        if task.state != TaskState::Dispatched {
            warn!(
                "settlement for `{}` in state {:?} ignored",
                anchor_id, task.state
            );
            return;
        }
        self.active -= 1;
        task.state = match result {
            Ok(()) => TaskState::Settled(Settlement::Ok),
            Err(message) => {
                error!("chart `{}` failed to render: {}", anchor_id, message);
                host.show_error(anchor_id, &error_placeholder(anchor_id, &message));
                TaskState::Settled(Settlement::Failed(message))
            }
        };
        self.request_drain(host);
    }

    /// `Queued -> Observed` plus a queue push. False when the anchor is
    /// unknown or already past `Queued`.
    fn enqueue(&mut self, anchor_id: &str) -> bool {
        match self.tasks.get_mut(anchor_id) {
            Some(task) if task.state == TaskState::Queued => {
                task.state = TaskState::Observed;
                self.queue.push_back(anchor_id.to_string());
                true
            }
            Some(_) => false,
            None => {
                warn!("visibility event for unknown anchor `{}`", anchor_id);
                false
            }
        }
    }

    fn request_drain<H: RenderHost>(&mut self, host: &mut H) {
        if self.drain_requested || self.queue.is_empty() {
            return;
        }
        self.drain_requested = true;
        let trigger = if host.supports_idle() {
            DrainTrigger::Idle {
                timeout_ms: IDLE_TIMEOUT_MS,
            }
        } else {
            DrainTrigger::NextTick
        };
        host.schedule_drain(trigger);
    }

    pub fn state(&self, anchor_id: &str) -> Option<&TaskState> {
        self.tasks.get(anchor_id).map(|t| &t.state)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Renders currently in flight.
    pub fn active(&self) -> usize {
        self.active
    }

    pub fn peak_active(&self) -> usize {
        self.peak_active
    }

    /// Tasks waiting in the render queue.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn settled_count(&self) -> usize {
        self.tasks
            .values()
            .filter(|t| matches!(t.state, TaskState::Settled(_)))
            .count()
    }

    pub fn failed(&self) -> Vec<&str> {
        self.tasks
            .iter()
            .filter(|(_, t)| matches!(t.state, TaskState::Settled(Settlement::Failed(_))))
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Every task has settled.
    pub fn is_finished(&self) -> bool {
        self.settled_count() == self.tasks.len()
    }

    /// Anchors in the order they were handed to the host.
    pub fn dispatch_order(&self) -> &[String] {
        &self.dispatch_order
    }
}

#[cfg(test)]
mod tests {
    use super::sim::SimHost;
    use super::*;
    use crate::models::SpecRef;
    use serde_json::json;

    fn manifest(n: usize, max_concurrent: usize) -> EmbeddedManifest {
        EmbeddedManifest {
            specs: (0..n)
                .map(|i| SpecRef {
                    id: format!("vis-T-{}", i),
                    spec: ChartSpec(json!({ "n": i })),
                })
                .collect(),
            embed_options: json!({}),
            max_concurrent,
            root_margin: "200px".into(),
        }
    }

    #[test]
    fn start_observes_every_anchor() {
        let mut host = SimHost::browser();
        let mut r = LazyRenderer::new(manifest(3, 2));
        r.start(&mut host);
        assert_eq!(host.observed.len(), 3);
        assert_eq!(r.queued(), 0);
        assert!(host.pending_drains.is_empty());
    }

    #[test]
    fn visibility_is_fire_once() {
        let mut host = SimHost::browser();
        let mut r = LazyRenderer::new(manifest(2, 2));
        r.start(&mut host);
        r.on_visible(&mut host, "vis-T-1");
        r.on_visible(&mut host, "vis-T-1");
        assert_eq!(r.queued(), 1);
        assert!(!host.observed.contains("vis-T-1"));
        assert_eq!(r.state("vis-T-1"), Some(&TaskState::Observed));
        assert_eq!(r.state("vis-T-0"), Some(&TaskState::Queued));
    }

    #[test]
    fn drain_requests_are_coalesced() {
        let mut host = SimHost::browser();
        let mut r = LazyRenderer::new(manifest(4, 2));
        r.start(&mut host);
        for i in 0..4 {
            r.on_visible(&mut host, &format!("vis-T-{}", i));
        }
        assert_eq!(host.pending_drains.len(), 1);
        assert_eq!(
            host.pending_drains[0],
            DrainTrigger::Idle {
                timeout_ms: IDLE_TIMEOUT_MS
            }
        );
    }

    #[test]
    fn drain_never_runs_inline() {
        let mut host = SimHost::browser();
        let mut r = LazyRenderer::new(manifest(1, 2));
        r.start(&mut host);
        r.on_visible(&mut host, "vis-T-0");
        assert!(host.in_flight.is_empty());
        r.drain(&mut host);
        assert_eq!(host.in_flight, ["vis-T-0"]);
    }

    #[test]
    fn settled_task_is_not_redispatched() {
        let mut host = SimHost::browser();
        let mut r = LazyRenderer::new(manifest(1, 1));
        r.start(&mut host);
        r.on_visible(&mut host, "vis-T-0");
        r.drain(&mut host);
        r.on_settled(&mut host, "vis-T-0", Ok(()));
        r.on_visible(&mut host, "vis-T-0");
        r.drain(&mut host);
        assert_eq!(r.dispatch_order(), ["vis-T-0"]);
        assert_eq!(r.state("vis-T-0"), Some(&TaskState::Settled(Settlement::Ok)));
    }

    #[test]
    fn stray_settlement_is_ignored() {
        let mut host = SimHost::browser();
        let mut r = LazyRenderer::new(manifest(2, 1));
        r.start(&mut host);
        r.on_settled(&mut host, "vis-T-0", Ok(()));
        r.on_settled(&mut host, "nope", Err("x".into()));
        assert_eq!(r.active(), 0);
        assert_eq!(r.settled_count(), 0);
        assert!(host.errors.is_empty());
    }

    #[test]
    fn zero_cap_is_raised_to_one() {
        let r = LazyRenderer::new(manifest(1, 0));
        assert_eq!(r.max_concurrent(), 1);
    }
}
