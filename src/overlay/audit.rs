//! Overlay lifecycle audit hooks.
//!
//! Lightweight instrumentation so callers can observe the coordinator's
//! transitions. Records capture a stage identifier plus structured metadata
//! so downstream code can log, buffer, or assert on the overlay's
//! progression without touching the state machine itself.

use std::sync::Mutex;
use std::time::SystemTime;

use serde_json::Value;

/// Distinct lifecycle checkpoints emitted by `OverlayCoordinator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayAuditStage {
    /// An open request was accepted.
    ShowRequested,
    /// Backdrop and panel were mounted into the parent.
    PanelMounted,
    /// Geometry was computed and handed to the host.
    PlacementApplied,
    /// Click interactions were armed after the double-tap guard.
    InteractionActivated,
    /// The open transition finished.
    OpenFinished,
    /// A close was requested.
    CloseStarted,
    /// Panel and backdrop were torn down.
    Unmounted,
    /// A deferred wake arrived after removal and was dropped.
    WakeSkipped,
}

/// Structured audit entry.
#[derive(Debug, Clone)]
pub struct OverlayAuditEvent {
    pub timestamp: SystemTime,
    pub stage: OverlayAuditStage,
    pub details: Vec<(String, Value)>,
}

impl OverlayAuditEvent {
    pub fn new(stage: OverlayAuditStage) -> Self {
        Self {
            timestamp: SystemTime::now(),
            stage,
            details: Vec::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details.push((key.into(), value));
        self
    }
}

/// Trait implemented by any audit sink.
pub trait OverlayAudit: Send + Sync {
    fn record(&self, event: OverlayAuditEvent);
}

/// Default no-op implementation used when auditing is disabled.
#[derive(Debug, Default)]
pub struct NullOverlayAudit;

impl OverlayAudit for NullOverlayAudit {
    fn record(&self, _event: OverlayAuditEvent) {}
}

/// Buffers audit events in memory; used by tests.
#[derive(Debug, Default)]
pub struct MemoryOverlayAudit {
    events: Mutex<Vec<OverlayAuditEvent>>,
}

impl MemoryOverlayAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OverlayAuditEvent> {
        self.events.lock().expect("audit mutex poisoned").clone()
    }

    pub fn stages(&self) -> Vec<OverlayAuditStage> {
        self.events().into_iter().map(|event| event.stage).collect()
    }
}

impl OverlayAudit for MemoryOverlayAudit {
    fn record(&self, event: OverlayAuditEvent) {
        self.events
            .lock()
            .expect("audit mutex poisoned")
            .push(event);
    }
}
