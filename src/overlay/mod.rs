//! Overlay lifecycle coordination.
//!
//! The coordinator walks the panel through Closed → Opening → Open →
//! Closing → Closed, expressing every wait (next tick, layout frames, the
//! double-tap guard, the close transition) as a named wake delivered back
//! through an injected scheduler. All host mutation goes through the
//! [`OverlayHost`] trait; tests drive the machine with the in-process
//! [`SimulatedScheduler`].

mod audit;
mod core;
mod scheduler;

pub use audit::{
    MemoryOverlayAudit, NullOverlayAudit, OverlayAudit, OverlayAuditEvent, OverlayAuditStage,
};
pub use core::{
    CloseReason, DEFAULT_INTERACTION_DELAY, OverlayConfig, OverlayCoordinator, OverlayHost,
    OverlayState,
};
pub use scheduler::{Scheduler, SimulatedScheduler, Wake};
