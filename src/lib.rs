//! Headless engine for a floating select menu.
//!
//! The crate splits the widget into two independently testable halves: a
//! selection state controller that tracks options by derived hash keys
//! and mirrors the selected set into an externally owned model value, and
//! an overlay engine that computes panel placement as pure geometry and
//! drives the open/close lifecycle through injected host and scheduler
//! boundaries. Rendering, input, and timing all live on the host side;
//! nothing in here touches a real UI tree.

pub mod error;
pub mod geometry;
pub mod hash;
pub mod logging;
pub mod menu;
pub mod metrics;
pub mod overlay;
pub mod placement;
pub mod selection;

pub use error::{Result, SelectError};
pub use geometry::{Bounds, Point, Rect, Size};
pub use hash::{HashKey, IdentityArena, IdentityHasher, KeyPolicy, OptionValue};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use menu::SelectMenu;
pub use metrics::{MetricSnapshot, SelectMetrics};
pub use overlay::{
    CloseReason, DEFAULT_INTERACTION_DELAY, MemoryOverlayAudit, NullOverlayAudit, OverlayAudit,
    OverlayAuditEvent, OverlayAuditStage, OverlayConfig, OverlayCoordinator, OverlayHost,
    OverlayState, Scheduler, SimulatedScheduler, Wake,
};
pub use placement::{
    AnchorMode, EDGE_MARGIN, EntryScale, OverlayMeasurement, Placement, TransformOrigin,
    compute_placement, inset_bounds,
};
pub use selection::{
    BoundValue, ClickOutcome, MULTIPLE_VALIDATOR, MemoryModel, ModelBinding, OptionHandle,
    SelectionController, SharedBinding, SharedOption,
};
