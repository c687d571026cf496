//! Overlay placement engine.
//!
//! A single pure function maps a layout measurement and an anchor mode to
//! the panel position, content scroll, and entry animation parameters.
//! The host applies the result verbatim; nothing here touches host state.

mod core;

pub use core::{
    AnchorMode, EDGE_MARGIN, EntryScale, OverlayMeasurement, Placement, TransformOrigin,
    compute_placement, inset_bounds,
};
