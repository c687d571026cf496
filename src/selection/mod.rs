//! Selection state: option registry, selected set, model synchronization.
//!
//! The controller tracks live options by hash key, keeps an
//! insertion-ordered selected set, and mirrors it into the externally
//! bound model value. Selections may outlive their options (orphans) and
//! re-attach when a matching option mounts again.

mod core;

pub use core::{
    BoundValue, ClickOutcome, MemoryModel, ModelBinding, MULTIPLE_VALIDATOR, OptionHandle,
    SelectionController, SharedBinding, SharedOption,
};
