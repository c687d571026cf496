//! Widget facade tying selection state to the overlay lifecycle.

mod core;

pub use core::SelectMenu;
