//! Position-indexed ring buffer bounding memory to a small multiple of the
//! maximum read length.

mod evicting;

pub use evicting::{PositionWindow, WindowStats};
