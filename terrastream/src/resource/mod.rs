//! Render resource lifetime management.
//!
//! Every resource created on the render side goes onto a [`ResourceStack`]
//! and is destroyed exactly once, newest first.

mod stack;

pub use stack::{GpuResource, ResourceId, ResourceStack, StackError};
