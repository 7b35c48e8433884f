//! Programmer traits and abstractions
//!
//! This module defines the services the lock routine consumes: the single
//! command bus primitive, the bus suspension bracket and the wait-for-idle
//! policy.

mod suspend;
mod traits;

pub use suspend::*;
pub use traits::*;
