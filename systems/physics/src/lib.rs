#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Orientation and position state machines advanced by elapsed time.
//!
//! Both machines are registered with the scheduler as paused and resume
//! themselves only when a request leaves them with work to do. The scheduler
//! parks them again as soon as they report completion.

mod rotation;
mod translation;

pub use rotation::{bearing, Rotation, FULL_TURN};
pub use translation::Translation;
