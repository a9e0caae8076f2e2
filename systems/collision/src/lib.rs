#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spatial lookup and penetration resolution against static sector geometry.
//!
//! [`SpatialGrid`] buckets obstacles into fixed-size square cells so movers
//! only test geometry near them. The free functions in [`resolve`] push a
//! circular mover out of a single obstacle; callers iterate them for a fixed
//! number of passes. [`sweep`] provides the segment tests used for projectile
//! hit detection.

pub mod grid;
pub mod resolve;
pub mod sweep;

pub use grid::{CellKey, SpatialGrid, DEFAULT_CELL_SIZE};
pub use resolve::{
    push_out_of_box, push_out_of_circle, resolve, resolve_all, DEFAULT_PASSES, RESOLVE_EPSILON,
};
pub use sweep::{segment_circle, sweep_obstacle, SweepHit};
