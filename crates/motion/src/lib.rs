//! Longform Motion: the Ken Burns resolver
//!
//! Turns named camera effects into time functions over a still image:
//! - **Resolve:** one effect over one duration, with frame-exact endpoints
//! - **Sequence:** several effects played back to back in equal frame slices
//!
//! This crate is pure computation: no I/O, no encoder. All inputs are data;
//! all outputs are data.

pub mod resolver;

pub use resolver::{
    resolve, resolve_segment, resolve_sequence, MotionFunction, MotionPlan, CANVAS_FPS,
    CANVAS_HEIGHT, CANVAS_WIDTH,
};
