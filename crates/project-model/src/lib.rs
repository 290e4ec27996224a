//! Longform Project Model
//!
//! Defines the data contracts for narrated long-form videos:
//! - **Project:** chapters and segments in playback order
//! - **Effect:** named camera motions and their control values
//! - **Framing:** focal point and zoom over a still image
//! - **Layout:** where images, narration, clips, and music live on disk
//!
//! Focal coordinates are normalized to `[0.0, 1.0]` relative to the image
//! so the same description works for any source resolution.

pub mod effect;
pub mod framing;
pub mod layout;
pub mod project;

pub use effect::*;
pub use framing::*;
pub use layout::*;
pub use project::*;
