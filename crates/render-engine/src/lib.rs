//! Longform Render Engine
//!
//! Turns a project's images and narration into per-segment clips, then
//! concatenates those clips into a chaptered final video.
//!
//! # Pipeline Architecture
//!
//! ```text
//! images/S.png ──┐
//!                ├── Motion (zoompan per effect slice)
//! segments.json ─┘         │
//!                          ├── Narration (head delay, tail pad)
//! audio/S.mp3 ─────────────┘         │
//!                                    ├── Music bed (looped, mixed under)
//! music/track.mp3 ───────────────────┘         │
//!                                              ▼
//!                                   Encode (H.264/AAC) ──► clips/S.mp4
//!                                                               │
//!                                  concat demuxer (stream copy) ◄┘
//!                                              │
//!                                              ▼
//!                           final_video.mp4 + final_video.chapters.txt
//! ```

pub mod assemble;
pub mod encoder;
pub mod filter_graph;
pub mod review;
pub mod segment;
pub mod staging;

pub use assemble::{ChapterMarker, ClipOrder, FinalVideo, TimelineAssembler};
pub use encoder::{locate_binary, ClipHandle, FfmpegEncoder, MediaEncoder, MediaProbe, VideoStream};
pub use filter_graph::{EncodeKind, EncodePlan, EncodeSettings, MusicBed, RenderSpec};
pub use review::{review_clips, ClipReview, ClipReviewer, ReviewDecision};
pub use segment::{
    BatchEvent, BatchProgressCallback, BatchSummary, Clip, ClipStatus, SegmentOutcome,
    SegmentRenderer, SegmentReport, SingleRender,
};
