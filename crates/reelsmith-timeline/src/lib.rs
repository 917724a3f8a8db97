//! reelsmith Timeline - frame arithmetic for documentary compositions
//!
//! Everything here is a pure function of its inputs and the current frame
//! number: springs, easing, interpolation, chapter placement with cross-fade
//! transitions, Ken Burns moves and caption timing. A renderer can evaluate
//! any frame in any order and get the same result.

pub mod captions;
pub mod ease;
pub mod effects;
pub mod interpolate;
pub mod layout;
pub mod script;
pub mod spring;
pub mod timing;

pub use captions::{CaptionTrack, CaptionWord};
pub use ease::Ease;
pub use interpolate::{interpolate, Extrapolate};
pub use layout::{ChapterDefinition, ChapterSection, FramePosition, Timeline};
pub use script::{NarrationEntry, NarrationScript};
pub use spring::{spring, SpringConfig};
pub use timing::{frames_to_seconds, seconds_to_frames, FPS};
