//! Graphics backend implementations
//!
//! Only the headless backend ships with the engine; it records commands
//! instead of submitting them and is used by tests, tools and the demo.

pub mod headless;

pub use headless::{HeadlessDevice, RecordedCommand, RecordingEncoder};
