//! Stream adapters for the console pipeline

mod frames;

pub use frames::FrameStream;
