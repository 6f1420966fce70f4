pub mod render;

pub use render::{Dot, DotsRenderer, FrameStats, Scene};
