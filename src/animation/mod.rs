// Keyframe sampling, per-clip playback and CPU skinning

pub mod interpolation;
pub mod player;
pub mod skeleton;
pub mod skinning;
pub mod system;

pub use player::LoopState;
pub use system::AnimationSystem;
