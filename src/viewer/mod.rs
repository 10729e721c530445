mod clock;
mod state;

pub use clock::FrameClock;
pub use state::{KeyOutcome, Viewer};
