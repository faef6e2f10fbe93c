mod gate;

pub use gate::{CaptureGate, CaptureGuard};
