pub mod clock;
pub mod orchestrator;

pub use clock::ReferenceClock;
pub use orchestrator::{RequestOrchestrator, DEFAULT_OCR_TIMEOUT};
