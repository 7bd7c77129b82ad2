// src/player/mod.rs

mod session;
mod transport;

pub use session::{CompletionEvent, MediaKind, PlaybackSession, PlaybackState};
pub use transport::{TransportOutcome, run_transport};
