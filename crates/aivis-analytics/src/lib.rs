//! Read-side analytics over visibility-check history.
//!
//! Everything here is a pure function over an already-loaded check slice
//! and an explicit `now`: no I/O, no clock reads, fully deterministic.
//! Callers (server, CLI) load a shop's history and pass it in.

mod positions;
mod share;
mod trend;
mod window;

pub use positions::{position_history, PositionHistory, PositionPoint};
pub use share::{share_of_voice, CompetitorShare, ShareOfVoice};
pub use trend::{trend_data, TrendPoint};
