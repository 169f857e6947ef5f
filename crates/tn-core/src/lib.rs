//! tn-core: combat resolution and creature AI for the Tir na nOg server
//!
//! All combat logic with no I/O dependencies: spatial targeting, the
//! damage pipeline, status effects, threat, and the monster decision loop
//! with its pathfinder. The crate reaches the rest of the server only
//! through the collaborator traits in [`world`].
//!
//! Operations are synchronous and run to completion on whichever worker
//! thread invokes them; shared creature state sits behind per-creature
//! locks and a concurrent status map rather than message passing.

pub mod ability;
pub mod combat;
pub mod creature;
pub mod geometry;
pub mod monster;
pub mod status;
pub mod targeting;
pub mod threat;
pub mod world;

mod consts;
mod rng;

pub use combat::{CastError, CastOutcome, CombatContext, use_ability};
pub use consts::*;
pub use rng::CombatRng;
