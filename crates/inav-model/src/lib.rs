//! `inav-model` — the building model the router navigates against.
//!
//! # Crate layout
//!
//! | Module        | Contents                                             |
//! |---------------|------------------------------------------------------|
//! | [`collision`] | `CollisionDetector`: buffered obstacles, door holes, line-of-sight |
//! | [`rooms`]     | `RoomDoorModel`: room index, door nodes, public/private classification |
//!
//! Everything here is built once during engine initialization and read-only
//! afterwards; concurrent readers need no locking.  There is no error type:
//! malformed geometry is handled by drop-and-log inside the builders, and
//! lookups return `Option`/empty slices.

pub mod collision;
pub mod rooms;

#[cfg(test)]
mod tests;

pub use collision::{CollisionDetector, DOOR_CLEARANCE_M, Obstacle, WALL_BUFFER_M};
pub use rooms::{DoorSet, ROOM_BUFFER_M, Room, RoomDoorModel, RoomMeta, RoomThresholds};
