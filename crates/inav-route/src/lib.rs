//! `inav-route` — graph search and route post-processing.
//!
//! # Crate layout
//!
//! | Module            | Contents                                          |
//! |-------------------|---------------------------------------------------|
//! | [`astar`]         | `find_path`, `SearchOptions`, `PathResult`        |
//! | [`bidirectional`] | `find_path_bidirectional`                         |
//! | [`smoother`]      | Douglas-Peucker `simplify`, `smooth_with_floors`  |
//! | [`instructions`]  | turn-by-turn `generate`                           |
//! | [`error`]         | `RouteError`, `RouteResult<T>`                    |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                    |
//! |---------|-----------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on results/instructions |

pub mod astar;
pub mod bidirectional;
pub mod error;
pub mod instructions;
pub mod smoother;


pub use astar::{FLOOR_CHANGE_PENALTY_M, PathResult, SearchOptions, Segment, find_path};
pub use bidirectional::find_path_bidirectional;
pub use error::{RouteError, RouteResult};
pub use instructions::{Instruction, InstructionKind, generate};
pub use smoother::{SPLINE_RESOLUTION, simplify, smooth_with_floors};
