//! Room contract and room actor runtime (spec §4.4 room half, §6 Room
//! contract, §4.7).
//!
//! - [`RoomHandler`] / [`RoomHandlerFactory`]: the trait a room type
//!   implements and the object-safe factory that produces instances.
//! - [`room::RoomActor`] / [`RoomHandle`]: the Tokio-task-per-room
//!   runtime, grounded on the teacher's `arcforge_room::room` actor.
//! - [`HandlerRegistration`] / [`HandlerEvent`]: one registered room
//!   type's defaults, filters, and event emitter.

mod error;
mod handler;
mod registry;
mod room;

pub use error::RoomError;
pub use handler::{RoomHandler, RoomHandlerFactory};
pub use registry::{HandlerEvent, HandlerRegistration};
pub use room::{spawn_room, RoomEvent, RoomHandle};
