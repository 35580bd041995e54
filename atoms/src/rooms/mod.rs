
// Re-export model types and service functions
pub mod http;
pub mod model;
pub mod service;

pub use model::{CreateRoomPayload, JoinRoomPayload, Room, UpdateRoomPayload};
pub use service::*;
