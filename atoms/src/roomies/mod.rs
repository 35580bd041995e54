pub mod model;
pub mod service;

pub use model::{CreateRoomiePayload, Roomie, UpdateRoomiePayload};
pub use service::*;
