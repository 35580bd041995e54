use serde::{Deserialize, Serialize};

/// Room domain model - a shared household with members and chores
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Room {
    pub room_id: String,
    pub name: String,
    pub description: String,

    /// Six character code other roomies use to join
    pub access_code: String,

    pub created_by: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoomPayload {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoomPayload {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JoinRoomPayload {
    pub access_code: String,
}
