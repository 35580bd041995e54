use serde::{Deserialize, Serialize};

/// Roomie domain model - a member profile bound to one authenticated identity
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Roomie {
    pub roomie_id: String,
    pub name: String,

    /// Auth identity (Cognito subject) this profile belongs to
    pub user_id: String,

    pub avatar: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoomiePayload {
    pub name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoomiePayload {
    pub name: Option<String>,
    pub avatar: Option<String>,
}
