use serde::{Deserialize, Serialize};

/// Task template domain model - a reusable chore definition
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TaskTemplate {
    pub template_id: String,
    pub room_id: String,
    pub name: String,
    pub description: String,
    pub weight: u8,

    pub recurring: bool,

    /// Serialized recurrence rule; opaque here, decoded by the scheduler
    pub recurrence_rule: Option<String>,

    /// Roomie who received the most recent task spawned from this template.
    /// Drives the round-robin rotation.
    pub last_assigned_roomie_id: Option<String>,

    pub created_by: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTemplatePayload {
    pub name: String,
    pub description: Option<String>,
    pub weight: u8,
    #[serde(default)]
    pub recurring: bool,
    pub recurrence_rule: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTemplatePayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub weight: Option<u8>,
    pub recurring: Option<bool>,
    pub recurrence_rule: Option<String>,
}
