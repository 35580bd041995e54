use serde::{Deserialize, Serialize};

/// Task domain model - one concrete chore with an assignee and a date
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Task {
    pub task_id: String,
    pub room_id: String,
    pub name: String,
    pub description: String,

    /// Importance from 1 (minor) to 5 (critical)
    pub weight: u8,

    pub assigned_roomie_id: String,

    /// Calendar date the chore is due, "YYYY-MM-DD"
    pub scheduled_date: String,

    pub is_done: bool,
    pub done_date: Option<String>,
    pub done_by: Option<String>,

    /// Set when the task was spawned from a template
    pub task_template_id: Option<String>,

    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskPayload {
    pub name: String,
    pub description: Option<String>,
    pub weight: u8,
    pub assigned_roomie_id: String,
    pub scheduled_date: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub weight: Option<u8>,
    pub assigned_roomie_id: Option<String>,
    pub scheduled_date: Option<String>,
}

/// Listing filters, all optional
#[derive(Debug, Default, Clone)]
pub struct TaskFilters {
    pub completed: Option<bool>,
    pub assigned_roomie_id: Option<String>,
    pub after_date: Option<String>,
    pub before_date: Option<String>,
}
