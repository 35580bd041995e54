use serde::{Deserialize, Serialize};

/// Task rating domain model - one roomie's stars on one completed task
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TaskRating {
    pub task_id: String,
    pub roomie_id: String,

    /// Stars, 1 to 5
    pub rating: u8,

    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct RatePayload {
    pub rating: u8,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRatingPayload {
    pub rating: u8,
}
