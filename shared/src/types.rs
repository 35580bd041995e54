// ========== ROOM ==========
pub use allfreedo_atoms::rooms::model::{CreateRoomPayload, JoinRoomPayload, Room, UpdateRoomPayload};

// ========== ROOMIE ==========
pub use allfreedo_atoms::roomies::model::{CreateRoomiePayload, Roomie, UpdateRoomiePayload};

// ========== TASK ==========
pub use allfreedo_atoms::tasks::model::{CreateTaskPayload, Task, TaskFilters, UpdateTaskPayload};

// ========== TASK TEMPLATE ==========
pub use allfreedo_atoms::templates::model::{
    CreateTemplatePayload, TaskTemplate, UpdateTemplatePayload,
};

// ========== TASK RATING ==========
pub use allfreedo_atoms::ratings::model::{RatePayload, TaskRating, UpdateRatingPayload};

// ========== SCHEDULING ==========
pub use scheduling_block::{Frequency, NoAssigneeAvailable, RecurrenceRule};
