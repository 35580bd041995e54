//! Scheduling over rooms: recurrence evaluation, round-robin assignment and
//! the template-to-task spawning that combines the two.

pub mod recurrence;
pub mod rotation;
pub mod templates;

pub use recurrence::{
    describe_rule, describe_serialized_rule, is_due_on, next_occurrence, parse_rule, Frequency,
    RecurrenceRule,
};
pub use rotation::{select_next_assignee, NoAssigneeAvailable};
