use std::fmt;

/// A task cannot be assigned because the room has no members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoAssigneeAvailable;

impl fmt::Display for NoAssigneeAvailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no roomies available for assignment")
    }
}

impl std::error::Error for NoAssigneeAvailable {}

/// Pick the roomie who should receive the next task spawned from a template.
///
/// `members` is the room membership in its stable store order and
/// `last_assigned` the roomie id persisted on the template after the previous
/// spawn. The rotation restarts at the first member when there is no prior
/// assignment or when the previously assigned roomie has left the room.
/// Pure; persisting the returned id back onto the template is the caller's
/// job.
pub fn select_next_assignee<'a>(
    members: &'a [String],
    last_assigned: Option<&str>,
) -> Result<&'a str, NoAssigneeAvailable> {
    let first = members.first().ok_or(NoAssigneeAvailable)?;
    let last = match last_assigned {
        Some(last) => last,
        None => return Ok(first),
    };
    match members.iter().position(|id| id == last) {
        Some(index) => Ok(&members[(index + 1) % members.len()]),
        None => Ok(first),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn advances_to_the_member_after_the_last_assigned() {
        let m = members(&["a", "b", "c"]);
        assert_eq!(select_next_assignee(&m, Some("b")), Ok("c"));
    }

    #[test]
    fn wraps_around_from_the_last_member() {
        let m = members(&["a", "b", "c"]);
        assert_eq!(select_next_assignee(&m, Some("c")), Ok("a"));
    }

    #[test]
    fn first_assignment_goes_to_the_first_member() {
        let m = members(&["a", "b", "c"]);
        assert_eq!(select_next_assignee(&m, None), Ok("a"));
    }

    #[test]
    fn restarts_when_the_last_assignee_left_the_room() {
        let m = members(&["a", "b", "c"]);
        assert_eq!(select_next_assignee(&m, Some("d")), Ok("a"));
    }

    #[test]
    fn empty_room_yields_no_assignee() {
        assert_eq!(select_next_assignee(&[], Some("a")), Err(NoAssigneeAvailable));
        assert_eq!(select_next_assignee(&[], None), Err(NoAssigneeAvailable));
    }

    #[test]
    fn single_member_rooms_always_pick_that_member() {
        let m = members(&["a"]);
        assert_eq!(select_next_assignee(&m, Some("a")), Ok("a"));
        assert_eq!(select_next_assignee(&m, None), Ok("a"));
    }

    #[test]
    fn repeated_calls_with_identical_inputs_agree() {
        let m = members(&["a", "b", "c"]);
        assert_eq!(
            select_next_assignee(&m, Some("a")),
            select_next_assignee(&m, Some("a"))
        );
    }
}
