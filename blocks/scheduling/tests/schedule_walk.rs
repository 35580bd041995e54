use chrono::{Days, NaiveDate};
use scheduling_block::{
    describe_rule, is_due_on, next_occurrence, parse_rule, select_next_assignee,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A weekly cleaning rota walked over a month: the rule fires exactly on its
/// weekdays, and the rotation hands each firing to the next roomie in order.
#[test]
fn weekly_rota_walks_members_in_order() {
    let rule = parse_rule(r#"{"frequency":"weekly","interval":1,"byDay":["MO","TH"]}"#).unwrap();
    let members: Vec<String> = ["ada", "ben", "cleo"]
        .iter()
        .map(|m| m.to_string())
        .collect();

    let mut last_assigned: Option<String> = None;
    let mut assignments = Vec::new();

    // June 2025, starting on Sunday the 1st
    for offset in 0..28u64 {
        let day = date(2025, 6, 1) + Days::new(offset);
        if !is_due_on(&rule, day) {
            continue;
        }
        let next = select_next_assignee(&members, last_assigned.as_deref())
            .expect("room is not empty")
            .to_string();
        assignments.push((day.to_string(), next.clone()));
        last_assigned = Some(next);
    }

    // Mondays and Thursdays of the window, round-robin across three roomies
    let expected = [
        ("2025-06-02", "ada"),
        ("2025-06-05", "ben"),
        ("2025-06-09", "cleo"),
        ("2025-06-12", "ada"),
        ("2025-06-16", "ben"),
        ("2025-06-19", "cleo"),
        ("2025-06-23", "ada"),
        ("2025-06-26", "ben"),
    ];
    let expected: Vec<(String, String)> = expected
        .iter()
        .map(|(d, m)| (d.to_string(), m.to_string()))
        .collect();
    assert_eq!(assignments, expected);
}

/// The rotation restarts cleanly when the previously assigned roomie leaves.
#[test]
fn rotation_survives_membership_changes() {
    let mut members: Vec<String> = ["ada", "ben", "cleo"]
        .iter()
        .map(|m| m.to_string())
        .collect();

    let first = select_next_assignee(&members, Some("ben")).unwrap().to_string();
    assert_eq!(first, "cleo");

    // cleo leaves; her marker no longer resolves and the rotation restarts
    members.retain(|m| m != "cleo");
    let next = select_next_assignee(&members, Some(&first)).unwrap();
    assert_eq!(next, "ada");
}

/// Monthly rules chain through next_occurrence the way the due check fires.
#[test]
fn monthly_next_occurrence_agrees_with_due_check() {
    let rule =
        parse_rule(r#"{"frequency":"monthly","interval":1,"byMonthDay":[1,15]}"#).unwrap();

    let mut current = date(2025, 6, 10);
    for _ in 0..6 {
        current = next_occurrence(&rule, current);
        assert!(
            is_due_on(&rule, current),
            "next occurrence {} should itself be due",
            current
        );
    }
    assert_eq!(current, date(2025, 9, 1));
}

/// The rendered description stays stable for a fixed rule.
#[test]
fn description_is_deterministic() {
    let rule =
        parse_rule(r#"{"frequency":"weekly","interval":1,"byDay":["monday","friday"]}"#).unwrap();
    assert_eq!(describe_rule(&rule), "Weekly on Monday, Friday");
    assert_eq!(describe_rule(&rule), describe_rule(&rule));
}
