use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::model::{CreateTaskPayload, Task, TaskFilters, UpdateTaskPayload};

pub const MIN_WEIGHT: u8 = 1;
pub const MAX_WEIGHT: u8 = 5;

pub fn validate_weight(weight: u8) -> Result<(), String> {
    if (MIN_WEIGHT..=MAX_WEIGHT).contains(&weight) {
        Ok(())
    } else {
        Err(format!(
            "Weight must be between {} and {}",
            MIN_WEIGHT, MAX_WEIGHT
        ))
    }
}

fn task_from_item(room_id: &str, task_id: &str, item: &HashMap<String, AttributeValue>) -> Task {
    let string_field = |name: &str| {
        item.get(name)
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
    };
    Task {
        task_id: task_id.to_string(),
        room_id: room_id.to_string(),
        name: string_field("name").unwrap_or_default(),
        description: string_field("description").unwrap_or_default(),
        weight: item
            .get("weight")
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse().ok())
            .unwrap_or(MIN_WEIGHT),
        assigned_roomie_id: string_field("assigned_roomie_id").unwrap_or_default(),
        scheduled_date: string_field("scheduled_date").unwrap_or_default(),
        is_done: item
            .get("is_done")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .unwrap_or(false),
        done_date: string_field("done_date"),
        done_by: string_field("done_by"),
        task_template_id: string_field("task_template_id"),
        created_at: string_field("created_at").unwrap_or_default(),
    }
}

fn matches_filters(task: &Task, filters: &TaskFilters) -> bool {
    if let Some(completed) = filters.completed {
        if task.is_done != completed {
            return false;
        }
    }
    if let Some(roomie_id) = &filters.assigned_roomie_id {
        if &task.assigned_roomie_id != roomie_id {
            return false;
        }
    }
    if let Some(after) = &filters.after_date {
        if task.scheduled_date.as_str() < after.as_str() {
            return false;
        }
    }
    if let Some(before) = &filters.before_date {
        if task.scheduled_date.as_str() > before.as_str() {
            return false;
        }
    }
    true
}

/// Load the tasks of a room, filtered, ordered by scheduled date ascending
pub async fn load_tasks_for_room(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    filters: &TaskFilters,
) -> Result<Vec<Task>, String> {
    let pk = format!("ROOM#{}", room_id);

    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S(pk))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("TASK#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    let mut tasks = Vec::new();
    for item in result.items() {
        if let Some(sk) = item.get("SK").and_then(|v| v.as_s().ok()) {
            if let Some(task_id) = sk.strip_prefix("TASK#") {
                let task = task_from_item(room_id, task_id, item);
                if matches_filters(&task, filters) {
                    tasks.push(task);
                }
            }
        }
    }

    tasks.sort_by(|a, b| a.scheduled_date.cmp(&b.scheduled_date));

    Ok(tasks)
}

/// Create a free-standing task
pub async fn create_task(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    payload: CreateTaskPayload,
) -> Result<Task, String> {
    validate_weight(payload.weight)?;
    create_task_row(
        client,
        table_name,
        room_id,
        &payload.name,
        payload.description.as_deref().unwrap_or(""),
        payload.weight,
        &payload.assigned_roomie_id,
        &payload.scheduled_date,
        None,
    )
    .await
}

/// Insert a task row; shared by manual creation and template spawning.
#[allow(clippy::too_many_arguments)]
pub async fn create_task_row(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    name: &str,
    description: &str,
    weight: u8,
    assigned_roomie_id: &str,
    scheduled_date: &str,
    task_template_id: Option<&str>,
) -> Result<Task, String> {
    let task_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let pk = format!("ROOM#{}", room_id);
    let sk = format!("TASK#{}", task_id);

    let mut builder = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(pk))
        .item("SK", AttributeValue::S(sk))
        .item("name", AttributeValue::S(name.to_string()))
        .item("description", AttributeValue::S(description.to_string()))
        .item("weight", AttributeValue::N(weight.to_string()))
        .item(
            "assigned_roomie_id",
            AttributeValue::S(assigned_roomie_id.to_string()),
        )
        .item(
            "scheduled_date",
            AttributeValue::S(scheduled_date.to_string()),
        )
        .item("is_done", AttributeValue::Bool(false))
        .item("created_at", AttributeValue::S(now.clone()));

    if let Some(template_id) = task_template_id {
        builder = builder.item(
            "task_template_id",
            AttributeValue::S(template_id.to_string()),
        );
    }

    builder
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(Task {
        task_id,
        room_id: room_id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        weight,
        assigned_roomie_id: assigned_roomie_id.to_string(),
        scheduled_date: scheduled_date.to_string(),
        is_done: false,
        done_date: None,
        done_by: None,
        task_template_id: task_template_id.map(|s| s.to_string()),
        created_at: now,
    })
}

/// Get a specific task
pub async fn get_task(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    task_id: &str,
) -> Result<Task, String> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("ROOM#{}", room_id)))
        .key("SK", AttributeValue::S(format!("TASK#{}", task_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    match result.item() {
        Some(item) => Ok(task_from_item(room_id, task_id, item)),
        None => Err("Task not found".to_string()),
    }
}

/// Mark a task done. Done is terminal; a done task stays done.
pub async fn mark_task_done(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    task_id: &str,
    done_by: &str,
) -> Result<Task, String> {
    // Ensure it exists first so a missing id maps to 404, not a blind upsert
    let task = get_task(client, table_name, room_id, task_id).await?;
    if task.is_done {
        return Ok(task);
    }

    let now = chrono::Utc::now().to_rfc3339();

    client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("ROOM#{}", room_id)))
        .key("SK", AttributeValue::S(format!("TASK#{}", task_id)))
        .update_expression("SET is_done = :done, done_date = :date, done_by = :by")
        .expression_attribute_values(":done", AttributeValue::Bool(true))
        .expression_attribute_values(":date", AttributeValue::S(now))
        .expression_attribute_values(":by", AttributeValue::S(done_by.to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB update_item error: {}", e))?;

    get_task(client, table_name, room_id, task_id).await
}

/// Update a task
pub async fn update_task(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    task_id: &str,
    payload: UpdateTaskPayload,
) -> Result<Task, String> {
    if let Some(weight) = payload.weight {
        validate_weight(weight)?;
    }

    let mut update_expr = vec![];
    let mut expr_names = HashMap::new();
    let mut expr_values = HashMap::new();

    if let Some(name) = payload.name {
        update_expr.push("#name = :name");
        expr_names.insert("#name".to_string(), "name".to_string());
        expr_values.insert(":name".to_string(), AttributeValue::S(name));
    }

    if let Some(description) = payload.description {
        update_expr.push("description = :description");
        expr_values.insert(":description".to_string(), AttributeValue::S(description));
    }

    if let Some(weight) = payload.weight {
        update_expr.push("weight = :weight");
        expr_values.insert(":weight".to_string(), AttributeValue::N(weight.to_string()));
    }

    if let Some(roomie_id) = payload.assigned_roomie_id {
        update_expr.push("assigned_roomie_id = :assigned_roomie_id");
        expr_values.insert(
            ":assigned_roomie_id".to_string(),
            AttributeValue::S(roomie_id),
        );
    }

    if let Some(scheduled_date) = payload.scheduled_date {
        update_expr.push("scheduled_date = :scheduled_date");
        expr_values.insert(
            ":scheduled_date".to_string(),
            AttributeValue::S(scheduled_date),
        );
    }

    if !update_expr.is_empty() {
        // Existence check so updates to unknown tasks surface as not found
        get_task(client, table_name, room_id, task_id).await?;

        let mut builder = client
            .update_item()
            .table_name(table_name)
            .key("PK", AttributeValue::S(format!("ROOM#{}", room_id)))
            .key("SK", AttributeValue::S(format!("TASK#{}", task_id)))
            .update_expression(format!("SET {}", update_expr.join(", ")));

        for (k, v) in expr_names {
            builder = builder.expression_attribute_names(k, v);
        }

        for (k, v) in expr_values {
            builder = builder.expression_attribute_values(k, v);
        }

        builder
            .send()
            .await
            .map_err(|e| format!("DynamoDB update_item error: {}", e))?;
    }

    get_task(client, table_name, room_id, task_id).await
}

/// Delete a task and its ratings
pub async fn delete_task(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    task_id: &str,
) -> Result<(), String> {
    crate::ratings::service::delete_ratings_for_task(client, table_name, task_id).await?;

    client
        .delete_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("ROOM#{}", room_id)))
        .key("SK", AttributeValue::S(format!("TASK#{}", task_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB delete_item error: {}", e))?;

    Ok(())
}

/// Has this template already spawned a task scheduled for `date`?
/// Keeps recurring templates from double-spawning on the same day.
pub async fn template_has_task_for_date(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    template_id: &str,
    date: &str,
) -> Result<bool, String> {
    let filters = TaskFilters {
        after_date: Some(date.to_string()),
        before_date: Some(date.to_string()),
        ..Default::default()
    };
    let tasks = load_tasks_for_room(client, table_name, room_id, &filters).await?;

    Ok(tasks
        .iter()
        .any(|t| t.task_template_id.as_deref() == Some(template_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(scheduled: &str, done: bool, roomie: &str) -> Task {
        Task {
            task_id: "t".to_string(),
            room_id: "r".to_string(),
            name: "Dishes".to_string(),
            description: String::new(),
            weight: 3,
            assigned_roomie_id: roomie.to_string(),
            scheduled_date: scheduled.to_string(),
            is_done: done,
            done_date: None,
            done_by: None,
            task_template_id: None,
            created_at: String::new(),
        }
    }

    #[test]
    fn weight_bounds_are_one_to_five() {
        assert!(validate_weight(0).is_err());
        assert!(validate_weight(1).is_ok());
        assert!(validate_weight(5).is_ok());
        assert!(validate_weight(6).is_err());
    }

    #[test]
    fn filters_combine_conjunctively() {
        let filters = TaskFilters {
            completed: Some(false),
            assigned_roomie_id: Some("a".to_string()),
            after_date: Some("2025-06-01".to_string()),
            before_date: Some("2025-06-30".to_string()),
        };
        assert!(matches_filters(&task("2025-06-15", false, "a"), &filters));
        assert!(!matches_filters(&task("2025-06-15", true, "a"), &filters));
        assert!(!matches_filters(&task("2025-06-15", false, "b"), &filters));
        assert!(!matches_filters(&task("2025-05-31", false, "a"), &filters));
        assert!(!matches_filters(&task("2025-07-01", false, "a"), &filters));
    }

    #[test]
    fn empty_filters_match_everything() {
        let filters = TaskFilters::default();
        assert!(matches_filters(&task("2025-06-15", false, "a"), &filters));
        assert!(matches_filters(&task("2025-06-15", true, "b"), &filters));
    }
}
