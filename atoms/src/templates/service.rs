use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::model::{CreateTemplatePayload, TaskTemplate, UpdateTemplatePayload};
use crate::tasks::service::validate_weight;

fn template_from_item(
    room_id: &str,
    template_id: &str,
    item: &HashMap<String, AttributeValue>,
) -> TaskTemplate {
    let string_field = |name: &str| {
        item.get(name)
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
    };
    TaskTemplate {
        template_id: template_id.to_string(),
        room_id: room_id.to_string(),
        name: string_field("name").unwrap_or_default(),
        description: string_field("description").unwrap_or_default(),
        weight: item
            .get("weight")
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse().ok())
            .unwrap_or(1),
        recurring: item
            .get("recurring")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .unwrap_or(false),
        recurrence_rule: string_field("recurrence_rule"),
        last_assigned_roomie_id: string_field("last_assigned_roomie_id"),
        created_by: string_field("created_by"),
        created_at: string_field("created_at").unwrap_or_default(),
    }
}

/// Load the templates of a room, ordered by name
pub async fn load_templates_for_room(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
) -> Result<Vec<TaskTemplate>, String> {
    let pk = format!("ROOM#{}", room_id);

    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S(pk))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("TEMPLATE#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    let mut templates = Vec::new();
    for item in result.items() {
        if let Some(sk) = item.get("SK").and_then(|v| v.as_s().ok()) {
            if let Some(template_id) = sk.strip_prefix("TEMPLATE#") {
                templates.push(template_from_item(room_id, template_id, item));
            }
        }
    }

    templates.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(templates)
}

/// Create a task template
pub async fn create_template(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    created_by: &str,
    payload: CreateTemplatePayload,
) -> Result<TaskTemplate, String> {
    validate_weight(payload.weight)?;

    let template_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let pk = format!("ROOM#{}", room_id);
    let sk = format!("TEMPLATE#{}", template_id);

    let mut builder = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(pk))
        .item("SK", AttributeValue::S(sk))
        .item("name", AttributeValue::S(payload.name.clone()))
        .item(
            "description",
            AttributeValue::S(payload.description.clone().unwrap_or_default()),
        )
        .item("weight", AttributeValue::N(payload.weight.to_string()))
        .item("recurring", AttributeValue::Bool(payload.recurring))
        .item("created_by", AttributeValue::S(created_by.to_string()))
        .item("created_at", AttributeValue::S(now.clone()));

    if let Some(rule) = &payload.recurrence_rule {
        builder = builder.item("recurrence_rule", AttributeValue::S(rule.clone()));
    }

    builder
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(TaskTemplate {
        template_id,
        room_id: room_id.to_string(),
        name: payload.name,
        description: payload.description.unwrap_or_default(),
        weight: payload.weight,
        recurring: payload.recurring,
        recurrence_rule: payload.recurrence_rule,
        last_assigned_roomie_id: None,
        created_by: Some(created_by.to_string()),
        created_at: now,
    })
}

/// Get a specific template
pub async fn get_template(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    template_id: &str,
) -> Result<TaskTemplate, String> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("ROOM#{}", room_id)))
        .key("SK", AttributeValue::S(format!("TEMPLATE#{}", template_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    match result.item() {
        Some(item) => Ok(template_from_item(room_id, template_id, item)),
        None => Err("Template not found".to_string()),
    }
}

/// Update a template
pub async fn update_template(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    template_id: &str,
    payload: UpdateTemplatePayload,
) -> Result<TaskTemplate, String> {
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

    if let Some(recurring) = payload.recurring {
        update_expr.push("recurring = :recurring");
        expr_values.insert(":recurring".to_string(), AttributeValue::Bool(recurring));
    }

    if let Some(rule) = payload.recurrence_rule {
        update_expr.push("recurrence_rule = :recurrence_rule");
        expr_values.insert(":recurrence_rule".to_string(), AttributeValue::S(rule));
    }

    if !update_expr.is_empty() {
        get_template(client, table_name, room_id, template_id).await?;

        let mut builder = client
            .update_item()
            .table_name(table_name)
            .key("PK", AttributeValue::S(format!("ROOM#{}", room_id)))
            .key("SK", AttributeValue::S(format!("TEMPLATE#{}", template_id)))
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

    get_template(client, table_name, room_id, template_id).await
}

/// Persist the rotation marker after a spawn. The rotation itself is pure;
/// this is the only place the marker is written.
pub async fn set_last_assigned(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    template_id: &str,
    roomie_id: &str,
) -> Result<(), String> {
    client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("ROOM#{}", room_id)))
        .key("SK", AttributeValue::S(format!("TEMPLATE#{}", template_id)))
        .update_expression("SET last_assigned_roomie_id = :roomie_id")
        .expression_attribute_values(":roomie_id", AttributeValue::S(roomie_id.to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB update_item error: {}", e))?;

    Ok(())
}

/// Delete a template. Tasks already spawned from it are kept.
pub async fn delete_template(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    template_id: &str,
) -> Result<(), String> {
    client
        .delete_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("ROOM#{}", room_id)))
        .key("SK", AttributeValue::S(format!("TEMPLATE#{}", template_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB delete_item error: {}", e))?;

    Ok(())
}
