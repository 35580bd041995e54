use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use rand::Rng;
use std::collections::HashMap;

use super::model::{CreateRoomPayload, Room, UpdateRoomPayload};

const ACCESS_CODE_LEN: usize = 6;
const ACCESS_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate the code roomies type to join a room.
pub fn generate_access_code() -> String {
    let mut rng = rand::thread_rng();
    (0..ACCESS_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..ACCESS_CODE_ALPHABET.len());
            ACCESS_CODE_ALPHABET[idx] as char
        })
        .collect()
}

fn room_from_item(room_id: &str, item: &HashMap<String, AttributeValue>) -> Room {
    let field = |name: &str| {
        item.get(name)
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default()
    };
    Room {
        room_id: room_id.to_string(),
        name: field("name"),
        description: field("description"),
        access_code: field("access_code"),
        created_by: field("created_by"),
        created_at: field("created_at"),
    }
}

/// Create a room and enrol its creator as the first member.
pub async fn create_room(
    client: &DynamoClient,
    table_name: &str,
    roomie_id: &str,
    payload: CreateRoomPayload,
) -> Result<Room, String> {
    let room_id = uuid::Uuid::new_v4().to_string();
    let access_code = generate_access_code();
    let now = chrono::Utc::now().to_rfc3339();
    let pk = format!("ROOM#{}", room_id);

    client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(pk.clone()))
        .item("SK", AttributeValue::S(pk))
        .item("name", AttributeValue::S(payload.name.clone()))
        .item(
            "description",
            AttributeValue::S(payload.description.clone().unwrap_or_default()),
        )
        .item("access_code", AttributeValue::S(access_code.clone()))
        .item("created_by", AttributeValue::S(roomie_id.to_string()))
        .item("created_at", AttributeValue::S(now.clone()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    // Lookup item so join-by-code can resolve the room without a scan
    let code_key = format!("CODE#{}", access_code);
    client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(code_key.clone()))
        .item("SK", AttributeValue::S(code_key))
        .item("room_id", AttributeValue::S(room_id.clone()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    add_member(client, table_name, &room_id, roomie_id).await?;

    Ok(Room {
        room_id,
        name: payload.name,
        description: payload.description.unwrap_or_default(),
        access_code,
        created_by: roomie_id.to_string(),
        created_at: now,
    })
}

/// Get a specific room
pub async fn get_room(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
) -> Result<Room, String> {
    let pk = format!("ROOM#{}", room_id);

    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(pk.clone()))
        .key("SK", AttributeValue::S(pk))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    match result.item() {
        Some(item) => Ok(room_from_item(room_id, item)),
        None => Err("Room not found".to_string()),
    }
}

/// Update a room's name and/or description
pub async fn update_room(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    payload: UpdateRoomPayload,
) -> Result<Room, String> {
    let pk = format!("ROOM#{}", room_id);

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

    if !update_expr.is_empty() {
        let mut builder = client
            .update_item()
            .table_name(table_name)
            .key("PK", AttributeValue::S(pk.clone()))
            .key("SK", AttributeValue::S(pk))
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

    get_room(client, table_name, room_id).await
}

/// Delete a room together with its code lookup, member links, tasks and
/// templates. Reverse member links are removed one by one, like any other
/// cascade in this table.
pub async fn delete_room(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
) -> Result<(), String> {
    let room = get_room(client, table_name, room_id).await?;
    let pk = format!("ROOM#{}", room_id);

    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk")
        .expression_attribute_values(":pk", AttributeValue::S(pk.clone()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    for item in result.items() {
        let sk = match item.get("SK").and_then(|v| v.as_s().ok()) {
            Some(sk) => sk.to_string(),
            None => continue,
        };

        if let Some(roomie_id) = sk.strip_prefix("MEMBER#") {
            client
                .delete_item()
                .table_name(table_name)
                .key("PK", AttributeValue::S(format!("ROOMIE#{}", roomie_id)))
                .key("SK", AttributeValue::S(pk.clone()))
                .send()
                .await
                .map_err(|e| format!("DynamoDB delete_item error: {}", e))?;
        }

        // Ratings live under the task's own partition
        if let Some(task_id) = sk.strip_prefix("TASK#") {
            crate::ratings::service::delete_ratings_for_task(client, table_name, task_id).await?;
        }

        client
            .delete_item()
            .table_name(table_name)
            .key("PK", AttributeValue::S(pk.clone()))
            .key("SK", AttributeValue::S(sk))
            .send()
            .await
            .map_err(|e| format!("DynamoDB delete_item error: {}", e))?;
    }

    let code_key = format!("CODE#{}", room.access_code);
    client
        .delete_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(code_key.clone()))
        .key("SK", AttributeValue::S(code_key))
        .send()
        .await
        .map_err(|e| format!("DynamoDB delete_item error: {}", e))?;

    Ok(())
}

/// Resolve an access code to a room id, if any room carries it.
pub async fn find_room_id_by_code(
    client: &DynamoClient,
    table_name: &str,
    access_code: &str,
) -> Result<Option<String>, String> {
    let key = format!("CODE#{}", access_code.trim().to_uppercase());

    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(key.clone()))
        .key("SK", AttributeValue::S(key))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    Ok(result
        .item()
        .and_then(|item| item.get("room_id"))
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string()))
}

/// Add a roomie to a room. Returns false when they are already a member.
pub async fn add_member(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    roomie_id: &str,
) -> Result<bool, String> {
    if is_member(client, table_name, room_id, roomie_id).await? {
        return Ok(false);
    }

    let now = chrono::Utc::now().to_rfc3339();

    client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(format!("ROOM#{}", room_id)))
        .item("SK", AttributeValue::S(format!("MEMBER#{}", roomie_id)))
        .item("joined_at", AttributeValue::S(now.clone()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    // Mirror item so a roomie's rooms can be listed from their own partition
    client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(format!("ROOMIE#{}", roomie_id)))
        .item("SK", AttributeValue::S(format!("ROOM#{}", room_id)))
        .item("joined_at", AttributeValue::S(now))
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(true)
}

/// Remove a roomie from a room
pub async fn remove_member(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    roomie_id: &str,
) -> Result<(), String> {
    if !is_member(client, table_name, room_id, roomie_id).await? {
        return Err("You are not a member of this room".to_string());
    }

    client
        .delete_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("ROOM#{}", room_id)))
        .key("SK", AttributeValue::S(format!("MEMBER#{}", roomie_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB delete_item error: {}", e))?;

    client
        .delete_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("ROOMIE#{}", roomie_id)))
        .key("SK", AttributeValue::S(format!("ROOM#{}", room_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB delete_item error: {}", e))?;

    Ok(())
}

pub async fn is_member(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    roomie_id: &str,
) -> Result<bool, String> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("ROOM#{}", room_id)))
        .key("SK", AttributeValue::S(format!("MEMBER#{}", roomie_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    Ok(result.item().is_some())
}

/// Member ids of a room in stable store order (sort-key order), which is the
/// order the round-robin rotation walks.
pub async fn list_member_ids(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
) -> Result<Vec<String>, String> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S(format!("ROOM#{}", room_id)))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("MEMBER#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    let mut ids = Vec::new();
    for item in result.items() {
        if let Some(sk) = item.get("SK").and_then(|v| v.as_s().ok()) {
            if let Some(roomie_id) = sk.strip_prefix("MEMBER#") {
                ids.push(roomie_id.to_string());
            }
        }
    }

    Ok(ids)
}

/// Ids of the rooms a roomie belongs to
pub async fn list_room_ids_for_roomie(
    client: &DynamoClient,
    table_name: &str,
    roomie_id: &str,
) -> Result<Vec<String>, String> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S(format!("ROOMIE#{}", roomie_id)))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("ROOM#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    let mut ids = Vec::new();
    for item in result.items() {
        if let Some(sk) = item.get("SK").and_then(|v| v.as_s().ok()) {
            if let Some(room_id) = sk.strip_prefix("ROOM#") {
                ids.push(room_id.to_string());
            }
        }
    }

    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::generate_access_code;

    #[test]
    fn access_codes_are_six_uppercase_alphanumerics() {
        for _ in 0..50 {
            let code = generate_access_code();
            assert_eq!(code.len(), 6);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn access_codes_vary() {
        let codes: std::collections::HashSet<String> =
            (0..20).map(|_| generate_access_code()).collect();
        assert!(codes.len() > 1);
    }
}
