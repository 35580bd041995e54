use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{Body, Error, Response};
use std::collections::HashMap;

use super::model::{CreateRoomiePayload, Roomie, UpdateRoomiePayload};

fn roomie_from_item(roomie_id: &str, item: &HashMap<String, AttributeValue>) -> Roomie {
    Roomie {
        roomie_id: roomie_id.to_string(),
        name: item
            .get("name")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        user_id: item
            .get("user_id")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        avatar: item
            .get("avatar")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        created_at: item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    }
}

/// Roomie id bound to an auth identity, if a profile exists.
pub async fn find_roomie_id_for_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Option<String>, String> {
    let key = format!("AUTH#{}", user_id);

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
        .and_then(|item| item.get("roomie_id"))
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string()))
}

/// Load one roomie profile
pub async fn get_roomie(
    client: &DynamoClient,
    table_name: &str,
    roomie_id: &str,
) -> Result<Roomie, String> {
    let pk = format!("ROOMIE#{}", roomie_id);

    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(pk.clone()))
        .key("SK", AttributeValue::S(pk))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    match result.item() {
        Some(item) => Ok(roomie_from_item(roomie_id, item)),
        None => Err("Roomie not found".to_string()),
    }
}

/// Load several roomie profiles, preserving the order of `roomie_ids`.
/// Dangling ids are skipped rather than failing the whole load.
pub async fn load_roomies(
    client: &DynamoClient,
    table_name: &str,
    roomie_ids: &[String],
) -> Result<Vec<Roomie>, String> {
    let mut roomies = Vec::with_capacity(roomie_ids.len());
    for roomie_id in roomie_ids {
        match get_roomie(client, table_name, roomie_id).await {
            Ok(roomie) => roomies.push(roomie),
            Err(e) if e == "Roomie not found" => {
                tracing::warn!("Member link points at missing roomie {}", roomie_id);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(roomies)
}

/// Create a roomie profile for the authenticated user
/// Called once after signup; a second profile for the same identity is refused
pub async fn create_roomie(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: CreateRoomiePayload = serde_json::from_slice(body)?;

    if find_roomie_id_for_user(client, table_name, user_id)
        .await?
        .is_some()
    {
        let resp = Response::builder()
            .status(409)
            .header("content-type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(
                serde_json::json!({"error": "A profile already exists for this user"})
                    .to_string()
                    .into(),
            )
            .map_err(Box::new)?;
        return Ok(resp);
    }

    let roomie_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let pk = format!("ROOMIE#{}", roomie_id);

    let mut put_request = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(pk.clone()))
        .item("SK", AttributeValue::S(pk))
        .item("name", AttributeValue::S(req.name.clone()))
        .item("user_id", AttributeValue::S(user_id.to_string()))
        .item("created_at", AttributeValue::S(now.clone()));

    if let Some(avatar) = &req.avatar {
        put_request = put_request.item("avatar", AttributeValue::S(avatar.clone()));
    }

    put_request
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    // 1:1 binding from auth identity to profile
    let auth_key = format!("AUTH#{}", user_id);
    client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(auth_key.clone()))
        .item("SK", AttributeValue::S(auth_key))
        .item("roomie_id", AttributeValue::S(roomie_id.clone()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    let roomie = Roomie {
        roomie_id,
        name: req.name,
        user_id: user_id.to_string(),
        avatar: req.avatar,
        created_at: now,
    };

    let resp = Response::builder()
        .status(201)
        .header("content-type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(&roomie)?.into())
        .map_err(Box::new)?;
    Ok(resp)
}

/// Get the profile of the authenticated user
pub async fn get_current_roomie(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Response<Body>, Error> {
    let roomie_id = find_roomie_id_for_user(client, table_name, user_id).await?;

    let roomie = match roomie_id {
        Some(roomie_id) => get_roomie(client, table_name, &roomie_id).await?,
        None => {
            let resp = Response::builder()
                .status(404)
                .header("content-type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(
                    serde_json::json!({"error": "Roomie not found"})
                        .to_string()
                        .into(),
                )
                .map_err(Box::new)?;
            return Ok(resp);
        }
    };

    let resp = Response::builder()
        .status(200)
        .header("content-type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(&roomie)?.into())
        .map_err(Box::new)?;
    Ok(resp)
}

/// Update the authenticated user's profile
pub async fn update_current_roomie(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: UpdateRoomiePayload = serde_json::from_slice(body)?;

    let roomie_id = match find_roomie_id_for_user(client, table_name, user_id)
        .await?
    {
        Some(roomie_id) => roomie_id,
        None => {
            let resp = Response::builder()
                .status(404)
                .header("content-type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(
                    serde_json::json!({"error": "Roomie not found"})
                        .to_string()
                        .into(),
                )
                .map_err(Box::new)?;
            return Ok(resp);
        }
    };

    let pk = format!("ROOMIE#{}", roomie_id);

    let mut update_expr = vec![];
    let mut expr_names = std::collections::HashMap::new();
    let mut expr_values = std::collections::HashMap::new();

    if let Some(name) = req.name {
        update_expr.push("#name = :name");
        expr_names.insert("#name".to_string(), "name".to_string());
        expr_values.insert(":name".to_string(), AttributeValue::S(name));
    }

    if let Some(avatar) = req.avatar {
        update_expr.push("avatar = :avatar");
        expr_values.insert(":avatar".to_string(), AttributeValue::S(avatar));
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

    get_current_roomie(client, table_name, user_id).await
}

/// List the members of a room, profiles resolved, in membership order
pub async fn list_roomies_in_room(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
) -> Result<Response<Body>, Error> {
    let member_ids = crate::rooms::service::list_member_ids(client, table_name, room_id)
        .await?;

    let roomies = load_roomies(client, table_name, &member_ids)
        .await?;

    let resp = Response::builder()
        .status(200)
        .header("content-type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(&roomies)?.into())
        .map_err(Box::new)?;
    Ok(resp)
}
