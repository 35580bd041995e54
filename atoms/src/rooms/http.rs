use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::{CreateRoomPayload, JoinRoomPayload, UpdateRoomPayload};
use super::service;

fn json_response(status: StatusCode, body: String) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(body.into())
        .map_err(Box::new)?)
}

fn error_response(status: StatusCode, message: &str) -> Result<Response<Body>, Error> {
    json_response(status, serde_json::json!({ "error": message }).to_string())
}

/// Create a room; the creator joins it immediately
pub async fn create_room(
    client: &DynamoClient,
    table_name: &str,
    roomie_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: CreateRoomPayload = serde_json::from_slice(body)?;

    if payload.name.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Room name must not be empty");
    }

    match service::create_room(client, table_name, roomie_id, payload).await {
        Ok(room) => json_response(StatusCode::CREATED, serde_json::to_string(&room)?),
        Err(e) => {
            tracing::error!("Failed to create room: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)
        }
    }
}

/// Get a room
pub async fn get_room(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
) -> Result<Response<Body>, Error> {
    match service::get_room(client, table_name, room_id).await {
        Ok(room) => json_response(StatusCode::OK, serde_json::to_string(&room)?),
        Err(e) if e == "Room not found" => error_response(StatusCode::NOT_FOUND, &e),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e),
    }
}

/// List the rooms the current roomie belongs to
pub async fn list_rooms_for_roomie(
    client: &DynamoClient,
    table_name: &str,
    roomie_id: &str,
) -> Result<Response<Body>, Error> {
    let room_ids = match service::list_room_ids_for_roomie(client, table_name, roomie_id).await {
        Ok(ids) => ids,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e),
    };

    let mut rooms = Vec::with_capacity(room_ids.len());
    for room_id in &room_ids {
        match service::get_room(client, table_name, room_id).await {
            Ok(room) => rooms.push(room),
            // A dangling member link is not worth failing the listing for
            Err(e) => tracing::warn!("Skipping room {}: {}", room_id, e),
        }
    }

    json_response(StatusCode::OK, serde_json::to_string(&rooms)?)
}

/// Update a room
pub async fn update_room(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: UpdateRoomPayload = serde_json::from_slice(body)?;

    match service::update_room(client, table_name, room_id, payload).await {
        Ok(room) => json_response(StatusCode::OK, serde_json::to_string(&room)?),
        Err(e) if e == "Room not found" => error_response(StatusCode::NOT_FOUND, &e),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e),
    }
}

/// Delete a room and everything under it
pub async fn delete_room(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
) -> Result<Response<Body>, Error> {
    match service::delete_room(client, table_name, room_id).await {
        Ok(()) => Ok(Response::builder()
            .status(StatusCode::NO_CONTENT)
            .header("Access-Control-Allow-Origin", "*")
            .body(Body::Empty)
            .map_err(Box::new)?),
        Err(e) if e == "Room not found" => error_response(StatusCode::NOT_FOUND, &e),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e),
    }
}

/// Join a room by access code
pub async fn join_room(
    client: &DynamoClient,
    table_name: &str,
    roomie_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: JoinRoomPayload = serde_json::from_slice(body)?;

    let room_id = match service::find_room_id_by_code(client, table_name, &payload.access_code).await
    {
        Ok(Some(room_id)) => room_id,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Invalid access code"),
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e),
    };

    match service::add_member(client, table_name, &room_id, roomie_id).await {
        Ok(true) => json_response(
            StatusCode::OK,
            serde_json::json!({ "room_id": room_id }).to_string(),
        ),
        Ok(false) => json_response(
            StatusCode::CONFLICT,
            serde_json::json!({
                "error": "You're already a member of this room",
                "room_id": room_id,
            })
            .to_string(),
        ),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e),
    }
}

/// Leave a room
pub async fn leave_room(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    roomie_id: &str,
) -> Result<Response<Body>, Error> {
    match service::remove_member(client, table_name, room_id, roomie_id).await {
        Ok(()) => json_response(StatusCode::OK, serde_json::json!({ "message": "ok" }).to_string()),
        Err(e) if e == "You are not a member of this room" => {
            error_response(StatusCode::CONFLICT, &e)
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e),
    }
}
