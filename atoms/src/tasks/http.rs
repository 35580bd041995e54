use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::{CreateTaskPayload, TaskFilters, UpdateTaskPayload};
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

fn status_for(e: &str) -> StatusCode {
    if e == "Task not found" {
        StatusCode::NOT_FOUND
    } else if e.starts_with("Weight must be") {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// List the tasks of a room; filters come from the query string
pub async fn list_room_tasks(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    filters: &TaskFilters,
) -> Result<Response<Body>, Error> {
    match service::load_tasks_for_room(client, table_name, room_id, filters).await {
        Ok(tasks) => json_response(StatusCode::OK, serde_json::to_string(&tasks)?),
        Err(e) => {
            tracing::error!("Failed to list tasks: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)
        }
    }
}

/// Create a free-standing task
pub async fn create_task(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: CreateTaskPayload = serde_json::from_slice(body)?;

    match service::create_task(client, table_name, room_id, payload).await {
        Ok(task) => json_response(StatusCode::CREATED, serde_json::to_string(&task)?),
        Err(e) => error_response(status_for(&e), &e),
    }
}

/// Get a single task
pub async fn get_task(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    task_id: &str,
) -> Result<Response<Body>, Error> {
    match service::get_task(client, table_name, room_id, task_id).await {
        Ok(task) => json_response(StatusCode::OK, serde_json::to_string(&task)?),
        Err(e) => error_response(status_for(&e), &e),
    }
}

/// Mark a task done on behalf of the current roomie
pub async fn mark_task_done(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    task_id: &str,
    done_by: &str,
) -> Result<Response<Body>, Error> {
    match service::mark_task_done(client, table_name, room_id, task_id, done_by).await {
        Ok(task) => json_response(StatusCode::OK, serde_json::to_string(&task)?),
        Err(e) => error_response(status_for(&e), &e),
    }
}

/// Update a task
pub async fn update_task(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    task_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: UpdateTaskPayload = serde_json::from_slice(body)?;

    match service::update_task(client, table_name, room_id, task_id, payload).await {
        Ok(task) => json_response(StatusCode::OK, serde_json::to_string(&task)?),
        Err(e) => error_response(status_for(&e), &e),
    }
}

/// Delete a task
pub async fn delete_task(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    task_id: &str,
) -> Result<Response<Body>, Error> {
    match service::delete_task(client, table_name, room_id, task_id).await {
        Ok(()) => Ok(Response::builder()
            .status(StatusCode::NO_CONTENT)
            .header("Access-Control-Allow-Origin", "*")
            .body(Body::Empty)
            .map_err(Box::new)?),
        Err(e) => error_response(status_for(&e), &e),
    }
}
