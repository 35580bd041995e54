use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::{CreateTemplatePayload, UpdateTemplatePayload};
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
    if e == "Template not found" {
        StatusCode::NOT_FOUND
    } else if e.starts_with("Weight must be") {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// List the templates of a room
pub async fn list_room_templates(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
) -> Result<Response<Body>, Error> {
    match service::load_templates_for_room(client, table_name, room_id).await {
        Ok(templates) => json_response(StatusCode::OK, serde_json::to_string(&templates)?),
        Err(e) => {
            tracing::error!("Failed to list templates: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)
        }
    }
}

/// Create a template
pub async fn create_template(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    created_by: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: CreateTemplatePayload = serde_json::from_slice(body)?;

    match service::create_template(client, table_name, room_id, created_by, payload).await {
        Ok(template) => json_response(StatusCode::CREATED, serde_json::to_string(&template)?),
        Err(e) => error_response(status_for(&e), &e),
    }
}

/// Get a single template
pub async fn get_template(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    template_id: &str,
) -> Result<Response<Body>, Error> {
    match service::get_template(client, table_name, room_id, template_id).await {
        Ok(template) => json_response(StatusCode::OK, serde_json::to_string(&template)?),
        Err(e) => error_response(status_for(&e), &e),
    }
}

/// Update a template
pub async fn update_template(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    template_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: UpdateTemplatePayload = serde_json::from_slice(body)?;

    match service::update_template(client, table_name, room_id, template_id, payload).await {
        Ok(template) => json_response(StatusCode::OK, serde_json::to_string(&template)?),
        Err(e) => error_response(status_for(&e), &e),
    }
}

/// Delete a template
pub async fn delete_template(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    template_id: &str,
) -> Result<Response<Body>, Error> {
    match service::delete_template(client, table_name, room_id, template_id).await {
        Ok(()) => Ok(Response::builder()
            .status(StatusCode::NO_CONTENT)
            .header("Access-Control-Allow-Origin", "*")
            .body(Body::Empty)
            .map_err(Box::new)?),
        Err(e) => error_response(status_for(&e), &e),
    }
}
