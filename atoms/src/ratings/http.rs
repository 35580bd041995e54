use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::{RatePayload, UpdateRatingPayload};
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
    if e == "Rating not found" || e == "Task not found" {
        StatusCode::NOT_FOUND
    } else if e.starts_with("Rating must be") || e == "Only completed tasks can be rated" {
        StatusCode::BAD_REQUEST
    } else if e == "You have already rated this task" {
        StatusCode::CONFLICT
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Rate a completed task as the current roomie
pub async fn rate_task(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    task_id: &str,
    roomie_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: RatePayload = serde_json::from_slice(body)?;

    // Ratings only make sense on finished work
    let outcome = async {
        let task = crate::tasks::service::get_task(client, table_name, room_id, task_id).await?;
        if !task.is_done {
            return Err("Only completed tasks can be rated".to_string());
        }
        service::rate_task(client, table_name, task_id, roomie_id, payload.rating).await
    }
    .await;

    match outcome {
        Ok(rating) => json_response(StatusCode::CREATED, serde_json::to_string(&rating)?),
        Err(e) => error_response(status_for(&e), &e),
    }
}

/// All ratings on a task
pub async fn list_task_ratings(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
) -> Result<Response<Body>, Error> {
    match service::load_ratings_for_task(client, table_name, task_id).await {
        Ok(ratings) => json_response(StatusCode::OK, serde_json::to_string(&ratings)?),
        Err(e) => error_response(status_for(&e), &e),
    }
}

/// Average rating of a task, null when unrated
pub async fn get_average_rating(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
) -> Result<Response<Body>, Error> {
    match service::average_rating(client, table_name, task_id).await {
        Ok(average) => json_response(
            StatusCode::OK,
            serde_json::json!({ "average_rating": average }).to_string(),
        ),
        Err(e) => error_response(status_for(&e), &e),
    }
}

/// Has the current roomie rated this task, and with what
pub async fn get_own_rating(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
    roomie_id: &str,
) -> Result<Response<Body>, Error> {
    match service::get_rating(client, table_name, task_id, roomie_id).await {
        Ok(rating) => json_response(
            StatusCode::OK,
            serde_json::json!({
                "has_rated": rating.is_some(),
                "rating": rating.map(|r| r.rating),
            })
            .to_string(),
        ),
        Err(e) => error_response(status_for(&e), &e),
    }
}

/// Change the current roomie's rating
pub async fn update_rating(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
    roomie_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: UpdateRatingPayload = serde_json::from_slice(body)?;

    match service::update_rating(client, table_name, task_id, roomie_id, payload.rating).await {
        Ok(rating) => json_response(StatusCode::OK, serde_json::to_string(&rating)?),
        Err(e) => error_response(status_for(&e), &e),
    }
}

/// Remove the current roomie's rating
pub async fn delete_rating(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
    roomie_id: &str,
) -> Result<Response<Body>, Error> {
    match service::delete_rating(client, table_name, task_id, roomie_id).await {
        Ok(()) => Ok(Response::builder()
            .status(StatusCode::NO_CONTENT)
            .header("Access-Control-Allow-Origin", "*")
            .body(Body::Empty)
            .map_err(Box::new)?),
        Err(e) => error_response(status_for(&e), &e),
    }
}
