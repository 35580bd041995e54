use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::NaiveDate;
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Deserialize;

use allfreedo_atoms::{rooms, tasks, templates};

use crate::recurrence;
use crate::rotation;

#[derive(Debug, Deserialize, Default)]
struct SpawnPayload {
    scheduled_date: Option<String>,
}

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
    match e {
        "Template not found" => StatusCode::NOT_FOUND,
        "No roomies found in this room" => StatusCode::CONFLICT,
        "A task from this template has already been created today" => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Spawn one task from a template: rotate the assignee, insert the task,
/// persist the rotation marker.
///
/// The marker update is read-then-write; two concurrent spawns can pick the
/// same roomie. Accepted, the template is touched once per day in practice.
pub async fn spawn_task_from_template(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    template_id: &str,
    scheduled_date: NaiveDate,
) -> Result<tasks::model::Task, String> {
    let template = templates::service::get_template(client, table_name, room_id, template_id).await?;

    let member_ids = rooms::service::list_member_ids(client, table_name, room_id).await?;

    let assignee = rotation::select_next_assignee(
        &member_ids,
        template.last_assigned_roomie_id.as_deref(),
    )
    .map_err(|_| "No roomies found in this room".to_string())?
    .to_string();

    let task = tasks::service::create_task_row(
        client,
        table_name,
        room_id,
        &template.name,
        &template.description,
        template.weight,
        &assignee,
        &scheduled_date.to_string(),
        Some(template_id),
    )
    .await?;

    templates::service::set_last_assigned(client, table_name, room_id, template_id, &assignee)
        .await?;

    Ok(task)
}

/// Walk every recurring template of a room and spawn the ones due on `today`
/// that have not already spawned a task for that date. Templates whose rule
/// fails to parse are skipped.
pub async fn process_recurring_templates(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    today: NaiveDate,
) -> Result<Vec<tasks::model::Task>, String> {
    let room_templates =
        templates::service::load_templates_for_room(client, table_name, room_id).await?;

    let mut spawned = Vec::new();
    for template in room_templates {
        if !template.recurring {
            continue;
        }
        let rule = match template.recurrence_rule.as_deref().and_then(recurrence::parse_rule) {
            Some(rule) => rule,
            None => continue,
        };
        if !recurrence::is_due_on(&rule, today) {
            continue;
        }
        let already_spawned = tasks::service::template_has_task_for_date(
            client,
            table_name,
            room_id,
            &template.template_id,
            &today.to_string(),
        )
        .await?;
        if already_spawned {
            continue;
        }

        match spawn_task_from_template(client, table_name, room_id, &template.template_id, today)
            .await
        {
            Ok(task) => spawned.push(task),
            // An empty room stops every template the same way; no point continuing
            Err(e) if e == "No roomies found in this room" => return Err(e),
            Err(e) => {
                tracing::error!(
                    "Failed to spawn task from template {}: {}",
                    template.template_id,
                    e
                );
            }
        }
    }

    Ok(spawned)
}

/// POST handler: spawn a task from a template, optionally on a given date
pub async fn spawn_template_handler(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    template_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: SpawnPayload = if body.is_empty() {
        SpawnPayload::default()
    } else {
        serde_json::from_slice(body)?
    };

    let today = chrono::Utc::now().date_naive();
    let scheduled_date = match payload.scheduled_date.as_deref() {
        Some(raw) => match raw.parse::<NaiveDate>() {
            Ok(date) => date,
            Err(_) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "scheduled_date must be YYYY-MM-DD",
                )
            }
        },
        None => today,
    };

    let already_spawned = tasks::service::template_has_task_for_date(
        client,
        table_name,
        room_id,
        template_id,
        &scheduled_date.to_string(),
    )
    .await?;
    if already_spawned {
        return error_response(
            StatusCode::CONFLICT,
            "A task from this template has already been created today",
        );
    }

    match spawn_task_from_template(client, table_name, room_id, template_id, scheduled_date).await
    {
        Ok(task) => json_response(StatusCode::CREATED, serde_json::to_string(&task)?),
        Err(e) => error_response(status_for(&e), &e),
    }
}

/// POST handler: evaluate all recurring templates of a room against today
pub async fn process_recurring_handler(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
) -> Result<Response<Body>, Error> {
    let today = chrono::Utc::now().date_naive();

    match process_recurring_templates(client, table_name, room_id, today).await {
        Ok(spawned) => json_response(StatusCode::OK, serde_json::to_string(&spawned)?),
        Err(e) => error_response(status_for(&e), &e),
    }
}

/// GET handler: how a template's rule reads, and when it fires next
pub async fn template_schedule_handler(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
    template_id: &str,
) -> Result<Response<Body>, Error> {
    let template =
        match templates::service::get_template(client, table_name, room_id, template_id).await {
            Ok(template) => template,
            Err(e) => return error_response(status_for(&e), &e),
        };

    let today = chrono::Utc::now().date_naive();
    let rule = template
        .recurrence_rule
        .as_deref()
        .and_then(recurrence::parse_rule);

    let schedule = match rule {
        Some(rule) => serde_json::json!({
            "description": recurrence::describe_rule(&rule),
            "due_today": recurrence::is_due_on(&rule, today),
            "next_occurrence": recurrence::next_occurrence(&rule, today).to_string(),
        }),
        // Not recurring, or an unparseable blob: nothing scheduled
        None => serde_json::json!({
            "description": "",
            "due_today": false,
            "next_occurrence": null,
        }),
    };

    json_response(StatusCode::OK, schedule.to_string())
}
