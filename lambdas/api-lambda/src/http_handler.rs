use allfreedo_atoms as atoms;
use allfreedo_atoms::tasks::model::TaskFilters;
use allfreedo_shared::{auth, overview, AppState};
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, RequestExt, Response,
};
use scheduling_block::templates as scheduling;
use std::env;
use std::sync::Arc;

use lambda_http::http::header::{HeaderValue, SET_COOKIE, VARY};

fn with_set_cookies(mut resp: Response<Body>, cookies: &[String]) -> Response<Body> {
    let headers = resp.headers_mut();
    for cookie in cookies {
        if let Ok(v) = HeaderValue::from_str(cookie) {
            headers.append(SET_COOKIE, v);
        }
    }
    resp
}

fn with_cors_headers(mut resp: Response<Body>, request_origin: Option<&str>) -> Response<Body> {
    let cors_origin = auth::get_cors_origin(request_origin);

    let headers = resp.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_str(&cors_origin)
            .unwrap_or_else(|_| HeaderValue::from_static("https://allfreedo.app")),
    );
    headers.insert(
        "Access-Control-Allow-Credentials",
        HeaderValue::from_static("true"),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PUT,PATCH,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,Authorization,Cookie"),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));

    resp
}

fn finalize_response(
    resp: Result<Response<Body>, Error>,
    request_origin: Option<&str>,
    cookies: &[String],
) -> Result<Response<Body>, Error> {
    resp.map(|r| with_cors_headers(with_set_cookies(r, cookies), request_origin))
}

fn not_found() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(serde_json::json!({"error": "Not found"}).to_string().into())
        .map_err(Box::new)?)
}

fn method_not_allowed() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "application/json")
        .body(
            serde_json::json!({"error": "Method not allowed"})
                .to_string()
                .into(),
        )
        .map_err(Box::new)?)
}

fn profile_required() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::FORBIDDEN)
        .header("Content-Type", "application/json")
        .body(
            serde_json::json!({"error": "Create a roomie profile first"})
                .to_string()
                .into(),
        )
        .map_err(Box::new)?)
}

fn task_filters_from_query(event: &Request) -> TaskFilters {
    let params = event.query_string_parameters();
    TaskFilters {
        completed: params.first("completed").and_then(|v| v.parse().ok()),
        assigned_roomie_id: params.first("assigned_roomie_id").map(|v| v.to_string()),
        after_date: params.first("after_date").map(|v| v.to_string()),
        before_date: params.first("before_date").map(|v| v.to_string()),
    }
}

/// Main Lambda handler - routes requests to auth, roomie and room endpoints
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let body = event.body();
    let request_origin = event.headers().get("Origin").and_then(|v| v.to_str().ok());
    tracing::info!("API invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if method == "OPTIONS" {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp, request_origin));
    }

    // Auth endpoints (no session required)
    if path.starts_with("/login") {
        let client_id = env::var("COGNITO_CLIENT_ID").expect("COGNITO_CLIENT_ID must be set");
        let client_secret =
            env::var("COGNITO_CLIENT_SECRET").expect("COGNITO_CLIENT_SECRET must be set");

        return match method {
            &Method::POST => finalize_response(
                auth::login(&state.cognito_client, &client_id, &client_secret, body).await,
                request_origin,
                &[],
            ),
            _ => finalize_response(method_not_allowed(), request_origin, &[]),
        };
    }

    if path.starts_with("/signup") {
        let client_id = env::var("COGNITO_CLIENT_ID").expect("COGNITO_CLIENT_ID must be set");
        let client_secret =
            env::var("COGNITO_CLIENT_SECRET").expect("COGNITO_CLIENT_SECRET must be set");

        return match method {
            &Method::POST => finalize_response(
                auth::signup(&state.cognito_client, &client_id, &client_secret, body).await,
                request_origin,
                &[],
            ),
            _ => finalize_response(method_not_allowed(), request_origin, &[]),
        };
    }

    if path.starts_with("/refresh") {
        let client_id = env::var("COGNITO_CLIENT_ID").expect("COGNITO_CLIENT_ID must be set");
        let client_secret =
            env::var("COGNITO_CLIENT_SECRET").expect("COGNITO_CLIENT_SECRET must be set");

        let cookie_header = event.headers().get("Cookie").and_then(|v| v.to_str().ok());

        return match method {
            &Method::POST => finalize_response(
                auth::refresh_token(
                    &state.cognito_client,
                    &client_id,
                    &client_secret,
                    cookie_header,
                )
                .await,
                request_origin,
                &[],
            ),
            _ => finalize_response(method_not_allowed(), request_origin, &[]),
        };
    }

    if path.starts_with("/logout") {
        return match method {
            &Method::POST => {
                let resp = Response::builder()
                    .status(StatusCode::OK)
                    .header("Content-Type", "application/json")
                    .header("Set-Cookie", auth::clear_cookie(auth::ACCESS_TOKEN_COOKIE))
                    .header("Set-Cookie", auth::clear_cookie(auth::REFRESH_TOKEN_COOKIE))
                    .header("Set-Cookie", auth::clear_cookie(auth::USERNAME_COOKIE))
                    .body(serde_json::json!({"message": "ok"}).to_string().into())
                    .map_err(Box::new)?;
                finalize_response(Ok(resp), request_origin, &[])
            }
            _ => finalize_response(method_not_allowed(), request_origin, &[]),
        };
    }

    // Everything below requires a session (cookie auth + auto-refresh)
    let table_name = env::var("TABLE_NAME").unwrap_or_else(|_| "allfreedo".to_string());
    let client_id = env::var("COGNITO_CLIENT_ID").expect("COGNITO_CLIENT_ID must be set");
    let client_secret =
        env::var("COGNITO_CLIENT_SECRET").expect("COGNITO_CLIENT_SECRET must be set");
    let cookie_header = event.headers().get("Cookie").and_then(|v| v.to_str().ok());

    let auth_ctx = match auth::authenticate_cookie_request(
        &state.cognito_client,
        &client_id,
        &client_secret,
        cookie_header,
    )
    .await
    {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(with_cors_headers(resp, request_origin)),
    };

    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    // Roomie profile routes (keyed by the auth identity, no profile needed yet)
    if path.starts_with("/roomies") {
        let resp = match (method, parts.as_slice()) {
            // POST /roomies - create the profile for this identity
            (&Method::POST, ["roomies"]) => {
                atoms::roomies::create_roomie(
                    &state.dynamo_client,
                    &table_name,
                    &auth_ctx.user_id,
                    body,
                )
                .await
            }
            // GET /roomies/me - current profile
            (&Method::GET, ["roomies", "me"]) => {
                atoms::roomies::get_current_roomie(
                    &state.dynamo_client,
                    &table_name,
                    &auth_ctx.user_id,
                )
                .await
            }
            // PATCH /roomies/me - update name/avatar
            (&Method::PATCH, ["roomies", "me"]) => {
                atoms::roomies::update_current_roomie(
                    &state.dynamo_client,
                    &table_name,
                    &auth_ctx.user_id,
                    body,
                )
                .await
            }
            _ => not_found(),
        };

        return finalize_response(resp, request_origin, &auth_ctx.set_cookies);
    }

    // Room routes require an existing roomie profile
    if path.starts_with("/rooms") {
        let roomie_id = match atoms::roomies::service::find_roomie_id_for_user(
            &state.dynamo_client,
            &table_name,
            &auth_ctx.user_id,
        )
        .await
        {
            Ok(Some(roomie_id)) => roomie_id,
            Ok(None) => {
                return finalize_response(profile_required(), request_origin, &auth_ctx.set_cookies)
            }
            Err(e) => {
                tracing::error!("Failed to resolve roomie: {}", e);
                let resp = Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .header("Content-Type", "application/json")
                    .body(serde_json::json!({"error": e}).to_string().into())
                    .map_err(Box::new)?;
                return finalize_response(Ok(resp), request_origin, &auth_ctx.set_cookies);
            }
        };

        let resp = match (method, parts.as_slice()) {
            // --- ROOMS ---
            // GET /rooms - rooms the current roomie belongs to
            (&Method::GET, ["rooms"]) => {
                atoms::rooms::http::list_rooms_for_roomie(
                    &state.dynamo_client,
                    &table_name,
                    &roomie_id,
                )
                .await
            }
            // POST /rooms - create room (creator auto-joins)
            (&Method::POST, ["rooms"]) => {
                atoms::rooms::http::create_room(&state.dynamo_client, &table_name, &roomie_id, body)
                    .await
            }
            // POST /rooms/join - join by access code
            (&Method::POST, ["rooms", "join"]) => {
                atoms::rooms::http::join_room(&state.dynamo_client, &table_name, &roomie_id, body)
                    .await
            }
            // GET /rooms/{id} - get room
            (&Method::GET, ["rooms", room_id]) => {
                atoms::rooms::http::get_room(&state.dynamo_client, &table_name, room_id).await
            }
            // PATCH /rooms/{id} - rename / describe
            (&Method::PATCH, ["rooms", room_id]) => {
                atoms::rooms::http::update_room(&state.dynamo_client, &table_name, room_id, body)
                    .await
            }
            // DELETE /rooms/{id} - delete room and contents
            (&Method::DELETE, ["rooms", room_id]) => {
                atoms::rooms::http::delete_room(&state.dynamo_client, &table_name, room_id).await
            }
            // POST /rooms/{id}/leave - leave the room
            (&Method::POST, ["rooms", room_id, "leave"]) => {
                atoms::rooms::http::leave_room(
                    &state.dynamo_client,
                    &table_name,
                    room_id,
                    &roomie_id,
                )
                .await
            }
            // GET /rooms/{id}/roomies - members in stable order
            (&Method::GET, ["rooms", room_id, "roomies"]) => {
                atoms::roomies::list_roomies_in_room(&state.dynamo_client, &table_name, room_id)
                    .await
            }
            // GET /rooms/{id}/overview - cached joined snapshot
            (&Method::GET, ["rooms", room_id, "overview"]) => {
                overview::room_overview_handler(
                    &state.dynamo_client,
                    &table_name,
                    &state.room_cache,
                    room_id,
                )
                .await
            }

            // --- TASKS ---
            // GET /rooms/{id}/tasks - list, filters in the query string
            (&Method::GET, ["rooms", room_id, "tasks"]) => {
                let filters = task_filters_from_query(&event);
                atoms::tasks::http::list_room_tasks(
                    &state.dynamo_client,
                    &table_name,
                    room_id,
                    &filters,
                )
                .await
            }
            // POST /rooms/{id}/tasks - create free-standing task
            (&Method::POST, ["rooms", room_id, "tasks"]) => {
                atoms::tasks::http::create_task(&state.dynamo_client, &table_name, room_id, body)
                    .await
            }
            // GET /rooms/{id}/tasks/{tid} - get task
            (&Method::GET, ["rooms", room_id, "tasks", task_id]) => {
                atoms::tasks::http::get_task(&state.dynamo_client, &table_name, room_id, task_id)
                    .await
            }
            // PATCH /rooms/{id}/tasks/{tid} - update task
            (&Method::PATCH, ["rooms", room_id, "tasks", task_id]) => {
                atoms::tasks::http::update_task(
                    &state.dynamo_client,
                    &table_name,
                    room_id,
                    task_id,
                    body,
                )
                .await
            }
            // DELETE /rooms/{id}/tasks/{tid} - delete task
            (&Method::DELETE, ["rooms", room_id, "tasks", task_id]) => {
                atoms::tasks::http::delete_task(&state.dynamo_client, &table_name, room_id, task_id)
                    .await
            }
            // POST /rooms/{id}/tasks/{tid}/done - mark done as current roomie
            (&Method::POST, ["rooms", room_id, "tasks", task_id, "done"]) => {
                atoms::tasks::http::mark_task_done(
                    &state.dynamo_client,
                    &table_name,
                    room_id,
                    task_id,
                    &roomie_id,
                )
                .await
            }

            // --- TASK RATINGS ---
            // GET /rooms/{id}/tasks/{tid}/ratings - all ratings
            (&Method::GET, ["rooms", _room_id, "tasks", task_id, "ratings"]) => {
                atoms::ratings::http::list_task_ratings(&state.dynamo_client, &table_name, task_id)
                    .await
            }
            // POST /rooms/{id}/tasks/{tid}/ratings - rate as current roomie
            (&Method::POST, ["rooms", room_id, "tasks", task_id, "ratings"]) => {
                atoms::ratings::http::rate_task(
                    &state.dynamo_client,
                    &table_name,
                    room_id,
                    task_id,
                    &roomie_id,
                    body,
                )
                .await
            }
            // GET /rooms/{id}/tasks/{tid}/ratings/average - average stars
            (&Method::GET, ["rooms", _room_id, "tasks", task_id, "ratings", "average"]) => {
                atoms::ratings::http::get_average_rating(&state.dynamo_client, &table_name, task_id)
                    .await
            }
            // GET /rooms/{id}/tasks/{tid}/ratings/me - own rating, if any
            (&Method::GET, ["rooms", _room_id, "tasks", task_id, "ratings", "me"]) => {
                atoms::ratings::http::get_own_rating(
                    &state.dynamo_client,
                    &table_name,
                    task_id,
                    &roomie_id,
                )
                .await
            }
            // PATCH /rooms/{id}/tasks/{tid}/ratings/me - change own rating
            (&Method::PATCH, ["rooms", _room_id, "tasks", task_id, "ratings", "me"]) => {
                atoms::ratings::http::update_rating(
                    &state.dynamo_client,
                    &table_name,
                    task_id,
                    &roomie_id,
                    body,
                )
                .await
            }
            // DELETE /rooms/{id}/tasks/{tid}/ratings/me - remove own rating
            (&Method::DELETE, ["rooms", _room_id, "tasks", task_id, "ratings", "me"]) => {
                atoms::ratings::http::delete_rating(
                    &state.dynamo_client,
                    &table_name,
                    task_id,
                    &roomie_id,
                )
                .await
            }

            // --- TASK TEMPLATES ---
            // GET /rooms/{id}/task-templates - list templates
            (&Method::GET, ["rooms", room_id, "task-templates"]) => {
                atoms::templates::http::list_room_templates(
                    &state.dynamo_client,
                    &table_name,
                    room_id,
                )
                .await
            }
            // POST /rooms/{id}/task-templates - create template
            (&Method::POST, ["rooms", room_id, "task-templates"]) => {
                atoms::templates::http::create_template(
                    &state.dynamo_client,
                    &table_name,
                    room_id,
                    &roomie_id,
                    body,
                )
                .await
            }
            // POST /rooms/{id}/task-templates/process - spawn everything due today
            (&Method::POST, ["rooms", room_id, "task-templates", "process"]) => {
                scheduling::process_recurring_handler(&state.dynamo_client, &table_name, room_id)
                    .await
            }
            // GET /rooms/{id}/task-templates/{tid} - get template
            (&Method::GET, ["rooms", room_id, "task-templates", template_id]) => {
                atoms::templates::http::get_template(
                    &state.dynamo_client,
                    &table_name,
                    room_id,
                    template_id,
                )
                .await
            }
            // PATCH /rooms/{id}/task-templates/{tid} - update template
            (&Method::PATCH, ["rooms", room_id, "task-templates", template_id]) => {
                atoms::templates::http::update_template(
                    &state.dynamo_client,
                    &table_name,
                    room_id,
                    template_id,
                    body,
                )
                .await
            }
            // DELETE /rooms/{id}/task-templates/{tid} - delete template
            (&Method::DELETE, ["rooms", room_id, "task-templates", template_id]) => {
                atoms::templates::http::delete_template(
                    &state.dynamo_client,
                    &table_name,
                    room_id,
                    template_id,
                )
                .await
            }
            // GET /rooms/{id}/task-templates/{tid}/schedule - rule, next firing
            (&Method::GET, ["rooms", room_id, "task-templates", template_id, "schedule"]) => {
                scheduling::template_schedule_handler(
                    &state.dynamo_client,
                    &table_name,
                    room_id,
                    template_id,
                )
                .await
            }
            // POST /rooms/{id}/task-templates/{tid}/spawn - spawn one task now
            (&Method::POST, ["rooms", room_id, "task-templates", template_id, "spawn"]) => {
                scheduling::spawn_template_handler(
                    &state.dynamo_client,
                    &table_name,
                    room_id,
                    template_id,
                    body,
                )
                .await
            }

            _ => not_found(),
        };

        // Any mutation makes the cached overview stale. Joining or creating
        // rooms carries no room id in the path, so those drop everything.
        if method != Method::GET {
            match parts.as_slice() {
                ["rooms", room_id, ..] if *room_id != "join" => {
                    state.room_cache.invalidate(room_id)
                }
                _ => state.room_cache.clear(),
            }
        }

        return finalize_response(resp, request_origin, &auth_ctx.set_cookies);
    }

    // No matching route
    tracing::warn!("No route matched - Method: {} Path: {}", method, path);
    finalize_response(not_found(), request_origin, &auth_ctx.set_cookies)
}
