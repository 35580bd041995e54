use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use allfreedo_atoms::ratings;
use allfreedo_atoms::roomies::{self, model::Roomie};
use allfreedo_atoms::rooms::{self, model::Room};
use allfreedo_atoms::tasks::{self, model::Task, model::TaskFilters};
use allfreedo_atoms::templates::{self, model::TaskTemplate};
use scheduling_block::recurrence;

/// Everything a room screen needs, joined in one place
#[derive(Debug, Serialize, Clone)]
pub struct RoomOverview {
    pub room: Room,
    pub roomies: Vec<Roomie>,
    pub active_tasks: Vec<Task>,
    pub completed_tasks: Vec<Task>,
    pub templates: Vec<TaskTemplate>,

    /// Recurring templates whose rule fires today, ready to spawn
    pub due_template_ids: Vec<String>,

    /// Average stars per task id, None while a task is unrated
    pub average_ratings: HashMap<String, Option<f64>>,
}

/// Read-through cache of room overviews, keyed by room id.
///
/// Populated lazily on first access and dropped by `invalidate` whenever a
/// mutation touches the room; the next read refetches. There is no background
/// refresh and no TTL, so a stale entry lives until something invalidates it.
/// Owned by `AppState` and handed to handlers explicitly.
pub struct RoomCache {
    entries: Mutex<HashMap<String, Arc<RoomOverview>>>,
}

impl RoomCache {
    pub fn new() -> Self {
        RoomCache {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn cached(&self, room_id: &str) -> Option<Arc<RoomOverview>> {
        match self.entries.lock() {
            Ok(entries) => entries.get(room_id).cloned(),
            Err(_) => None,
        }
    }

    fn store(&self, room_id: &str, overview: RoomOverview) -> Arc<RoomOverview> {
        let overview = Arc::new(overview);
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(room_id.to_string(), overview.clone());
        }
        overview
    }

    pub fn invalidate(&self, room_id: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(room_id);
        }
    }

    /// Drop every snapshot; used when a mutation is not tied to one room
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl Default for RoomCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble the overview straight from the store
pub async fn load_room_overview(
    client: &DynamoClient,
    table_name: &str,
    room_id: &str,
) -> Result<RoomOverview, String> {
    let room = rooms::service::get_room(client, table_name, room_id).await?;

    let member_ids = rooms::service::list_member_ids(client, table_name, room_id).await?;
    let room_roomies = roomies::service::load_roomies(client, table_name, &member_ids).await?;

    let active_filters = TaskFilters {
        completed: Some(false),
        ..Default::default()
    };
    let completed_filters = TaskFilters {
        completed: Some(true),
        ..Default::default()
    };
    let (active, completed) = tokio::join!(
        tasks::service::load_tasks_for_room(client, table_name, room_id, &active_filters),
        tasks::service::load_tasks_for_room(client, table_name, room_id, &completed_filters),
    );
    let active_tasks = active?;
    let completed_tasks = completed?;

    let room_templates =
        templates::service::load_templates_for_room(client, table_name, room_id).await?;

    let today = chrono::Utc::now().date_naive();
    let due_template_ids: Vec<String> = room_templates
        .iter()
        .filter(|t| t.recurring)
        .filter(|t| {
            t.recurrence_rule
                .as_deref()
                .and_then(recurrence::parse_rule)
                .is_some_and(|rule| recurrence::is_due_on(&rule, today))
        })
        .map(|t| t.template_id.clone())
        .collect();

    let mut average_ratings = HashMap::new();
    for task in active_tasks.iter().chain(completed_tasks.iter()) {
        let average = ratings::service::average_rating(client, table_name, &task.task_id).await?;
        average_ratings.insert(task.task_id.clone(), average);
    }

    Ok(RoomOverview {
        room,
        roomies: room_roomies,
        active_tasks,
        completed_tasks,
        templates: room_templates,
        due_template_ids,
        average_ratings,
    })
}

/// Read-through lookup: cached snapshot if present, otherwise load and keep
pub async fn room_overview(
    client: &DynamoClient,
    table_name: &str,
    cache: &RoomCache,
    room_id: &str,
) -> Result<Arc<RoomOverview>, String> {
    if let Some(overview) = cache.cached(room_id) {
        return Ok(overview);
    }
    let overview = load_room_overview(client, table_name, room_id).await?;
    Ok(cache.store(room_id, overview))
}

/// GET handler for a room's overview
pub async fn room_overview_handler(
    client: &DynamoClient,
    table_name: &str,
    cache: &RoomCache,
    room_id: &str,
) -> Result<Response<Body>, Error> {
    match room_overview(client, table_name, cache, room_id).await {
        Ok(overview) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::to_string(overview.as_ref())?.into())
            .map_err(Box::new)?),
        Err(e) if e == "Room not found" => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::json!({"error": e}).to_string().into())
            .map_err(Box::new)?),
        Err(e) => {
            tracing::error!("Failed to build room overview: {}", e);
            Ok(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(serde_json::json!({"error": e}).to_string().into())
                .map_err(Box::new)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overview(room_id: &str) -> RoomOverview {
        RoomOverview {
            room: Room {
                room_id: room_id.to_string(),
                name: "Flat 3".to_string(),
                description: String::new(),
                access_code: "ABC123".to_string(),
                created_by: "ada".to_string(),
                created_at: String::new(),
            },
            roomies: vec![],
            active_tasks: vec![],
            completed_tasks: vec![],
            templates: vec![],
            due_template_ids: vec![],
            average_ratings: HashMap::new(),
        }
    }

    #[test]
    fn cache_misses_then_hits_then_invalidates() {
        let cache = RoomCache::new();
        assert!(cache.cached("r1").is_none());

        cache.store("r1", overview("r1"));
        assert!(cache.cached("r1").is_some());

        cache.invalidate("r1");
        assert!(cache.cached("r1").is_none());
    }

    #[test]
    fn invalidation_is_per_room() {
        let cache = RoomCache::new();
        cache.store("r1", overview("r1"));
        cache.store("r2", overview("r2"));

        cache.invalidate("r1");
        assert!(cache.cached("r1").is_none());
        assert!(cache.cached("r2").is_some());
    }
}
