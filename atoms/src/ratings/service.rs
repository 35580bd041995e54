use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::model::TaskRating;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Canonical rating range. Star widgets render five stars; anything else is
/// rejected here regardless of which call path the value arrived through.
pub fn validate_rating(rating: u8) -> Result<(), String> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(format!(
            "Rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        ))
    }
}

fn rating_from_item(
    task_id: &str,
    roomie_id: &str,
    item: &HashMap<String, AttributeValue>,
) -> TaskRating {
    TaskRating {
        task_id: task_id.to_string(),
        roomie_id: roomie_id.to_string(),
        rating: item
            .get("rating")
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse().ok())
            .unwrap_or(MIN_RATING),
        created_at: item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    }
}

/// One roomie's rating of a task, if they have rated it
pub async fn get_rating(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
    roomie_id: &str,
) -> Result<Option<TaskRating>, String> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("TASK#{}", task_id)))
        .key("SK", AttributeValue::S(format!("RATING#{}", roomie_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    Ok(result
        .item()
        .map(|item| rating_from_item(task_id, roomie_id, item)))
}

/// Rate a completed task, once per roomie. The uniqueness guard is a
/// pre-check, so two racing first ratings can both land; the last write wins.
pub async fn rate_task(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
    roomie_id: &str,
    rating: u8,
) -> Result<TaskRating, String> {
    validate_rating(rating)?;

    if get_rating(client, table_name, task_id, roomie_id)
        .await?
        .is_some()
    {
        return Err("You have already rated this task".to_string());
    }

    let now = chrono::Utc::now().to_rfc3339();

    client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(format!("TASK#{}", task_id)))
        .item("SK", AttributeValue::S(format!("RATING#{}", roomie_id)))
        .item("rating", AttributeValue::N(rating.to_string()))
        .item("created_at", AttributeValue::S(now.clone()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(TaskRating {
        task_id: task_id.to_string(),
        roomie_id: roomie_id.to_string(),
        rating,
        created_at: now,
    })
}

/// All ratings on a task
pub async fn load_ratings_for_task(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
) -> Result<Vec<TaskRating>, String> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S(format!("TASK#{}", task_id)))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("RATING#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    let mut ratings = Vec::new();
    for item in result.items() {
        if let Some(sk) = item.get("SK").and_then(|v| v.as_s().ok()) {
            if let Some(roomie_id) = sk.strip_prefix("RATING#") {
                ratings.push(rating_from_item(task_id, roomie_id, item));
            }
        }
    }

    Ok(ratings)
}

/// Average rating rounded to one decimal, None when the task is unrated
pub async fn average_rating(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
) -> Result<Option<f64>, String> {
    let ratings = load_ratings_for_task(client, table_name, task_id).await?;

    Ok(average_of(&ratings))
}

pub(crate) fn average_of(ratings: &[TaskRating]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: u32 = ratings.iter().map(|r| u32::from(r.rating)).sum();
    let average = f64::from(sum) / ratings.len() as f64;
    Some((average * 10.0).round() / 10.0)
}

/// Change an existing rating
pub async fn update_rating(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
    roomie_id: &str,
    rating: u8,
) -> Result<TaskRating, String> {
    validate_rating(rating)?;

    if get_rating(client, table_name, task_id, roomie_id)
        .await?
        .is_none()
    {
        return Err("Rating not found".to_string());
    }

    client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("TASK#{}", task_id)))
        .key("SK", AttributeValue::S(format!("RATING#{}", roomie_id)))
        .update_expression("SET rating = :rating")
        .expression_attribute_values(":rating", AttributeValue::N(rating.to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB update_item error: {}", e))?;

    match get_rating(client, table_name, task_id, roomie_id).await? {
        Some(rating) => Ok(rating),
        None => Err("Rating not found".to_string()),
    }
}

/// Remove a rating
pub async fn delete_rating(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
    roomie_id: &str,
) -> Result<(), String> {
    client
        .delete_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("TASK#{}", task_id)))
        .key("SK", AttributeValue::S(format!("RATING#{}", roomie_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB delete_item error: {}", e))?;

    Ok(())
}

/// Cascade used when a task is deleted
pub async fn delete_ratings_for_task(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
) -> Result<(), String> {
    let ratings = load_ratings_for_task(client, table_name, task_id).await?;

    for rating in ratings {
        delete_rating(client, table_name, task_id, &rating.roomie_id).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(roomie: &str, stars: u8) -> TaskRating {
        TaskRating {
            task_id: "t".to_string(),
            roomie_id: roomie.to_string(),
            rating: stars,
            created_at: String::new(),
        }
    }

    #[test]
    fn ratings_outside_one_to_five_are_rejected() {
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        // The star widget has five stars; the old 1-10 path is gone
        assert!(validate_rating(6).is_err());
        assert!(validate_rating(10).is_err());
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        let ratings = vec![rating("a", 5), rating("b", 4), rating("c", 4)];
        assert_eq!(average_of(&ratings), Some(4.3));
    }

    #[test]
    fn average_of_no_ratings_is_none() {
        assert_eq!(average_of(&[]), None);
    }
}
