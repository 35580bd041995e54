pub mod auth;
pub mod overview;
pub mod types;

use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use aws_sdk_dynamodb::Client as DynamoClient;

use overview::RoomCache;

/// Clients and caches shared across warm invocations of a lambda
pub struct AppState {
    pub dynamo_client: DynamoClient,
    pub cognito_client: CognitoClient,
    pub room_cache: RoomCache,
}

impl AppState {
    /// Build the state once at cold start from the ambient AWS environment
    pub async fn init() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        AppState {
            dynamo_client: DynamoClient::new(&config),
            cognito_client: CognitoClient::new(&config),
            room_cache: RoomCache::new(),
        }
    }
}
