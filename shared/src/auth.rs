use aws_sdk_cognitoidentityprovider::types::{AttributeType, AuthFlowType};
use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;

pub const ACCESS_TOKEN_COOKIE: &str = "allfreedo_access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "allfreedo_refresh_token";
pub const USERNAME_COOKIE: &str = "allfreedo_username";

const ACCESS_TOKEN_MAX_AGE: u32 = 3600;
const REFRESH_TOKEN_MAX_AGE: u32 = 30 * 24 * 3600;

const ALLOWED_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "https://allfreedo.app",
    "https://www.allfreedo.app",
];

type HmacSha256 = Hmac<Sha256>;

/// Identity extracted from the request cookies, plus any cookies that must be
/// set on the response (a refreshed access token, mostly).
pub struct AuthContext {
    pub user_id: String,
    pub set_cookies: Vec<String>,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct SignupRequest {
    email: String,
    password: String,
}

/// Cognito SECRET_HASH: HMAC-SHA256 of username + client id, keyed by the
/// client secret.
fn secret_hash(username: &str, client_id: &str, client_secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(client_secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(username.as_bytes());
    mac.update(client_id.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Pick the CORS origin to echo back. Unknown origins fall back to prod.
pub fn get_cors_origin(request_origin: Option<&str>) -> String {
    match request_origin {
        Some(origin) if ALLOWED_ORIGINS.contains(&origin) => origin.to_string(),
        _ => "https://allfreedo.app".to_string(),
    }
}

fn parse_cookies(header: Option<&str>) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    if let Some(header) = header {
        for pair in header.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                cookies.insert(name.to_string(), value.to_string());
            }
        }
    }
    cookies
}

fn build_cookie(name: &str, value: &str, max_age: u32) -> String {
    format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; Secure; SameSite=None",
        name, value, max_age
    )
}

pub fn clear_cookie(name: &str) -> String {
    format!("{}=; Max-Age=0; Path=/; HttpOnly; Secure; SameSite=None", name)
}

fn json_response(status: StatusCode, body: String) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(body.into())
        .map_err(Box::new)?)
}

fn unauthorized(message: &str) -> Response<Body> {
    Response::builder()
        .status(StatusCode::UNAUTHORIZED)
        .header("Content-Type", "application/json")
        .body(serde_json::json!({ "error": message }).to_string().into())
        .unwrap_or_else(|_| Response::new(Body::Empty))
}

/// POST /login - password auth against Cognito, session handed back as
/// HttpOnly cookies
pub async fn login(
    client: &CognitoClient,
    client_id: &str,
    client_secret: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: LoginRequest = serde_json::from_slice(body)?;

    let result = client
        .initiate_auth()
        .auth_flow(AuthFlowType::UserPasswordAuth)
        .client_id(client_id)
        .auth_parameters("USERNAME", &req.email)
        .auth_parameters("PASSWORD", &req.password)
        .auth_parameters(
            "SECRET_HASH",
            secret_hash(&req.email, client_id, client_secret),
        )
        .send()
        .await;

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!("Login failed: {}", e);
            return json_response(
                StatusCode::UNAUTHORIZED,
                serde_json::json!({"error": "Invalid email or password"}).to_string(),
            );
        }
    };

    let tokens = match output.authentication_result() {
        Some(tokens) => tokens,
        None => {
            // Challenge flows (MFA, forced reset) are not handled here
            return json_response(
                StatusCode::UNAUTHORIZED,
                serde_json::json!({"error": "Further authentication required"}).to_string(),
            );
        }
    };

    let access_token = tokens.access_token().unwrap_or_default();
    let refresh_token = tokens.refresh_token().unwrap_or_default();

    let resp = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header(
            "Set-Cookie",
            build_cookie(ACCESS_TOKEN_COOKIE, access_token, ACCESS_TOKEN_MAX_AGE),
        )
        .header(
            "Set-Cookie",
            build_cookie(REFRESH_TOKEN_COOKIE, refresh_token, REFRESH_TOKEN_MAX_AGE),
        )
        .header(
            "Set-Cookie",
            build_cookie(USERNAME_COOKIE, &req.email, REFRESH_TOKEN_MAX_AGE),
        )
        .body(serde_json::json!({"message": "ok"}).to_string().into())
        .map_err(Box::new)?;
    Ok(resp)
}

/// POST /signup - create the Cognito account. The roomie profile is created
/// separately once the user is signed in.
pub async fn signup(
    client: &CognitoClient,
    client_id: &str,
    client_secret: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: SignupRequest = serde_json::from_slice(body)?;

    let email_attribute = AttributeType::builder()
        .name("email")
        .value(&req.email)
        .build()
        .map_err(Box::new)?;

    let result = client
        .sign_up()
        .client_id(client_id)
        .secret_hash(secret_hash(&req.email, client_id, client_secret))
        .username(&req.email)
        .password(&req.password)
        .user_attributes(email_attribute)
        .send()
        .await;

    match result {
        Ok(output) => json_response(
            StatusCode::CREATED,
            serde_json::json!({
                "message": "Account created",
                "user_confirmed": output.user_confirmed(),
            })
            .to_string(),
        ),
        Err(e) => {
            tracing::warn!("Signup failed: {}", e);
            json_response(
                StatusCode::BAD_REQUEST,
                serde_json::json!({"error": "Could not create account"}).to_string(),
            )
        }
    }
}

/// POST /refresh - mint a fresh access token from the refresh-token cookie
pub async fn refresh_token(
    client: &CognitoClient,
    client_id: &str,
    client_secret: &str,
    cookie_header: Option<&str>,
) -> Result<Response<Body>, Error> {
    let cookies = parse_cookies(cookie_header);

    let (refresh, username) = match (
        cookies.get(REFRESH_TOKEN_COOKIE),
        cookies.get(USERNAME_COOKIE),
    ) {
        (Some(refresh), Some(username)) => (refresh.clone(), username.clone()),
        _ => return Ok(unauthorized("Not signed in")),
    };

    match mint_access_token(client, client_id, client_secret, &refresh, &username).await {
        Some(access_token) => {
            let resp = Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "application/json")
                .header(
                    "Set-Cookie",
                    build_cookie(ACCESS_TOKEN_COOKIE, &access_token, ACCESS_TOKEN_MAX_AGE),
                )
                .body(serde_json::json!({"message": "ok"}).to_string().into())
                .map_err(Box::new)?;
            Ok(resp)
        }
        None => Ok(unauthorized("Session expired")),
    }
}

async fn mint_access_token(
    client: &CognitoClient,
    client_id: &str,
    client_secret: &str,
    refresh: &str,
    username: &str,
) -> Option<String> {
    let result = client
        .initiate_auth()
        .auth_flow(AuthFlowType::RefreshTokenAuth)
        .client_id(client_id)
        .auth_parameters("REFRESH_TOKEN", refresh)
        .auth_parameters(
            "SECRET_HASH",
            secret_hash(username, client_id, client_secret),
        )
        .send()
        .await;

    match result {
        Ok(output) => output
            .authentication_result()
            .and_then(|tokens| tokens.access_token())
            .map(|token| token.to_string()),
        Err(e) => {
            tracing::warn!("Token refresh failed: {}", e);
            None
        }
    }
}

/// Resolve the access token to the Cognito subject it belongs to.
async fn resolve_user(client: &CognitoClient, access_token: &str) -> Option<String> {
    let output = client.get_user().access_token(access_token).send().await.ok()?;

    let sub = output
        .user_attributes()
        .iter()
        .find(|attr| attr.name() == "sub")
        .and_then(|attr| attr.value())
        .map(|v| v.to_string());

    sub.or_else(|| Some(output.username().to_string()))
}

/// Authenticate a request from its cookies, refreshing the access token
/// transparently when it has expired. On failure the caller gets a ready 401
/// to return as-is.
pub async fn authenticate_cookie_request(
    client: &CognitoClient,
    client_id: &str,
    client_secret: &str,
    cookie_header: Option<&str>,
) -> Result<AuthContext, Response<Body>> {
    let cookies = parse_cookies(cookie_header);

    if let Some(access_token) = cookies.get(ACCESS_TOKEN_COOKIE) {
        if let Some(user_id) = resolve_user(client, access_token).await {
            return Ok(AuthContext {
                user_id,
                set_cookies: vec![],
            });
        }
    }

    // Access token missing or expired: try the refresh token
    let (refresh, username) = match (
        cookies.get(REFRESH_TOKEN_COOKIE),
        cookies.get(USERNAME_COOKIE),
    ) {
        (Some(refresh), Some(username)) => (refresh, username),
        _ => return Err(unauthorized("Not signed in")),
    };

    let access_token = match mint_access_token(client, client_id, client_secret, refresh, username)
        .await
    {
        Some(token) => token,
        None => return Err(unauthorized("Session expired")),
    };

    match resolve_user(client, &access_token).await {
        Some(user_id) => Ok(AuthContext {
            user_id,
            set_cookies: vec![build_cookie(
                ACCESS_TOKEN_COOKIE,
                &access_token,
                ACCESS_TOKEN_MAX_AGE,
            )],
        }),
        None => Err(unauthorized("Session expired")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_header_parsing_handles_spacing_and_empties() {
        let cookies = parse_cookies(Some("a=1; b=2;c=3"));
        assert_eq!(cookies.get("a").map(String::as_str), Some("1"));
        assert_eq!(cookies.get("b").map(String::as_str), Some("2"));
        assert_eq!(cookies.get("c").map(String::as_str), Some("3"));
        assert!(parse_cookies(None).is_empty());
        assert!(parse_cookies(Some("")).is_empty());
    }

    #[test]
    fn cookies_are_http_only_and_scoped_to_root() {
        let cookie = build_cookie("name", "value", 60);
        assert!(cookie.starts_with("name=value;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=60"));

        let cleared = clear_cookie("name");
        assert!(cleared.contains("Max-Age=0"));
    }

    #[test]
    fn secret_hash_is_deterministic_per_user() {
        let a = secret_hash("user@example.com", "client", "secret");
        let b = secret_hash("user@example.com", "client", "secret");
        let c = secret_hash("other@example.com", "client", "secret");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn unknown_origins_fall_back_to_prod() {
        assert_eq!(
            get_cors_origin(Some("http://localhost:3000")),
            "http://localhost:3000"
        );
        assert_eq!(get_cors_origin(Some("https://evil.test")), "https://allfreedo.app");
        assert_eq!(get_cors_origin(None), "https://allfreedo.app");
    }
}
