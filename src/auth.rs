use actix_web::{
    body::{BoxBody, MessageBody},
    cookie::{time::Duration, Cookie, SameSite},
    dev::{ServiceRequest, ServiceResponse},
    http::header,
    middleware::Next,
    web, Error, HttpMessage, HttpRequest, HttpResponse,
};
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use uuid::Uuid;

use crate::{models::UserRow, state::AppState};

pub const SESSION_COOKIE: &str = "carwash_session";

/// Request-scoped identity. Middleware resolves the session cookie to this
/// and stores it in request extensions; handlers take it via `web::ReqData`.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub is_staff: bool,
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub async fn authenticate_credentials(
    state: &AppState,
    username: &str,
    password: &str,
) -> Option<AuthUser> {
    let user = sqlx::query_as::<_, UserRow>(
        r#"SELECT id, username, email, first_name, last_name, password_hash, is_staff, active, created_at
           FROM users
           WHERE username = ? AND active = 1
           LIMIT 1"#,
    )
    .bind(username)
    .fetch_optional(&state.db)
    .await
    .ok()??;

    if !verify_password(password, &user.password_hash) {
        return None;
    }

    Some(AuthUser {
        display_name: user.display_name(),
        id: user.id,
        username: user.username,
        is_staff: user.is_staff == 1,
    })
}

pub async fn create_session(state: &AppState, user_id: &str) -> Result<String, sqlx::Error> {
    let token = new_id();
    sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
        .bind(&token)
        .bind(user_id)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&state.db)
        .await?;
    Ok(token)
}

pub async fn delete_session(state: &AppState, token: &str) {
    let _ = sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(&state.db)
        .await;
}

pub fn session_cookie(req: &HttpRequest, token: String) -> Cookie<'static> {
    let mut builder = Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(14));
    if req.connection_info().scheme() == "https" {
        builder = builder.secure(true);
    }
    builder.finish()
}

pub fn clear_session_cookie(req: &HttpRequest) -> Cookie<'static> {
    let mut builder = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(0));
    if req.connection_info().scheme() == "https" {
        builder = builder.secure(true);
    }
    builder.finish()
}

pub async fn current_user(state: &AppState, req: &HttpRequest) -> Option<AuthUser> {
    let cookie = req.cookie(SESSION_COOKIE)?;
    let user = sqlx::query_as::<_, UserRow>(
        r#"SELECT u.id, u.username, u.email, u.first_name, u.last_name,
                  u.password_hash, u.is_staff, u.active, u.created_at
           FROM sessions s
           JOIN users u ON s.user_id = u.id
           WHERE s.token = ? AND u.active = 1
           LIMIT 1"#,
    )
    .bind(cookie.value())
    .fetch_optional(&state.db)
    .await
    .ok()??;

    Some(AuthUser {
        display_name: user.display_name(),
        id: user.id,
        username: user.username,
        is_staff: user.is_staff == 1,
    })
}

fn login_redirect(path: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header((header::LOCATION, format!("/auth/login/?next={path}")))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}

async fn resolve_user(req: &ServiceRequest) -> Option<AuthUser> {
    let state = req.app_data::<web::Data<AppState>>()?;
    current_user(state, req.request()).await
}

pub async fn require_login<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<BoxBody>, Error>
where
    B: MessageBody + 'static,
{
    match resolve_user(&req).await {
        Some(user) => {
            req.extensions_mut().insert(user);
            let res = next.call(req).await?;
            Ok(res.map_into_boxed_body())
        }
        None => {
            let response = login_redirect(req.path());
            Ok(req.into_response(response))
        }
    }
}

/// Staff console guard. Unauthenticated requests go to login; authenticated
/// non-staff get a 404 so the console's existence is not confirmed to them.
pub async fn require_staff<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<BoxBody>, Error>
where
    B: MessageBody + 'static,
{
    match resolve_user(&req).await {
        Some(user) if user.is_staff => {
            req.extensions_mut().insert(user);
            let res = next.call(req).await?;
            Ok(res.map_into_boxed_body())
        }
        Some(_) => {
            let response = HttpResponse::NotFound().body("Not found");
            Ok(req.into_response(response))
        }
        None => {
            let response = login_redirect(req.path());
            Ok(req.into_response(response))
        }
    }
}
