use actix_web::{http::header, web, HttpRequest, HttpResponse, Result};
use askama::Template;
use serde::Deserialize;

use crate::{
    auth::{
        authenticate_credentials, clear_session_cookie, create_session, current_user,
        delete_session, hash_password, session_cookie, SESSION_COOKIE,
    },
    db,
    models::ServiceRow,
    state::AppState,
    templates::render,
};

#[derive(Clone, Debug)]
pub struct ServiceView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub duration_minutes: i64,
}

impl ServiceView {
    pub fn from_row(row: ServiceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            duration_minutes: row.duration_minutes,
        }
    }
}

#[derive(Clone, Debug)]
struct CategoryGroup {
    name: String,
    services: Vec<ServiceView>,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    services: Vec<ServiceView>,
    logged_in: bool,
}

#[derive(Template)]
#[template(path = "about.html")]
struct AboutTemplate;

#[derive(Template)]
#[template(path = "contact.html")]
struct ContactTemplate;

#[derive(Template)]
#[template(path = "price_list.html")]
struct PriceListTemplate {
    groups: Vec<CategoryGroup>,
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    errors: Vec<String>,
    next: String,
}

#[derive(Clone, Debug, Default)]
struct RegisterView {
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    phone: String,
    car_model: String,
    car_number: String,
}

#[derive(Template)]
#[template(path = "register.html")]
struct RegisterTemplate {
    form: RegisterView,
    errors: Vec<String>,
}

#[derive(Deserialize)]
struct LoginQuery {
    next: Option<String>,
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
    next: Option<String>,
}

#[derive(Deserialize)]
struct RegisterForm {
    username: String,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    password1: String,
    password2: String,
    phone: String,
    car_model: Option<String>,
    car_number: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/pages/about/").route(web::get().to(about)))
        .service(web::resource("/pages/contact/").route(web::get().to(contact)))
        .service(web::resource("/pages/price-list/").route(web::get().to(price_list)))
        .service(
            web::resource("/auth/login/")
                .route(web::get().to(show_login))
                .route(web::post().to(login)),
        )
        .service(web::resource("/auth/logout/").route(web::get().to(logout)))
        .service(
            web::resource("/auth/registration/")
                .route(web::get().to(show_registration))
                .route(web::post().to(register)),
        );
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn index(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let services = db::fetch_active_services(&state.db)
        .await
        .unwrap_or_default()
        .into_iter()
        .take(4)
        .map(ServiceView::from_row)
        .collect();
    let logged_in = current_user(&state, &req).await.is_some();

    Ok(render(IndexTemplate { services, logged_in }))
}

async fn about() -> Result<HttpResponse> {
    Ok(render(AboutTemplate))
}

async fn contact() -> Result<HttpResponse> {
    Ok(render(ContactTemplate))
}

async fn price_list(state: web::Data<AppState>) -> Result<HttpResponse> {
    let rows = sqlx::query_as::<_, (String, String)>(
        "SELECT id, name FROM service_categories ORDER BY sort_order",
    )
    .fetch_all(&state.db)
    .await
    .unwrap_or_default();

    let mut groups = Vec::with_capacity(rows.len());
    for (category_id, name) in rows {
        let services = sqlx::query_as::<_, ServiceRow>(
            r#"SELECT id, category_id, name, description, price, duration_minutes, active
               FROM services
               WHERE category_id = ? AND active = 1
               ORDER BY name"#,
        )
        .bind(&category_id)
        .fetch_all(&state.db)
        .await
        .unwrap_or_default()
        .into_iter()
        .map(ServiceView::from_row)
        .collect::<Vec<_>>();

        if !services.is_empty() {
            groups.push(CategoryGroup { name, services });
        }
    }

    Ok(render(PriceListTemplate { groups }))
}

async fn show_login(query: web::Query<LoginQuery>) -> Result<HttpResponse> {
    Ok(render(LoginTemplate {
        errors: Vec::new(),
        next: query.next.clone().unwrap_or_default(),
    }))
}

fn sanitize_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => "/".to_string(),
    }
}

async fn login(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    let user = match authenticate_credentials(&state, form.username.trim(), &form.password).await {
        Some(user) => user,
        None => {
            return Ok(render(LoginTemplate {
                errors: vec!["Invalid username or password.".to_string()],
                next: form.next.unwrap_or_default(),
            }));
        }
    };

    let token = create_session(&state, &user.id)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    log::info!("User {} logged in", user.username);

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, sanitize_next(form.next.as_deref())))
        .cookie(session_cookie(&req, token))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish())
}

async fn logout(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        delete_session(&state, cookie.value()).await;
    }
    HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/"))
        .cookie(clear_session_cookie(&req))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}

async fn show_registration() -> Result<HttpResponse> {
    Ok(render(RegisterTemplate {
        form: RegisterView::default(),
        errors: Vec::new(),
    }))
}

async fn register(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    let mut errors = Vec::new();
    if form.username.trim().is_empty() {
        errors.push("Username is required.".to_string());
    }
    if form.phone.trim().is_empty() {
        errors.push("Phone number is required.".to_string());
    }
    if form.password1.len() < 6 {
        errors.push("Password must be at least 6 characters.".to_string());
    }
    if form.password1 != form.password2 {
        errors.push("Passwords do not match.".to_string());
    }

    let view = RegisterView {
        username: form.username.trim().to_string(),
        email: form.email.clone().unwrap_or_default(),
        first_name: form.first_name.clone().unwrap_or_default(),
        last_name: form.last_name.clone().unwrap_or_default(),
        phone: form.phone.trim().to_string(),
        car_model: form.car_model.clone().unwrap_or_default(),
        car_number: form.car_number.clone().unwrap_or_default(),
    };

    if !errors.is_empty() {
        return Ok(render(RegisterTemplate { form: view, errors }));
    }

    let password_hash = hash_password(&form.password1)
        .map_err(|_| actix_web::error::ErrorInternalServerError("hash failure"))?;

    let result = db::register_customer(
        &state.db,
        db::Registration {
            username: &view.username,
            email: view.email.trim(),
            first_name: view.first_name.trim(),
            last_name: view.last_name.trim(),
            password_hash: &password_hash,
            phone: &view.phone,
            car_model: view.car_model.trim(),
            car_number: view.car_number.trim(),
        },
    )
    .await;

    let user_id = match result {
        Ok(user_id) => user_id,
        Err(err) => {
            log::warn!("Registration failed for {}: {err}", view.username);
            return Ok(render(RegisterTemplate {
                form: view,
                errors: vec!["That username is already taken.".to_string()],
            }));
        }
    };

    let token = create_session(&state, &user_id)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    log::info!("Registered new customer {}", view.username);

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/"))
        .cookie(session_cookie(&req, token))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_state() -> AppState {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        db::run_migrations(&pool).await.expect("migrations");
        AppState { db: pool }
    }

    async fn row_counts(state: &AppState) -> (i64, i64) {
        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&state.db)
            .await
            .unwrap();
        let customers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&state.db)
            .await
            .unwrap();
        (users, customers)
    }

    #[actix_web::test]
    async fn mismatched_passwords_create_nothing() {
        let state = test_state().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/auth/registration/")
            .set_form([
                ("username", "mallory"),
                ("password1", "secret123"),
                ("password2", "different"),
                ("phone", "+79000000000"),
            ])
            .to_request();
        let res = test::call_service(&app, req).await;
        // Validation failure re-renders the form instead of redirecting.
        assert_eq!(res.status(), StatusCode::OK);

        assert_eq!(row_counts(&state).await, (0, 0));
    }

    #[actix_web::test]
    async fn registration_creates_account_profile_and_session() {
        let state = test_state().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/auth/registration/")
            .set_form([
                ("username", "ivan"),
                ("email", "ivan@example.com"),
                ("first_name", "Ivan"),
                ("last_name", "Petrov"),
                ("password1", "secret123"),
                ("password2", "secret123"),
                ("phone", "+79123456789"),
                ("car_model", "Lada Vesta"),
                ("car_number", "B777BB"),
            ])
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        let cookies: Vec<_> = res.response().cookies().collect();
        assert!(cookies.iter().any(|c| c.name() == SESSION_COOKIE));

        assert_eq!(row_counts(&state).await, (1, 1));

        let (phone, car_model): (String, String) =
            sqlx::query_as("SELECT phone, car_model FROM customers LIMIT 1")
                .fetch_one(&state.db)
                .await
                .unwrap();
        assert_eq!(phone, "+79123456789");
        assert_eq!(car_model, "Lada Vesta");
    }
}
