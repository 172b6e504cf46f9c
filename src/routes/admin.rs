use actix_web::{http::header, middleware::from_fn, web, HttpResponse, Result};
use askama::Template;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

use crate::{
    auth::{hash_password, new_id, require_staff, AuthUser},
    db,
    models::{
        BookingDetailRow, BoxRow, PositionRow, ServiceCategoryRow, BOOKING_STATUSES, BOX_TYPES,
        STATUS_CANCELLED, STATUS_COMPLETED, STATUS_CONFIRMED, STATUS_IN_PROGRESS, STATUS_PENDING,
    },
    state::AppState,
    templates::render,
};

#[derive(Clone, Debug)]
struct StatCard {
    label: String,
    value: i64,
}

#[derive(Clone, Debug)]
struct BookingView {
    id: String,
    customer_name: String,
    service_name: String,
    booking_date: String,
    booking_time: String,
    status: String,
    total_price: String,
    employee_name: String,
    box_label: String,
    notes: String,
    has_notes: bool,
}

fn to_view(row: BookingDetailRow) -> BookingView {
    BookingView {
        id: row.id,
        customer_name: row.customer_name,
        service_name: row.service_name,
        booking_date: row.booking_date,
        booking_time: row.booking_time,
        status: row.status,
        total_price: row.total_price,
        employee_name: row.employee_name.unwrap_or_else(|| "Unassigned".to_string()),
        box_label: row
            .box_number
            .map(|number| format!("Box {number}"))
            .unwrap_or_else(|| "Unassigned".to_string()),
        has_notes: !row.notes.trim().is_empty(),
        notes: row.notes,
    }
}

#[derive(Clone, Debug)]
struct StatusOption {
    value: &'static str,
    selected: bool,
}

#[derive(Clone, Debug)]
struct EmployeeChoice {
    id: String,
    name: String,
    selected: bool,
}

#[derive(Clone, Debug)]
struct BoxChoice {
    id: String,
    label: String,
    selected: bool,
}

#[derive(Template)]
#[template(path = "admin_dashboard.html")]
struct DashboardTemplate {
    admin_name: String,
    stats: Vec<StatCard>,
    recent: Vec<BookingView>,
}

#[derive(Template)]
#[template(path = "admin_bookings.html")]
struct BookingsTemplate {
    bookings: Vec<BookingView>,
    status_filter: String,
}

#[derive(Template)]
#[template(path = "admin_booking_detail.html")]
struct BookingDetailTemplate {
    booking: BookingView,
    statuses: Vec<StatusOption>,
    employees: Vec<EmployeeChoice>,
    boxes: Vec<BoxChoice>,
}

#[derive(Clone, Debug)]
struct ServiceListItem {
    id: String,
    name: String,
    category_name: String,
    price: String,
    duration_minutes: i64,
    active: bool,
}

#[derive(Template)]
#[template(path = "admin_services.html")]
struct ServicesTemplate {
    services: Vec<ServiceListItem>,
    categories: Vec<ServiceCategoryRow>,
    errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "admin_categories.html")]
struct CategoriesTemplate {
    categories: Vec<ServiceCategoryRow>,
    errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "admin_boxes.html")]
struct BoxesTemplate {
    boxes: Vec<BoxRow>,
    errors: Vec<String>,
}

#[derive(Clone, Debug)]
struct EmployeeListItem {
    id: String,
    username: String,
    position_name: String,
    phone: String,
    hire_date: String,
    active: bool,
}

#[derive(Template)]
#[template(path = "admin_employees.html")]
struct EmployeesTemplate {
    employees: Vec<EmployeeListItem>,
    positions: Vec<PositionRow>,
    errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "admin_positions.html")]
struct PositionsTemplate {
    positions: Vec<PositionRow>,
    errors: Vec<String>,
}

#[derive(Clone, Debug)]
struct CustomerListItem {
    username: String,
    phone: String,
    car_model: String,
    car_number: String,
    discount: i64,
}

#[derive(Template)]
#[template(path = "admin_customers.html")]
struct CustomersTemplate {
    customers: Vec<CustomerListItem>,
}

#[derive(Deserialize)]
struct BookingFilter {
    status: Option<String>,
}

#[derive(Deserialize)]
struct BookingUpdateForm {
    status: String,
    employee_id: Option<String>,
    box_id: Option<String>,
}

#[derive(Deserialize)]
struct ServiceCreateForm {
    category_id: String,
    name: String,
    description: Option<String>,
    price: String,
    duration_minutes: i64,
}

#[derive(Deserialize)]
struct CategoryCreateForm {
    name: String,
    description: Option<String>,
    sort_order: Option<i64>,
}

#[derive(Deserialize)]
struct BoxCreateForm {
    number: i64,
    box_type: String,
    capacity: i64,
}

#[derive(Deserialize)]
struct EmployeeCreateForm {
    username: String,
    password: String,
    first_name: Option<String>,
    last_name: Option<String>,
    position_id: Option<String>,
    phone: String,
    hire_date: String,
}

#[derive(Deserialize)]
struct PositionCreateForm {
    name: String,
    description: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(from_fn(require_staff))
            .service(web::resource("").route(web::get().to(index)))
            .service(web::resource("/").route(web::get().to(index)))
            .service(web::resource("/dashboard").route(web::get().to(dashboard)))
            .service(web::resource("/bookings").route(web::get().to(list_bookings)))
            .service(
                web::resource("/bookings/{id}")
                    .route(web::get().to(booking_detail))
                    .route(web::post().to(update_booking)),
            )
            .service(
                web::resource("/services")
                    .route(web::get().to(list_services))
                    .route(web::post().to(create_service)),
            )
            .service(web::resource("/services/{id}/delete").route(web::post().to(delete_service)))
            .service(
                web::resource("/categories")
                    .route(web::get().to(list_categories))
                    .route(web::post().to(create_category)),
            )
            .service(
                web::resource("/boxes")
                    .route(web::get().to(list_boxes))
                    .route(web::post().to(create_box)),
            )
            .service(web::resource("/boxes/{id}/delete").route(web::post().to(delete_box)))
            .service(
                web::resource("/employees")
                    .route(web::get().to(list_employees))
                    .route(web::post().to(create_employee)),
            )
            .service(web::resource("/employees/{id}/delete").route(web::post().to(delete_employee)))
            .service(
                web::resource("/positions")
                    .route(web::get().to(list_positions))
                    .route(web::post().to(create_position)),
            )
            .service(web::resource("/customers").route(web::get().to(list_customers))),
    );
}

async fn index() -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, "/admin/dashboard"))
        .finish()
}

async fn status_count(state: &AppState, status: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings WHERE status = ?")
        .bind(status)
        .fetch_one(&state.db)
        .await
        .unwrap_or(0)
}

async fn dashboard(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
) -> Result<HttpResponse> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings")
        .fetch_one(&state.db)
        .await
        .unwrap_or(0);

    let stats = vec![
        StatCard {
            label: "Total bookings".to_string(),
            value: total,
        },
        StatCard {
            label: "Pending".to_string(),
            value: status_count(&state, STATUS_PENDING).await,
        },
        StatCard {
            label: "Confirmed".to_string(),
            value: status_count(&state, STATUS_CONFIRMED).await,
        },
        StatCard {
            label: "In progress".to_string(),
            value: status_count(&state, STATUS_IN_PROGRESS).await,
        },
        StatCard {
            label: "Completed".to_string(),
            value: status_count(&state, STATUS_COMPLETED).await,
        },
        StatCard {
            label: "Cancelled".to_string(),
            value: status_count(&state, STATUS_CANCELLED).await,
        },
    ];

    let recent = db::fetch_all_bookings(&state.db, None)
        .await
        .unwrap_or_default()
        .into_iter()
        .take(6)
        .map(to_view)
        .collect();

    Ok(render(DashboardTemplate {
        admin_name: auth.display_name.clone(),
        stats,
        recent,
    }))
}

async fn list_bookings(
    state: web::Data<AppState>,
    query: web::Query<BookingFilter>,
) -> Result<HttpResponse> {
    let status_filter = query.status.clone().unwrap_or_default();
    let filter = if status_filter.is_empty() {
        None
    } else {
        Some(status_filter.as_str())
    };

    let bookings = db::fetch_all_bookings(&state.db, filter)
        .await
        .unwrap_or_default()
        .into_iter()
        .map(to_view)
        .collect();

    Ok(render(BookingsTemplate {
        bookings,
        status_filter,
    }))
}

async fn employee_choices(state: &AppState, selected: Option<&str>) -> Vec<EmployeeChoice> {
    sqlx::query_as::<_, (String, String)>(
        r#"SELECT e.id, u.username
           FROM employees e
           JOIN users u ON e.user_id = u.id
           WHERE e.active = 1
           ORDER BY u.username"#,
    )
    .fetch_all(&state.db)
    .await
    .unwrap_or_default()
    .into_iter()
    .map(|(id, name)| EmployeeChoice {
        selected: selected == Some(id.as_str()),
        id,
        name,
    })
    .collect()
}

async fn box_choices(state: &AppState, selected: Option<&str>) -> Vec<BoxChoice> {
    db::fetch_active_boxes(&state.db)
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|row| BoxChoice {
            selected: selected == Some(row.id.as_str()),
            label: format!("Box {} ({})", row.number, row.box_type),
            id: row.id,
        })
        .collect()
}

async fn booking_detail(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let booking_id = path.into_inner();
    let row = match db::fetch_booking_detail(&state.db, &booking_id, None).await {
        Some(row) => row,
        None => return Ok(HttpResponse::NotFound().body("Booking not found")),
    };

    let statuses = BOOKING_STATUSES
        .iter()
        .map(|&value| StatusOption {
            value,
            selected: row.status == value,
        })
        .collect();
    let employees = employee_choices(&state, row.employee_id.as_deref()).await;
    let boxes = box_choices(&state, row.box_id.as_deref()).await;

    Ok(render(BookingDetailTemplate {
        booking: to_view(row),
        statuses,
        employees,
        boxes,
    }))
}

async fn update_booking(
    state: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Form<BookingUpdateForm>,
    auth: web::ReqData<AuthUser>,
) -> Result<HttpResponse> {
    let booking_id = path.into_inner();
    let form = form.into_inner();

    if !BOOKING_STATUSES.contains(&form.status.as_str()) {
        return Ok(HttpResponse::BadRequest().body("Invalid status"));
    }
    if db::fetch_booking_detail(&state.db, &booking_id, None).await.is_none() {
        return Ok(HttpResponse::NotFound().body("Booking not found"));
    }

    let employee_id = form
        .employee_id
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let box_id = form
        .box_id
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    db::update_booking_assignment(&state.db, &booking_id, &form.status, employee_id, box_id)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    log::info!(
        "{} set booking {booking_id} to {}",
        auth.username,
        form.status
    );

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, format!("/admin/bookings/{booking_id}")))
        .finish())
}

async fn fetch_service_items(state: &AppState) -> Vec<ServiceListItem> {
    sqlx::query_as::<_, (String, String, String, String, i64, i64)>(
        r#"SELECT s.id, s.name, c.name, s.price, s.duration_minutes, s.active
           FROM services s
           JOIN service_categories c ON s.category_id = c.id
           ORDER BY c.sort_order, s.name"#,
    )
    .fetch_all(&state.db)
    .await
    .unwrap_or_default()
    .into_iter()
    .map(|(id, name, category_name, price, duration_minutes, active)| ServiceListItem {
        id,
        name,
        category_name,
        price,
        duration_minutes,
        active: active == 1,
    })
    .collect()
}

async fn fetch_categories(state: &AppState) -> Vec<ServiceCategoryRow> {
    sqlx::query_as::<_, ServiceCategoryRow>(
        "SELECT id, name, description, sort_order FROM service_categories ORDER BY sort_order",
    )
    .fetch_all(&state.db)
    .await
    .unwrap_or_default()
}

async fn list_services(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(render(ServicesTemplate {
        services: fetch_service_items(&state).await,
        categories: fetch_categories(&state).await,
        errors: Vec::new(),
    }))
}

async fn create_service(
    state: web::Data<AppState>,
    form: web::Form<ServiceCreateForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    let mut errors = Vec::new();
    if form.name.trim().is_empty() {
        errors.push("Service name is required.".to_string());
    }
    if form.duration_minutes <= 0 {
        errors.push("Duration must be a positive number of minutes.".to_string());
    }
    let price = match Decimal::from_str(form.price.trim()) {
        Ok(price) if price >= Decimal::ZERO => Some(price.round_dp(2)),
        _ => {
            errors.push("Price must be a non-negative amount.".to_string());
            None
        }
    };

    if !errors.is_empty() {
        return Ok(render(ServicesTemplate {
            services: fetch_service_items(&state).await,
            categories: fetch_categories(&state).await,
            errors,
        }));
    }

    let description = form.description.unwrap_or_default();
    let result = sqlx::query(
        r#"INSERT INTO services (id, category_id, name, description, price, duration_minutes, active)
           VALUES (?, ?, ?, ?, ?, ?, 1)"#,
    )
    .bind(new_id())
    .bind(form.category_id.trim())
    .bind(form.name.trim())
    .bind(description.trim())
    .bind(price.unwrap_or_default().to_string())
    .bind(form.duration_minutes)
    .execute(&state.db)
    .await;

    if let Err(err) = result {
        return Ok(render(ServicesTemplate {
            services: fetch_service_items(&state).await,
            categories: fetch_categories(&state).await,
            errors: vec![format!("Failed to create service: {err}")],
        }));
    }

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/admin/services"))
        .finish())
}

async fn delete_service(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    // Bookings referencing the service go with it (CASCADE).
    sqlx::query("DELETE FROM services WHERE id = ?")
        .bind(path.into_inner())
        .execute(&state.db)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/admin/services"))
        .finish())
}

async fn list_categories(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(render(CategoriesTemplate {
        categories: fetch_categories(&state).await,
        errors: Vec::new(),
    }))
}

async fn create_category(
    state: web::Data<AppState>,
    form: web::Form<CategoryCreateForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    if form.name.trim().is_empty() {
        return Ok(render(CategoriesTemplate {
            categories: fetch_categories(&state).await,
            errors: vec!["Category name is required.".to_string()],
        }));
    }

    let description = form.description.unwrap_or_default();
    sqlx::query(
        "INSERT INTO service_categories (id, name, description, sort_order) VALUES (?, ?, ?, ?)",
    )
    .bind(new_id())
    .bind(form.name.trim())
    .bind(description.trim())
    .bind(form.sort_order.unwrap_or(0))
    .execute(&state.db)
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/admin/categories"))
        .finish())
}

async fn fetch_boxes(state: &AppState) -> Vec<BoxRow> {
    sqlx::query_as::<_, BoxRow>(
        "SELECT id, number, box_type, capacity, active FROM boxes ORDER BY number",
    )
    .fetch_all(&state.db)
    .await
    .unwrap_or_default()
}

async fn list_boxes(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(render(BoxesTemplate {
        boxes: fetch_boxes(&state).await,
        errors: Vec::new(),
    }))
}

async fn create_box(
    state: web::Data<AppState>,
    form: web::Form<BoxCreateForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    let mut errors = Vec::new();
    if form.number <= 0 {
        errors.push("Box number must be positive.".to_string());
    }
    if form.capacity <= 0 {
        errors.push("Capacity must be positive.".to_string());
    }
    if !BOX_TYPES.contains(&form.box_type.as_str()) {
        errors.push("Box type must be standard or premium.".to_string());
    }

    if !errors.is_empty() {
        return Ok(render(BoxesTemplate {
            boxes: fetch_boxes(&state).await,
            errors,
        }));
    }

    let result = sqlx::query(
        "INSERT INTO boxes (id, number, box_type, capacity, active) VALUES (?, ?, ?, ?, 1)",
    )
    .bind(new_id())
    .bind(form.number)
    .bind(&form.box_type)
    .bind(form.capacity)
    .execute(&state.db)
    .await;

    if let Err(err) = result {
        return Ok(render(BoxesTemplate {
            boxes: fetch_boxes(&state).await,
            errors: vec![format!("Failed to create box: {err}")],
        }));
    }

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/admin/boxes"))
        .finish())
}

async fn delete_box(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    // Dependent bookings keep running with the box reference cleared (SET NULL).
    sqlx::query("DELETE FROM boxes WHERE id = ?")
        .bind(path.into_inner())
        .execute(&state.db)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/admin/boxes"))
        .finish())
}

async fn fetch_employee_items(state: &AppState) -> Vec<EmployeeListItem> {
    sqlx::query_as::<_, (String, String, Option<String>, String, String, i64)>(
        r#"SELECT e.id, u.username, p.name, e.phone, e.hire_date, e.active
           FROM employees e
           JOIN users u ON e.user_id = u.id
           LEFT JOIN positions p ON e.position_id = p.id
           ORDER BY u.username"#,
    )
    .fetch_all(&state.db)
    .await
    .unwrap_or_default()
    .into_iter()
    .map(|(id, username, position_name, phone, hire_date, active)| EmployeeListItem {
        id,
        username,
        position_name: position_name.unwrap_or_else(|| "No position".to_string()),
        phone,
        hire_date,
        active: active == 1,
    })
    .collect()
}

async fn fetch_positions(state: &AppState) -> Vec<PositionRow> {
    sqlx::query_as::<_, PositionRow>("SELECT id, name, description FROM positions ORDER BY name")
        .fetch_all(&state.db)
        .await
        .unwrap_or_default()
}

async fn list_employees(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(render(EmployeesTemplate {
        employees: fetch_employee_items(&state).await,
        positions: fetch_positions(&state).await,
        errors: Vec::new(),
    }))
}

async fn create_employee(
    state: web::Data<AppState>,
    form: web::Form<EmployeeCreateForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    let mut errors = Vec::new();
    if form.username.trim().is_empty() {
        errors.push("Username is required.".to_string());
    }
    if form.password.len() < 6 {
        errors.push("Password must be at least 6 characters.".to_string());
    }
    if form.phone.trim().is_empty() {
        errors.push("Phone number is required.".to_string());
    }
    if chrono::NaiveDate::parse_from_str(form.hire_date.trim(), "%Y-%m-%d").is_err() {
        errors.push("Hire date must be a valid date.".to_string());
    }

    if !errors.is_empty() {
        return Ok(render(EmployeesTemplate {
            employees: fetch_employee_items(&state).await,
            positions: fetch_positions(&state).await,
            errors,
        }));
    }

    let password_hash = hash_password(&form.password)
        .map_err(|_| actix_web::error::ErrorInternalServerError("hash failure"))?;
    let first_name = form.first_name.unwrap_or_default();
    let last_name = form.last_name.unwrap_or_default();
    let position_id = form
        .position_id
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let result = db::create_employee(
        &state.db,
        db::NewEmployee {
            username: form.username.trim(),
            first_name: first_name.trim(),
            last_name: last_name.trim(),
            password_hash: &password_hash,
            position_id,
            phone: form.phone.trim(),
            hire_date: form.hire_date.trim(),
        },
    )
    .await;

    if let Err(err) = result {
        return Ok(render(EmployeesTemplate {
            employees: fetch_employee_items(&state).await,
            positions: fetch_positions(&state).await,
            errors: vec![format!("Failed to create employee: {err}")],
        }));
    }

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/admin/employees"))
        .finish())
}

async fn delete_employee(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    // Assigned bookings survive with the employee reference cleared (SET NULL).
    sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(path.into_inner())
        .execute(&state.db)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/admin/employees"))
        .finish())
}

async fn list_positions(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(render(PositionsTemplate {
        positions: fetch_positions(&state).await,
        errors: Vec::new(),
    }))
}

async fn create_position(
    state: web::Data<AppState>,
    form: web::Form<PositionCreateForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    if form.name.trim().is_empty() {
        return Ok(render(PositionsTemplate {
            positions: fetch_positions(&state).await,
            errors: vec!["Position name is required.".to_string()],
        }));
    }

    let description = form.description.unwrap_or_default();
    sqlx::query("INSERT INTO positions (id, name, description) VALUES (?, ?, ?)")
        .bind(new_id())
        .bind(form.name.trim())
        .bind(description.trim())
        .execute(&state.db)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/admin/positions"))
        .finish())
}

async fn list_customers(state: web::Data<AppState>) -> Result<HttpResponse> {
    let customers = sqlx::query_as::<_, (String, String, String, String, i64)>(
        r#"SELECT u.username, c.phone, c.car_model, c.car_number, c.discount
           FROM customers c
           JOIN users u ON c.user_id = u.id
           ORDER BY u.username"#,
    )
    .fetch_all(&state.db)
    .await
    .unwrap_or_default()
    .into_iter()
    .map(|(username, phone, car_model, car_number, discount)| CustomerListItem {
        username,
        phone,
        car_model,
        car_number,
        discount,
    })
    .collect();

    Ok(render(CustomersTemplate { customers }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{cookie::Cookie, http::StatusCode, test, App};
    use sqlx::sqlite::SqlitePoolOptions;

    use crate::auth::{new_id, SESSION_COOKIE};

    async fn test_state() -> AppState {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        db::run_migrations(&pool).await.expect("migrations");
        AppState { db: pool }
    }

    async fn seed_session(state: &AppState, username: &str, is_staff: i64) -> String {
        let user_id = new_id();
        sqlx::query(
            r#"INSERT INTO users (id, username, email, first_name, last_name, password_hash, is_staff, active, created_at)
               VALUES (?, ?, '', '', '', 'x', ?, 1, ?)"#,
        )
        .bind(&user_id)
        .bind(username)
        .bind(is_staff)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&state.db)
        .await
        .unwrap();

        let token = new_id();
        sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
            .bind(&token)
            .bind(&user_id)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&state.db)
            .await
            .unwrap();
        token
    }

    #[actix_web::test]
    async fn console_hidden_from_non_staff() {
        let state = test_state().await;
        let customer_token = seed_session(&state, "plain", 0).await;
        let staff_token = seed_session(&state, "boss", 1).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/admin/dashboard").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);

        let req = test::TestRequest::get()
            .uri("/admin/dashboard")
            .cookie(Cookie::new(SESSION_COOKIE, customer_token))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri("/admin/dashboard")
            .cookie(Cookie::new(SESSION_COOKIE, staff_token))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
