use actix_web::{http::header, middleware::from_fn, web, HttpResponse, Result};
use askama::Template;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use crate::{
    auth::{require_login, AuthUser},
    db,
    models::BookingDetailRow,
    state::AppState,
    templates::render,
};

#[derive(Clone, Debug)]
struct BookingView {
    id: String,
    service_name: String,
    booking_date: String,
    booking_time: String,
    status: String,
    total_price: String,
    notes: String,
    has_notes: bool,
    employee_name: String,
    box_label: String,
}

fn to_view(row: BookingDetailRow) -> BookingView {
    BookingView {
        id: row.id,
        service_name: row.service_name,
        booking_date: row.booking_date,
        booking_time: row.booking_time,
        status: row.status,
        has_notes: !row.notes.trim().is_empty(),
        notes: row.notes,
        total_price: row.total_price,
        employee_name: row.employee_name.unwrap_or_else(|| "Unassigned".to_string()),
        box_label: row
            .box_number
            .map(|number| format!("Box {number}"))
            .unwrap_or_else(|| "Unassigned".to_string()),
    }
}

#[derive(Clone, Debug)]
struct ServiceChoice {
    id: String,
    name: String,
    price: String,
    selected: bool,
}

#[derive(Clone, Debug, Default)]
struct BookingFormView {
    booking_date: String,
    booking_time: String,
    notes: String,
}

#[derive(Template)]
#[template(path = "booking_form.html")]
struct BookingFormTemplate {
    services: Vec<ServiceChoice>,
    form: BookingFormView,
    errors: Vec<String>,
    editing: bool,
}

#[derive(Template)]
#[template(path = "my_bookings.html")]
struct MyBookingsTemplate {
    bookings: Vec<BookingView>,
}

#[derive(Template)]
#[template(path = "booking_detail.html")]
struct BookingDetailTemplate {
    booking: BookingView,
    can_edit: bool,
}

#[derive(Template)]
#[template(path = "booking_confirm_delete.html")]
struct BookingDeleteTemplate {
    booking: BookingView,
}

#[derive(Deserialize)]
struct BookingForm {
    service_id: String,
    booking_date: String,
    booking_time: String,
    notes: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/bookings")
            .wrap(from_fn(require_login))
            .service(
                web::resource("/")
                    .route(web::get().to(show_create))
                    .route(web::post().to(create)),
            )
            .service(web::resource("/my/").route(web::get().to(my_bookings)))
            .service(web::resource("/{id}/").route(web::get().to(detail)))
            .service(
                web::resource("/{id}/edit/")
                    .route(web::get().to(show_edit))
                    .route(web::post().to(edit)),
            )
            .service(
                web::resource("/{id}/delete/")
                    .route(web::get().to(show_delete))
                    .route(web::post().to(delete)),
            ),
    );
}

async fn service_choices(state: &AppState, selected_id: Option<&str>) -> Vec<ServiceChoice> {
    db::fetch_active_services(&state.db)
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|row| ServiceChoice {
            selected: selected_id == Some(row.id.as_str()),
            id: row.id,
            name: row.name,
            price: row.price,
        })
        .collect()
}

// A tampered or stale form may carry an id that matches no bookable service;
// that is a form error, not a server fault.
fn validate_service_choice(services: &[ServiceChoice], service_id: &str, errors: &mut Vec<String>) {
    if service_id.is_empty() {
        errors.push("Please select a service.".to_string());
    } else if !services.iter().any(|choice| choice.id == service_id) {
        errors.push("Please select a valid service.".to_string());
    }
}

fn validate_schedule(date: &str, time: &str, errors: &mut Vec<String>) {
    if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
        errors.push("Please pick a valid date.".to_string());
    }
    if NaiveTime::parse_from_str(time, "%H:%M").is_err()
        && NaiveTime::parse_from_str(time, "%H:%M:%S").is_err()
    {
        errors.push("Please pick a valid time.".to_string());
    }
}

async fn require_customer(
    state: &AppState,
    auth: &AuthUser,
) -> Result<crate::models::CustomerRow, HttpResponse> {
    match db::fetch_customer_by_user(&state.db, &auth.id).await {
        Some(customer) => Ok(customer),
        None => Err(HttpResponse::NotFound().body("Customer profile not found")),
    }
}

async fn show_create(state: web::Data<AppState>) -> Result<HttpResponse> {
    let services = service_choices(&state, None).await;
    Ok(render(BookingFormTemplate {
        services,
        form: BookingFormView::default(),
        errors: Vec::new(),
        editing: false,
    }))
}

async fn create(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    form: web::Form<BookingForm>,
) -> Result<HttpResponse> {
    let customer = match require_customer(&state, &auth).await {
        Ok(customer) => customer,
        Err(response) => return Ok(response),
    };

    let form = form.into_inner();
    let notes = form.notes.unwrap_or_default();
    let service_id = form.service_id.trim().to_string();
    let services = service_choices(&state, Some(service_id.as_str())).await;

    let mut errors = Vec::new();
    validate_service_choice(&services, &service_id, &mut errors);
    validate_schedule(&form.booking_date, &form.booking_time, &mut errors);

    if !errors.is_empty() {
        return Ok(render(BookingFormTemplate {
            services,
            form: BookingFormView {
                booking_date: form.booking_date,
                booking_time: form.booking_time,
                notes,
            },
            errors,
            editing: false,
        }));
    }

    let booking_id = db::insert_booking(
        &state.db,
        db::NewBooking {
            customer_id: &customer.id,
            service_id: &service_id,
            booking_date: form.booking_date.trim(),
            booking_time: form.booking_time.trim(),
            notes: notes.trim(),
        },
    )
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    log::info!("Customer {} created booking {booking_id}", auth.username);

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/bookings/my/"))
        .finish())
}

async fn my_bookings(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
) -> Result<HttpResponse> {
    let customer = match require_customer(&state, &auth).await {
        Ok(customer) => customer,
        Err(response) => return Ok(response),
    };

    let bookings = db::fetch_customer_bookings(&state.db, &customer.id)
        .await
        .unwrap_or_default()
        .into_iter()
        .map(to_view)
        .collect();

    Ok(render(MyBookingsTemplate { bookings }))
}

async fn detail(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let booking_id = path.into_inner();

    // Staff see any booking; customers only their own, by query scoping.
    let row = if auth.is_staff {
        db::fetch_booking_detail(&state.db, &booking_id, None).await
    } else {
        let customer = match require_customer(&state, &auth).await {
            Ok(customer) => customer,
            Err(response) => return Ok(response),
        };
        db::fetch_booking_detail(&state.db, &booking_id, Some(&customer.id)).await
    };

    let row = match row {
        Some(row) => row,
        None => return Ok(HttpResponse::NotFound().body("Booking not found")),
    };

    Ok(render(BookingDetailTemplate {
        can_edit: !auth.is_staff,
        booking: to_view(row),
    }))
}

async fn owned_booking(
    state: &AppState,
    auth: &AuthUser,
    booking_id: &str,
) -> Result<BookingDetailRow, HttpResponse> {
    let customer = match db::fetch_customer_by_user(&state.db, &auth.id).await {
        Some(customer) => customer,
        None => return Err(HttpResponse::NotFound().body("Customer profile not found")),
    };
    match db::fetch_booking_detail(&state.db, booking_id, Some(&customer.id)).await {
        Some(row) => Ok(row),
        None => Err(HttpResponse::NotFound().body("Booking not found")),
    }
}

async fn show_edit(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let booking_id = path.into_inner();
    let row = match owned_booking(&state, &auth, &booking_id).await {
        Ok(row) => row,
        Err(response) => return Ok(response),
    };

    let services = service_choices(&state, Some(row.service_id.as_str())).await;
    Ok(render(BookingFormTemplate {
        services,
        form: BookingFormView {
            booking_date: row.booking_date,
            booking_time: row.booking_time,
            notes: row.notes,
        },
        errors: Vec::new(),
        editing: true,
    }))
}

async fn edit(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    form: web::Form<BookingForm>,
) -> Result<HttpResponse> {
    let booking_id = path.into_inner();
    if let Err(response) = owned_booking(&state, &auth, &booking_id).await {
        return Ok(response);
    }

    let form = form.into_inner();
    let notes = form.notes.unwrap_or_default();
    let service_id = form.service_id.trim().to_string();
    let services = service_choices(&state, Some(service_id.as_str())).await;

    let mut errors = Vec::new();
    validate_service_choice(&services, &service_id, &mut errors);
    validate_schedule(&form.booking_date, &form.booking_time, &mut errors);

    if !errors.is_empty() {
        return Ok(render(BookingFormTemplate {
            services,
            form: BookingFormView {
                booking_date: form.booking_date,
                booking_time: form.booking_time,
                notes,
            },
            errors,
            editing: true,
        }));
    }

    db::update_booking_details(
        &state.db,
        &booking_id,
        &service_id,
        form.booking_date.trim(),
        form.booking_time.trim(),
        notes.trim(),
    )
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, format!("/bookings/{booking_id}/")))
        .finish())
}

async fn show_delete(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let booking_id = path.into_inner();
    match owned_booking(&state, &auth, &booking_id).await {
        Ok(row) => Ok(render(BookingDeleteTemplate { booking: to_view(row) })),
        Err(response) => Ok(response),
    }
}

async fn delete(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let booking_id = path.into_inner();
    let row = match owned_booking(&state, &auth, &booking_id).await {
        Ok(row) => row,
        Err(response) => return Ok(response),
    };

    sqlx::query("DELETE FROM bookings WHERE id = ? AND customer_id = ?")
        .bind(&row.id)
        .bind(&row.customer_id)
        .execute(&state.db)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    log::info!("Customer {} deleted booking {}", auth.username, row.id);

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/bookings/my/"))
        .finish())
}
