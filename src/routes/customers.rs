use actix_web::{http::header, middleware::from_fn, web, HttpResponse, Result};
use askama::Template;
use serde::Deserialize;

use crate::{
    auth::{require_login, AuthUser},
    db,
    models::CustomerRow,
    pricing,
    state::AppState,
    templates::render,
};

#[derive(Clone, Debug)]
struct ProfileView {
    username: String,
    phone: String,
    car_model: String,
    car_number: String,
    discount: i64,
    notes: String,
}

fn to_view(auth: &AuthUser, customer: CustomerRow) -> ProfileView {
    ProfileView {
        username: auth.username.clone(),
        phone: customer.phone,
        car_model: customer.car_model,
        car_number: customer.car_number,
        discount: customer.discount,
        notes: customer.notes,
    }
}

#[derive(Template)]
#[template(path = "profile.html")]
struct ProfileTemplate {
    profile: ProfileView,
}

#[derive(Clone, Debug)]
struct DiscountChoice {
    value: u32,
    selected: bool,
}

#[derive(Template)]
#[template(path = "profile_edit.html")]
struct ProfileEditTemplate {
    profile: ProfileView,
    discounts: Vec<DiscountChoice>,
    errors: Vec<String>,
}

#[derive(Deserialize)]
struct ProfileForm {
    phone: String,
    car_model: Option<String>,
    car_number: Option<String>,
    discount: u32,
    notes: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/customers")
            .wrap(from_fn(require_login))
            .service(web::resource("/profile/").route(web::get().to(profile)))
            .service(
                web::resource("/profile/edit/")
                    .route(web::get().to(show_edit))
                    .route(web::post().to(edit)),
            ),
    );
}

fn discount_choices(selected: u32) -> Vec<DiscountChoice> {
    pricing::DISCOUNT_TIERS
        .iter()
        .map(|&value| DiscountChoice {
            value,
            selected: value == selected,
        })
        .collect()
}

async fn load_customer(state: &AppState, auth: &AuthUser) -> Option<CustomerRow> {
    db::fetch_customer_by_user(&state.db, &auth.id).await
}

async fn profile(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
) -> Result<HttpResponse> {
    let customer = match load_customer(&state, &auth).await {
        Some(customer) => customer,
        None => return Ok(HttpResponse::NotFound().body("Customer profile not found")),
    };

    Ok(render(ProfileTemplate {
        profile: to_view(&auth, customer),
    }))
}

async fn show_edit(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
) -> Result<HttpResponse> {
    let customer = match load_customer(&state, &auth).await {
        Some(customer) => customer,
        None => return Ok(HttpResponse::NotFound().body("Customer profile not found")),
    };

    let discount = customer.discount as u32;
    Ok(render(ProfileEditTemplate {
        profile: to_view(&auth, customer),
        discounts: discount_choices(discount),
        errors: Vec::new(),
    }))
}

async fn edit(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    form: web::Form<ProfileForm>,
) -> Result<HttpResponse> {
    let customer = match load_customer(&state, &auth).await {
        Some(customer) => customer,
        None => return Ok(HttpResponse::NotFound().body("Customer profile not found")),
    };

    let form = form.into_inner();
    let mut errors = Vec::new();
    if form.phone.trim().is_empty() {
        errors.push("Phone number is required.".to_string());
    }
    if !pricing::is_valid_discount(form.discount) {
        errors.push("Discount must be one of 0, 5, 10, 15 or 20 percent.".to_string());
    }

    if !errors.is_empty() {
        let profile = ProfileView {
            username: auth.username.clone(),
            phone: form.phone,
            car_model: form.car_model.unwrap_or_default(),
            car_number: form.car_number.unwrap_or_default(),
            discount: customer.discount,
            notes: form.notes.unwrap_or_default(),
        };
        return Ok(render(ProfileEditTemplate {
            profile,
            discounts: discount_choices(customer.discount as u32),
            errors,
        }));
    }

    let car_model = form.car_model.unwrap_or_default();
    let car_number = form.car_number.unwrap_or_default();
    let notes = form.notes.unwrap_or_default();
    sqlx::query(
        "UPDATE customers SET phone = ?, car_model = ?, car_number = ?, discount = ?, notes = ? WHERE id = ?",
    )
    .bind(form.phone.trim())
    .bind(car_model.trim())
    .bind(car_number.trim())
    .bind(form.discount as i64)
    .bind(notes.trim())
    .bind(&customer.id)
    .execute(&state.db)
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/customers/profile/"))
        .finish())
}
