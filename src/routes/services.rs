use actix_web::{web, HttpResponse, Result};
use askama::Template;

use crate::{
    models::{ServiceCategoryRow, ServiceRow},
    routes::public::ServiceView,
    state::AppState,
    templates::render,
};

#[derive(Clone, Debug)]
struct CategorySection {
    name: String,
    description: String,
    services: Vec<ServiceView>,
}

#[derive(Template)]
#[template(path = "service_list.html")]
struct ServiceListTemplate {
    sections: Vec<CategorySection>,
}

#[derive(Template)]
#[template(path = "service_detail.html")]
struct ServiceDetailTemplate {
    service: ServiceView,
    category_name: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/services/").route(web::get().to(list_services)))
        .service(web::resource("/services/{id}/").route(web::get().to(service_detail)));
}

async fn list_services(state: web::Data<AppState>) -> Result<HttpResponse> {
    let categories = sqlx::query_as::<_, ServiceCategoryRow>(
        "SELECT id, name, description, sort_order FROM service_categories ORDER BY sort_order",
    )
    .fetch_all(&state.db)
    .await
    .unwrap_or_default();

    let mut sections = Vec::with_capacity(categories.len());
    for category in categories {
        let services = sqlx::query_as::<_, ServiceRow>(
            r#"SELECT id, category_id, name, description, price, duration_minutes, active
               FROM services
               WHERE category_id = ? AND active = 1
               ORDER BY name"#,
        )
        .bind(&category.id)
        .fetch_all(&state.db)
        .await
        .unwrap_or_default()
        .into_iter()
        .map(ServiceView::from_row)
        .collect::<Vec<_>>();

        if !services.is_empty() {
            sections.push(CategorySection {
                name: category.name,
                description: category.description,
                services,
            });
        }
    }

    Ok(render(ServiceListTemplate { sections }))
}

async fn service_detail(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let service_id = path.into_inner();
    let row = sqlx::query_as::<_, ServiceRow>(
        r#"SELECT id, category_id, name, description, price, duration_minutes, active
           FROM services
           WHERE id = ? AND active = 1
           LIMIT 1"#,
    )
    .bind(&service_id)
    .fetch_optional(&state.db)
    .await
    .unwrap_or(None);

    let service = match row {
        Some(row) => row,
        None => return Ok(HttpResponse::NotFound().body("Service not found")),
    };

    let category_name = sqlx::query_scalar::<_, String>(
        "SELECT name FROM service_categories WHERE id = ?",
    )
    .bind(&service.category_id)
    .fetch_optional(&state.db)
    .await
    .ok()
    .flatten()
    .unwrap_or_default();

    Ok(render(ServiceDetailTemplate {
        service: ServiceView::from_row(service),
        category_name,
    }))
}
