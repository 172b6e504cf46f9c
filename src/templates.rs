use actix_web::HttpResponse;
use askama::Template;

const HTML_UTF8: &str = "text/html; charset=utf-8";

/// Renders an askama template into a 200 HTML response. A render failure is
/// logged with the template's type name and answered with a bare 500.
pub fn render<T: Template>(template: T) -> HttpResponse {
    match template.render() {
        Ok(body) => HttpResponse::Ok().content_type(HTML_UTF8).body(body),
        Err(err) => {
            log::error!("Failed to render {}: {err}", std::any::type_name::<T>());
            HttpResponse::InternalServerError().finish()
        }
    }
}
