//! Public order tracking reachable through the token in client emails.

use actix_web::{HttpResponse, Responder, get, patch, web};
use tera::{Context, Tera};

use crate::config::AppConfig;
use crate::dispatch::Dispatcher;
use crate::forms::quotations::QuotationResponseForm;
use crate::repository::DieselRepository;
use crate::routes::api::respond;
use crate::services::orders::track_order;
use crate::services::quotations::respond_by_token;
use crate::services::{ServiceError, ServiceResult};

#[get("/track/{token}")]
pub async fn show_tracking(
    path: web::Path<String>,
    repo: web::Data<DieselRepository>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let token = path.into_inner();

    match track_order(repo.get_ref(), &token) {
        Ok(view) => {
            let mut context = Context::new();
            context.insert("token", &token);
            context.insert("order", &view.order);
            context.insert("steps", &view.steps);
            context.insert("open_quotation", &view.open_quotation);
            context.insert("timeline", &view.timeline);
            match tera.render("tracking/show.html", &context) {
                Ok(body) => HttpResponse::Ok().content_type("text/html").body(body),
                Err(err) => {
                    log::error!("Failed to render the tracking page: {err}");
                    HttpResponse::InternalServerError().finish()
                }
            }
        }
        Err(ServiceError::NotFound) => HttpResponse::NotFound().body("Order not found"),
        Err(err) => {
            log::error!("Failed to load the tracking page: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[patch("/track/{token}/quotations/{quotation_id}/response")]
pub async fn respond_to_tracked_quotation(
    path: web::Path<(String, i32)>,
    repo: web::Data<DieselRepository>,
    dispatcher: web::Data<Dispatcher>,
    config: web::Data<AppConfig>,
    web::Json(form): web::Json<QuotationResponseForm>,
) -> impl Responder {
    let (token, quotation_id) = path.into_inner();
    let result = (|| -> ServiceResult<_> {
        let response = form
            .into_response()
            .map_err(|err| ServiceError::Form(err.to_string()))?;
        respond_by_token(
            repo.get_ref(),
            dispatcher.get_ref(),
            &token,
            quotation_id,
            response,
        )
    })();

    respond(result, &config, "answer the quotation by token")
}
