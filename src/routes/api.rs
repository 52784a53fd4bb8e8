//! JSON API consumed by the client portal and the staff dashboard.
//!
//! Every handler answers with `{"success": true, "data": ...}` or
//! `{"success": false, "error": "..."}`.

use actix_multipart::form::MultipartForm;
use actix_web::{HttpResponse, Responder, get, patch, post, web};
use pushkind_common::domain::auth::AuthenticatedUser;
use serde::Serialize;

use crate::config::AppConfig;
use crate::dispatch::Dispatcher;
use crate::files::{FileStore, with_stored_uploads};
use crate::forms::delivery_notes::CreateDeliveryNoteMultipart;
use crate::forms::orders::{CancelForm, CreateOrderForm, CreateOrderMultipart, StageForm, StatusForm};
use crate::forms::payments::PaymentForm;
use crate::forms::purchase_orders::{CreatePurchaseOrderMultipart, DepositProofMultipart};
use crate::forms::quotations::{CreateQuotationMultipart, QuotationResponseForm};
use crate::repository::DieselRepository;
use crate::services::access::resolve_actor;
use crate::services::notifications::{self, InboxQuery};
use crate::services::orders::{self, OrderFilter, OrderView};
use crate::services::{ServiceError, ServiceResult, delivery, purchase_orders, quotations};

#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn success<T: Serialize>(mut builder: actix_web::HttpResponseBuilder, data: T) -> HttpResponse {
    builder.json(ApiResponse {
        success: true,
        data: Some(data),
        error: None,
    })
}

fn failure(mut builder: actix_web::HttpResponseBuilder, error: String) -> HttpResponse {
    builder.json(ApiResponse::<()> {
        success: false,
        data: None,
        error: Some(error),
    })
}

/// Translate a service failure into its HTTP status.
///
/// Storage and internal errors are logged; their details reach the caller
/// only in development.
pub(crate) fn error_response(err: ServiceError, config: &AppConfig, action: &str) -> HttpResponse {
    match err {
        ServiceError::Unauthorized => failure(HttpResponse::Unauthorized(), err.to_string()),
        ServiceError::Forbidden => failure(HttpResponse::Forbidden(), err.to_string()),
        ServiceError::NotFound => failure(HttpResponse::NotFound(), err.to_string()),
        ServiceError::Form(message) => failure(HttpResponse::BadRequest(), message),
        ServiceError::Transition(err) => failure(HttpResponse::Conflict(), err.to_string()),
        ServiceError::Repository(_) | ServiceError::Internal(_) => {
            log::error!("Failed to {action}: {err}");
            let message = if config.is_development() {
                err.to_string()
            } else {
                "internal server error".to_string()
            };
            failure(HttpResponse::InternalServerError(), message)
        }
    }
}

pub(crate) fn respond<T: Serialize>(
    result: ServiceResult<T>,
    config: &AppConfig,
    action: &str,
) -> HttpResponse {
    match result {
        Ok(data) => success(HttpResponse::Ok(), data),
        Err(err) => error_response(err, config, action),
    }
}

fn respond_created<T: Serialize>(
    result: ServiceResult<T>,
    config: &AppConfig,
    action: &str,
) -> HttpResponse {
    match result {
        Ok(data) => success(HttpResponse::Created(), data),
        Err(err) => error_response(err, config, action),
    }
}

fn form_error(err: impl std::fmt::Display) -> ServiceError {
    ServiceError::Form(err.to_string())
}

#[post("/v1/orders")]
pub async fn api_v1_create_order(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    dispatcher: web::Data<Dispatcher>,
    files: web::Data<dyn FileStore>,
    config: web::Data<AppConfig>,
    MultipartForm(form): MultipartForm<CreateOrderMultipart>,
) -> impl Responder {
    let result = (|| -> ServiceResult<_> {
        let actor = resolve_actor(repo.get_ref(), &user)?;
        let order_form = CreateOrderForm::parse(
            &form.items.0,
            form.notes.as_ref().map(|notes| notes.0.clone()),
        )
        .map_err(form_error)?;
        with_stored_uploads(
            files.get_ref(),
            actor.hub_id(),
            &form.files,
            |attachments| -> ServiceResult<_> {
                let request = order_form.into_request(attachments).map_err(form_error)?;
                orders::create_order(
                    repo.get_ref(),
                    dispatcher.get_ref(),
                    &actor,
                    request,
                    &config.public_base_url,
                )
            },
        )
    })();

    respond_created(result, &config, "create an order")
}

#[get("/v1/orders")]
pub async fn api_v1_orders(
    params: web::Query<OrderFilter>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    config: web::Data<AppConfig>,
) -> impl Responder {
    let result = resolve_actor(repo.get_ref(), &user)
        .and_then(|actor| orders::list_orders(repo.get_ref(), &actor, params.into_inner()));

    respond(result, &config, "list orders")
}

#[get("/v1/orders/{order_id}")]
pub async fn api_v1_order(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    config: web::Data<AppConfig>,
) -> impl Responder {
    let order_id = path.into_inner();
    let result = resolve_actor(repo.get_ref(), &user)
        .and_then(|actor| orders::load_order_detail(repo.get_ref(), &actor, order_id));

    respond(result, &config, "load an order")
}

#[patch("/v1/orders/{order_id}/status")]
pub async fn api_v1_set_status(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    dispatcher: web::Data<Dispatcher>,
    config: web::Data<AppConfig>,
    web::Json(form): web::Json<StatusForm>,
) -> impl Responder {
    let order_id = path.into_inner();
    let result = (|| -> ServiceResult<_> {
        let actor = resolve_actor(repo.get_ref(), &user)?;
        let (status, note) = form.parse().map_err(form_error)?;
        orders::set_status(
            repo.get_ref(),
            dispatcher.get_ref(),
            &actor,
            order_id,
            status,
            note,
        )
        .map(OrderView::from)
    })();

    respond(result, &config, "change the order status")
}

#[post("/v1/orders/{order_id}/stage")]
pub async fn api_v1_advance_stage(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    dispatcher: web::Data<Dispatcher>,
    config: web::Data<AppConfig>,
    web::Json(form): web::Json<StageForm>,
) -> impl Responder {
    let order_id = path.into_inner();
    let result = (|| -> ServiceResult<_> {
        let actor = resolve_actor(repo.get_ref(), &user)?;
        let (stage, note) = form.parse().map_err(form_error)?;
        orders::advance_stage(
            repo.get_ref(),
            dispatcher.get_ref(),
            &actor,
            order_id,
            stage,
            note,
        )
        .map(OrderView::from)
    })();

    respond(result, &config, "advance the order stage")
}

#[post("/v1/orders/{order_id}/cancel")]
pub async fn api_v1_cancel_order(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    dispatcher: web::Data<Dispatcher>,
    config: web::Data<AppConfig>,
    form: Option<web::Json<CancelForm>>,
) -> impl Responder {
    let order_id = path.into_inner();
    let form = form.map(web::Json::into_inner).unwrap_or_default();
    let result = (|| -> ServiceResult<_> {
        let actor = resolve_actor(repo.get_ref(), &user)?;
        let note = form.into_note().map_err(form_error)?;
        orders::cancel_order(repo.get_ref(), dispatcher.get_ref(), &actor, order_id, note)
            .map(OrderView::from)
    })();

    respond(result, &config, "cancel the order")
}

#[post("/v1/orders/{order_id}/quotations")]
pub async fn api_v1_create_quotation(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    dispatcher: web::Data<Dispatcher>,
    files: web::Data<dyn FileStore>,
    config: web::Data<AppConfig>,
    MultipartForm(form): MultipartForm<CreateQuotationMultipart>,
) -> impl Responder {
    let order_id = path.into_inner();
    let result = (|| -> ServiceResult<_> {
        let actor = resolve_actor(repo.get_ref(), &user)?;
        with_stored_uploads(
            files.get_ref(),
            actor.hub_id(),
            form.file.as_slice(),
            |stored| -> ServiceResult<_> {
                let file_url = stored.into_iter().next();
                let quotation = form.form().into_new_quotation(file_url).map_err(form_error)?;
                quotations::create_quotation(
                    repo.get_ref(),
                    dispatcher.get_ref(),
                    &actor,
                    order_id,
                    quotation,
                )
            },
        )
    })();

    respond_created(result, &config, "create a quotation")
}

#[patch("/v1/quotations/{quotation_id}/response")]
pub async fn api_v1_respond_to_quotation(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    dispatcher: web::Data<Dispatcher>,
    config: web::Data<AppConfig>,
    web::Json(form): web::Json<QuotationResponseForm>,
) -> impl Responder {
    let quotation_id = path.into_inner();
    let result = (|| -> ServiceResult<_> {
        let actor = resolve_actor(repo.get_ref(), &user)?;
        let response = form.into_response().map_err(form_error)?;
        quotations::respond_to_quotation(
            repo.get_ref(),
            dispatcher.get_ref(),
            &actor,
            quotation_id,
            response,
        )
    })();

    respond(result, &config, "answer the quotation")
}

#[post("/v1/orders/{order_id}/purchase-orders")]
pub async fn api_v1_create_purchase_order(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    dispatcher: web::Data<Dispatcher>,
    files: web::Data<dyn FileStore>,
    config: web::Data<AppConfig>,
    MultipartForm(form): MultipartForm<CreatePurchaseOrderMultipart>,
) -> impl Responder {
    let order_id = path.into_inner();
    let result = (|| -> ServiceResult<_> {
        let actor = resolve_actor(repo.get_ref(), &user)?;
        with_stored_uploads(
            files.get_ref(),
            actor.hub_id(),
            &form.files,
            |stored| -> ServiceResult<_> {
                let purchase_order = form
                    .form()
                    .into_new_purchase_order(stored)
                    .map_err(form_error)?;
                purchase_orders::create_purchase_order(
                    repo.get_ref(),
                    dispatcher.get_ref(),
                    &actor,
                    order_id,
                    purchase_order,
                )
            },
        )
    })();

    respond_created(result, &config, "record a purchase order")
}

#[post("/v1/purchase-orders/{purchase_order_id}/deposit-proof")]
pub async fn api_v1_submit_deposit_proof(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    dispatcher: web::Data<Dispatcher>,
    files: web::Data<dyn FileStore>,
    config: web::Data<AppConfig>,
    MultipartForm(form): MultipartForm<DepositProofMultipart>,
) -> impl Responder {
    let purchase_order_id = path.into_inner();
    let result = (|| -> ServiceResult<_> {
        let actor = resolve_actor(repo.get_ref(), &user)?;
        with_stored_uploads(files.get_ref(), actor.hub_id(), &form.files, |stored| {
            purchase_orders::submit_deposit_proof(
                repo.get_ref(),
                dispatcher.get_ref(),
                &actor,
                purchase_order_id,
                stored,
            )
        })
    })();

    respond(result, &config, "store the deposit proof")
}

#[post("/v1/orders/{order_id}/deposit")]
pub async fn api_v1_confirm_deposit(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    dispatcher: web::Data<Dispatcher>,
    config: web::Data<AppConfig>,
    form: Option<web::Json<PaymentForm>>,
) -> impl Responder {
    let order_id = path.into_inner();
    let form = form.map(web::Json::into_inner).unwrap_or_default();
    let result = (|| -> ServiceResult<_> {
        let actor = resolve_actor(repo.get_ref(), &user)?;
        let payment = form.into_new_payment().map_err(form_error)?;
        purchase_orders::confirm_deposit(
            repo.get_ref(),
            dispatcher.get_ref(),
            &actor,
            order_id,
            payment,
        )
    })();

    respond(result, &config, "confirm the deposit")
}

#[post("/v1/orders/{order_id}/delivery-notes")]
pub async fn api_v1_create_delivery_note(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    dispatcher: web::Data<Dispatcher>,
    files: web::Data<dyn FileStore>,
    config: web::Data<AppConfig>,
    MultipartForm(form): MultipartForm<CreateDeliveryNoteMultipart>,
) -> impl Responder {
    let order_id = path.into_inner();
    let result = (|| -> ServiceResult<_> {
        let actor = resolve_actor(repo.get_ref(), &user)?;
        let note_form = form.form().map_err(form_error)?;
        with_stored_uploads(
            files.get_ref(),
            actor.hub_id(),
            &form.files,
            |stored| -> ServiceResult<_> {
                let (note, advance_to) = note_form
                    .into_new_delivery_note(stored)
                    .map_err(form_error)?;
                delivery::create_delivery_note(
                    repo.get_ref(),
                    dispatcher.get_ref(),
                    &actor,
                    order_id,
                    note,
                    advance_to,
                )
            },
        )
    })();

    respond_created(result, &config, "issue a delivery note")
}

#[post("/v1/orders/{order_id}/final-payment")]
pub async fn api_v1_record_final_payment(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    dispatcher: web::Data<Dispatcher>,
    config: web::Data<AppConfig>,
    form: Option<web::Json<PaymentForm>>,
) -> impl Responder {
    let order_id = path.into_inner();
    let form = form.map(web::Json::into_inner).unwrap_or_default();
    let result = (|| -> ServiceResult<_> {
        let actor = resolve_actor(repo.get_ref(), &user)?;
        let payment = form.into_new_payment().map_err(form_error)?;
        delivery::record_final_payment(
            repo.get_ref(),
            dispatcher.get_ref(),
            &actor,
            order_id,
            payment,
        )
    })();

    respond(result, &config, "record the final payment")
}

#[get("/v1/notifications")]
pub async fn api_v1_notifications(
    params: web::Query<InboxQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    config: web::Data<AppConfig>,
) -> impl Responder {
    let result = resolve_actor(repo.get_ref(), &user)
        .and_then(|actor| notifications::load_inbox(repo.get_ref(), &actor, params.into_inner()));

    respond(result, &config, "list notifications")
}

#[post("/v1/notifications/{notification_id}/read")]
pub async fn api_v1_mark_notification_read(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    config: web::Data<AppConfig>,
) -> impl Responder {
    let notification_id = path.into_inner();
    let result = resolve_actor(repo.get_ref(), &user)
        .and_then(|actor| notifications::mark_read(repo.get_ref(), &actor, notification_id));

    respond(result, &config, "mark the notification as read")
}

#[post("/v1/notifications/read-all")]
pub async fn api_v1_mark_all_notifications_read(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    config: web::Data<AppConfig>,
) -> impl Responder {
    let result = resolve_actor(repo.get_ref(), &user)
        .and_then(|actor| notifications::mark_all_read(repo.get_ref(), &actor));

    respond(result, &config, "mark notifications as read")
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;
    use actix_web::http::StatusCode;

    use super::*;
    use crate::config::AppEnvironment;
    use crate::domain::order::{OrderStage, OrderStatus};
    use crate::domain::workflow::TransitionError;

    fn config(environment: AppEnvironment) -> AppConfig {
        AppConfig::from_lookup(|key| match key {
            "AUTH_SERVICE_URL" => Some("http://auth.test".to_string()),
            _ => None,
        })
        .map(|config| AppConfig {
            environment,
            ..config
        })
        .expect("config")
    }

    async fn body(response: HttpResponse) -> serde_json::Value {
        let bytes = to_bytes(response.into_body()).await.expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[actix_web::test]
    async fn service_errors_map_to_statuses() {
        let config = config(AppEnvironment::Production);
        let cases = [
            (ServiceError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ServiceError::Forbidden, StatusCode::FORBIDDEN),
            (ServiceError::NotFound, StatusCode::NOT_FOUND),
            (ServiceError::Form("bad".into()), StatusCode::BAD_REQUEST),
            (
                ServiceError::Transition(TransitionError::InvalidTransition {
                    operation: "createPurchaseOrder",
                    stage: OrderStage::Received,
                }),
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::Transition(TransitionError::Terminal {
                    operation: "setStatus",
                    status: OrderStatus::Completed,
                }),
                StatusCode::CONFLICT,
            ),
            (ServiceError::Internal("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(error_response(err, &config, "test").status(), status);
        }
    }

    #[actix_web::test]
    async fn internal_details_stay_private_outside_development() {
        let production = error_response(
            ServiceError::Internal("disk full".into()),
            &config(AppEnvironment::Production),
            "test",
        );
        let json = body(production).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "internal server error");

        let development = error_response(
            ServiceError::Internal("disk full".into()),
            &config(AppEnvironment::Development),
            "test",
        );
        let json = body(development).await;
        assert_eq!(json["error"], "internal error: disk full");
    }

    #[actix_web::test]
    async fn successful_results_are_wrapped() {
        let response = respond(Ok(vec![1, 2]), &config(AppEnvironment::Production), "test");
        assert_eq!(response.status(), StatusCode::OK);

        let json = body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert!(json.get("error").is_none());
    }
}
