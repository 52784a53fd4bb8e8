use actix_web::{HttpResponse, Responder, get, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::models::config::CommonServerConfig;
use pushkind_common::routes::{base_context, redirect, render_template};
use tera::Tera;

use crate::domain::order::{OrderStage, OrderStatus};
use crate::repository::DieselRepository;
use crate::services::access::{Actor, resolve_actor};
use crate::services::orders::{OrderFilter, list_orders, load_order_detail};
use crate::services::{ServiceError, ServiceResult};

/// Only staff get the dashboard; clients use the portal and tracking links.
fn staff_actor(repo: &DieselRepository, user: &AuthenticatedUser) -> ServiceResult<Actor> {
    let actor = resolve_actor(repo, user)?;
    if actor.is_staff() {
        Ok(actor)
    } else {
        Err(ServiceError::Unauthorized)
    }
}

/// Flash message and redirect target for a failed page load, if any.
fn page_failure(err: &ServiceError) -> Option<(String, &'static str)> {
    match err {
        ServiceError::Unauthorized => {
            Some(("You are not allowed to view this page.".to_string(), "/na"))
        }
        ServiceError::NotFound | ServiceError::Forbidden => {
            Some(("Order not found.".to_string(), "/"))
        }
        ServiceError::Form(message) => Some((message.clone(), "/")),
        _ => None,
    }
}

#[get("/")]
pub async fn show_index(
    params: web::Query<OrderFilter>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<CommonServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let filter = params.into_inner();
    let selected_status = filter.status.clone();
    let selected_stage = filter.stage.clone();

    let result = staff_actor(repo.get_ref(), &user)
        .and_then(|actor| list_orders(repo.get_ref(), &actor, filter));

    match result {
        Ok(page) => {
            let mut context = base_context(
                &flash_messages,
                &user,
                "index",
                &server_config.auth_service_url,
            );
            context.insert("orders", &page);
            context.insert("search", &page.search);
            context.insert("statuses", &OrderStatus::ALL);
            context.insert("stages", &OrderStage::ALL);
            context.insert("selected_status", &selected_status);
            context.insert("selected_stage", &selected_stage);
            render_template(&tera, "main/index.html", &context)
        }
        Err(err) => match page_failure(&err) {
            Some((message, location)) => {
                FlashMessage::error(message).send();
                redirect(location)
            }
            None => {
                log::error!("Failed to list orders: {err}");
                HttpResponse::InternalServerError().finish()
            }
        },
    }
}

#[get("/orders/{order_id}")]
pub async fn show_order(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<CommonServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let order_id = path.into_inner();

    let result = staff_actor(repo.get_ref(), &user)
        .and_then(|actor| load_order_detail(repo.get_ref(), &actor, order_id));

    match result {
        Ok(detail) => {
            let mut context = base_context(
                &flash_messages,
                &user,
                "orders",
                &server_config.auth_service_url,
            );
            context.insert("detail", &detail);
            context.insert("stages", &OrderStage::ALL);
            context.insert("statuses", &OrderStatus::ALL);
            render_template(&tera, "orders/show.html", &context)
        }
        Err(err) => match page_failure(&err) {
            Some((message, location)) => {
                FlashMessage::error(message).send();
                redirect(location)
            }
            None => {
                log::error!("Failed to load order {order_id}: {err}");
                HttpResponse::InternalServerError().finish()
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_failures_flash_and_redirect() {
        assert_eq!(
            page_failure(&ServiceError::Unauthorized),
            Some(("You are not allowed to view this page.".to_string(), "/na"))
        );
        assert_eq!(
            page_failure(&ServiceError::Forbidden),
            Some(("Order not found.".to_string(), "/"))
        );
        assert_eq!(
            page_failure(&ServiceError::Form("page must be positive".to_string())),
            Some(("page must be positive".to_string(), "/"))
        );
        assert_eq!(
            page_failure(&ServiceError::Internal("disk full".to_string())),
            None
        );
    }
}
