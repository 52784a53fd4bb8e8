use std::sync::Arc;

use actix_files::Files;
use actix_identity::IdentityMiddleware;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::{App, HttpServer, middleware, web};
use actix_web_flash_messages::{FlashMessagesFramework, storage::CookieMessageStore};
use dotenvy::dotenv;
use pushkind_common::db::establish_connection_pool;
use pushkind_common::middleware::RedirectUnauthorized;
use pushkind_common::routes::{logout, not_assigned};
use tera::Tera;

use pushkind_crm::config::AppConfig;
use pushkind_crm::dispatch::Dispatcher;
use pushkind_crm::files::{FileStore, LocalFileStore};
use pushkind_crm::repository::DieselRepository;
use pushkind_crm::routes::api::{
    api_v1_advance_stage, api_v1_cancel_order, api_v1_confirm_deposit,
    api_v1_create_delivery_note, api_v1_create_order, api_v1_create_purchase_order,
    api_v1_create_quotation, api_v1_mark_all_notifications_read, api_v1_mark_notification_read,
    api_v1_notifications, api_v1_order, api_v1_orders, api_v1_record_final_payment,
    api_v1_respond_to_quotation, api_v1_set_status, api_v1_submit_deposit_proof,
};
use pushkind_crm::routes::main::{show_index, show_order};
use pushkind_crm::routes::tracking::{respond_to_tracked_quotation, show_tracking};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    dotenv().ok(); // Load .env file

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let secret_key = match &config.secret {
        Some(key) => Key::from(key.as_bytes()),
        None => Key::generate(),
    };
    let common_config = config.common();

    let pool = match establish_connection_pool(&config.database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };
    let repo = DieselRepository::new(pool);
    let dispatcher = Dispatcher::logging();

    if let Err(e) = std::fs::create_dir_all(&config.upload_dir) {
        log::error!(
            "Failed to create upload directory {}: {e}",
            config.upload_dir.display()
        );
        std::process::exit(1);
    }
    let file_store: Arc<dyn FileStore> =
        Arc::new(LocalFileStore::new(config.upload_dir.clone(), "/uploads"));

    let message_store = CookieMessageStore::builder(secret_key.clone()).build();
    let message_framework = FlashMessagesFramework::builder(message_store).build();

    let tera = match Tera::new("templates/**/*") {
        Ok(t) => t,
        Err(e) => {
            log::error!("Parsing error(s): {e}");
            std::process::exit(1);
        }
    };

    let address = config.address.clone();
    let port = config.port;
    let domain = config.domain.clone();
    let upload_dir = config.upload_dir.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(message_framework.clone())
            .wrap(IdentityMiddleware::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_secure(!config.is_development())
                    .cookie_domain(Some(format!(".{domain}")))
                    .build(),
            )
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .service(Files::new("/assets", "./assets"))
            .service(Files::new("/uploads", upload_dir.clone()))
            .service(not_assigned)
            .service(show_tracking)
            .service(respond_to_tracked_quotation)
            .service(
                web::scope("/api")
                    .service(api_v1_create_order)
                    .service(api_v1_orders)
                    .service(api_v1_order)
                    .service(api_v1_set_status)
                    .service(api_v1_advance_stage)
                    .service(api_v1_cancel_order)
                    .service(api_v1_create_quotation)
                    .service(api_v1_respond_to_quotation)
                    .service(api_v1_create_purchase_order)
                    .service(api_v1_submit_deposit_proof)
                    .service(api_v1_confirm_deposit)
                    .service(api_v1_create_delivery_note)
                    .service(api_v1_record_final_payment)
                    .service(api_v1_notifications)
                    .service(api_v1_mark_notification_read)
                    .service(api_v1_mark_all_notifications_read),
            )
            .service(
                web::scope("")
                    .wrap(RedirectUnauthorized)
                    .service(show_index)
                    .service(show_order)
                    .service(logout),
            )
            .app_data(web::Data::new(tera.clone()))
            .app_data(web::Data::new(repo.clone()))
            .app_data(web::Data::new(dispatcher.clone()))
            .app_data(web::Data::from(file_store.clone()))
            .app_data(web::Data::new(common_config.clone()))
            .app_data(web::Data::new(config.clone()))
    })
    .bind((address, port))?
    .run()
    .await
}
