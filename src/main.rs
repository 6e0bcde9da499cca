use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use sqlx::{Pool, Sqlite};

use crate::config::sms_config::SmsGlobalConfig;
use crate::logger::init_logger;
use crate::services::directory_service::DirectoryService;
use crate::services::dispatch_service::DispatchService;
use crate::services::message_service::MessageService;
use crate::services::twilio_service::TwilioService;

mod app;
mod config;
mod handlers;
mod logger;
mod models;
mod services;
#[cfg(test)]
mod tests;

async fn setup_database() -> Pool<Sqlite> {
    // 1) Crear carpeta "data"
    std::fs::create_dir_all("data").expect("No se pudo crear directorio 'data'");

    // 2) Ruta final: ./data/messages.db (mode=rwc para crearla si no existe)
    let db_path = std::env::current_dir()
        .expect("No se pudo obtener el current_dir")
        .join("data")
        .join("messages.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.to_string_lossy());

    log::info!("Conectando a SQLite en {}", db_url);

    Pool::<Sqlite>::connect(&db_url)
        .await
        .expect("No se pudo conectar a la base de datos SQLite.")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let sms_config = SmsGlobalConfig::from_env();
    if !sms_config.provider_configured() {
        // Se levanta igual; los endpoints de envío devuelven error fatal.
        log::warn!("Credenciales del proveedor SMS incompletas; solo historial disponible.");
    }

    // Conectarnos a la DB
    let db_pool = setup_database().await;

    // MessageService (historial)
    let message_service = MessageService::new(db_pool.clone());
    if let Err(e) = message_service.run_migrations().await {
        panic!("Fallo en migraciones de 'messages': {:?}", e);
    }

    // Proveedor SMS + directorio
    let twilio_service = TwilioService::new(sms_config.clone());
    let directory_service = DirectoryService::new(sms_config.clone());

    // DispatchService (núcleo de lotes)
    let dispatch_service = DispatchService::new(
        twilio_service,
        message_service.clone(),
        sms_config.clone(),
    );

    // Levantar servidor
    log::info!("Levantando servidor en 0.0.0.0:5023");
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(sms_config.clone()))
            .app_data(web::Data::new(message_service.clone()))
            .app_data(web::Data::new(directory_service.clone()))
            .app_data(web::Data::new(dispatch_service.clone()))
            .configure(app::init_app)
    })
    .workers(1)
    .bind(("0.0.0.0", 5023))?
    .run()
    .await
}
