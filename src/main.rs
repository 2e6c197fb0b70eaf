// src/main.rs
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use dotenvy::dotenv;
use sqlx::PgPool;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use portal_checkout::api::me_client::MelhorEnvioClient;
use portal_checkout::api::mp_client::MercadoPagoClient;
use portal_checkout::{api, docs, AppState};

async fn index() -> impl Responder {
    HttpResponse::Ok().body("Service ready!")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // Token master: usado só no re-fetch de pagamentos; preferências usam o
    // token de cada loja, vindo do banco.
    let mp_master_token = env::var("MP_MASTER_TOKEN").expect("MP_MASTER_TOKEN required");
    let melhor_envio_token =
        env::var("MELHOR_ENVIO_TOKEN").expect("MELHOR_ENVIO_TOKEN required");
    let loja_base_url = env::var("LOJA_BASE_URL")
        .unwrap_or_else(|_| "https://portallagoasanta.com.br/".to_string());

    let mercado_pago = match env::var("MP_API_BASE_URL") {
        Ok(base) => MercadoPagoClient::com_base_url(&base, mp_master_token),
        Err(_) => MercadoPagoClient::new(mp_master_token),
    };
    let melhor_envio = match env::var("MELHOR_ENVIO_API_BASE_URL") {
        Ok(base) => MelhorEnvioClient::com_base_url(&base, melhor_envio_token),
        Err(_) => MelhorEnvioClient::new(melhor_envio_token),
    };

    let state = web::Data::new(AppState {
        pool,
        mercado_pago,
        melhor_envio,
        loja_base_url,
    });

    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/", web::get().to(index))
            .service(
                SwaggerUi::new("/docs/{_:.*}")
                    .url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
            )
            .service(api::pedidos::criar_pedido)
            .service(api::frete::cotar_frete)
            .service(api::webhooks_mp::webhook_mercadopago)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
