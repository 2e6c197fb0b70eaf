pub mod api;
pub mod db;
pub mod docs;
pub mod models;

use sqlx::PgPool;

use crate::api::me_client::MelhorEnvioClient;
use crate::api::mp_client::MercadoPagoClient;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub mercado_pago: MercadoPagoClient,
    pub melhor_envio: MelhorEnvioClient,
    /// URL da vitrine usada nas back_urls do checkout.
    pub loja_base_url: String,
}
