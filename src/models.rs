// src/models.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

pub const STATUS_PENDENTE: &str = "Pendente";
pub const STATUS_PAGO: &str = "Pago";

#[derive(Debug, Serialize)]
pub struct Pedido {
    pub id: i64,
    pub loja_id: i64,
    pub cliente_id: Option<i64>,
    pub nome_cliente: Option<String>,
    pub whatsapp: Option<String>,
    pub email: Option<String>,
    pub total: f64,
    pub frete: f64,
    pub tipo_frete: Option<String>,
    pub status: String, // Pendente | Pago
    pub metodo_pagamento: Option<String>,
    pub mp_preference_id: Option<String>,
    pub mp_payment_id: Option<String>,
    pub criado_em: Option<DateTime<Utc>>,
}

/// Dados de inserção de um pedido. O `total` aqui já é o valor calculado no
/// servidor; o total vindo do front nunca chega até a persistência.
#[derive(Debug)]
pub struct NovoPedido {
    pub loja_id: i64,
    pub cliente_id: Option<i64>,
    pub nome_cliente: Option<String>,
    pub whatsapp: Option<String>,
    pub total: f64,
    pub frete: f64,
    pub tipo_frete: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PedidoItem {
    pub id: i64,
    pub pedido_id: i64,
    pub produto_id: Option<i64>,
    pub quantidade: i64,
    pub preco_unitario: f64,
}

#[derive(Debug)]
pub struct NovoItem {
    pub produto_id: Option<i64>,
    pub quantidade: i64,
    pub preco_unitario: f64,
}

/// Valores autoritativos vindos do re-fetch em /v1/payments, aplicados na
/// transição Pendente→Pago.
#[derive(Debug)]
pub struct PagamentoAprovado {
    pub mp_payment_id: String,
    pub metodo_pagamento: String,
    pub total: Option<f64>,
    pub email: Option<String>,
}
