// src/api/mp_client.rs
//
// Cliente mínimo da API do Mercado Pago.
// Criação de preferência usa o token da loja; consulta de pagamento usa o
// token master da plataforma.

use serde::{Deserialize, Serialize};
use std::fmt;

const MP_API_BASE: &str = "https://api.mercadopago.com";

#[derive(Debug)]
pub enum MpError {
    Http(reqwest::Error),
    Api { status: u16, body: String },
    RespostaInvalida(String),
}

impl fmt::Display for MpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MpError::Http(e) => write!(f, "http error: {e}"),
            MpError::Api { status, body } => {
                write!(f, "mercado pago api error status={status} body={body}")
            }
            MpError::RespostaInvalida(e) => write!(f, "invalid response: {e}"),
        }
    }
}

impl From<reqwest::Error> for MpError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

#[derive(Debug, Serialize)]
pub struct ItemPreferencia {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub quantity: i64,
    pub unit_price: f64,
}

#[derive(Debug, Serialize)]
pub struct EnderecoPreferencia {
    pub street_name: String,
}

#[derive(Debug, Serialize)]
pub struct PagadorPreferencia {
    pub name: String,
    pub email: String,
    pub address: EnderecoPreferencia,
}

#[derive(Debug, Serialize)]
pub struct TipoPagamento {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct MetodosPagamento {
    pub included_payment_types: Vec<TipoPagamento>,
    pub installments: u32,
}

#[derive(Debug, Serialize)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

#[derive(Debug, Serialize)]
pub struct CriarPreferenciaRequest {
    pub items: Vec<ItemPreferencia>,
    pub payer: PagadorPreferencia,
    pub payment_methods: MetodosPagamento,
    pub back_urls: BackUrls,
    pub auto_return: String,
    pub external_reference: String,
}

#[derive(Debug, Deserialize)]
pub struct PreferenciaResponse {
    pub id: String,
    pub init_point: String,
}

#[derive(Debug, Deserialize)]
pub struct PagadorPagamento {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Pagamento {
    pub status: String,
    pub transaction_amount: Option<f64>,
    pub payment_method_id: Option<String>,
    pub external_reference: Option<String>,
    pub payer: Option<PagadorPagamento>,
}

#[derive(Clone)]
pub struct MercadoPagoClient {
    http: reqwest::Client,
    base_url: String,
    master_token: String,
}

impl MercadoPagoClient {
    pub fn new(master_token: impl Into<String>) -> Self {
        Self::com_base_url(MP_API_BASE, master_token)
    }

    pub fn com_base_url(base_url: &str, master_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            master_token: master_token.into(),
        }
    }

    /// POST /checkout/preferences com o token da loja dona do pedido.
    pub async fn criar_preferencia(
        &self,
        access_token: &str,
        req: &CriarPreferenciaRequest,
    ) -> Result<PreferenciaResponse, MpError> {
        let resp = self
            .http
            .post(format!("{}/checkout/preferences", self.base_url))
            .bearer_auth(access_token.trim())
            .json(req)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(MpError::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str::<PreferenciaResponse>(&body)
            .map_err(|e| MpError::RespostaInvalida(format!("{e}; body={body}")))
    }

    /// GET /v1/payments/{id} com o token master da plataforma.
    pub async fn buscar_pagamento(&self, payment_id: &str) -> Result<Pagamento, MpError> {
        let resp = self
            .http
            .get(format!("{}/v1/payments/{payment_id}", self.base_url))
            .bearer_auth(&self.master_token)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(MpError::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str::<Pagamento>(&body)
            .map_err(|e| MpError::RespostaInvalida(format!("{e}; body={body}")))
    }
}
