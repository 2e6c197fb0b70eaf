// src/api/me_client.rs
//
// Cliente mínimo do Melhor Envio (cálculo de frete).

use serde::Serialize;
use std::fmt;

const ME_API_BASE: &str = "https://www.melhorenvio.com.br/api/v2/me";
const ME_USER_AGENT: &str = "Avant Digital (contato@seudominio.com)";

#[derive(Debug)]
pub enum MeError {
    Http(reqwest::Error),
    RespostaInvalida(String),
}

impl fmt::Display for MeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeError::Http(e) => write!(f, "http error: {e}"),
            MeError::RespostaInvalida(e) => write!(f, "invalid response: {e}"),
        }
    }
}

impl From<reqwest::Error> for MeError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

#[derive(Debug, Serialize)]
pub struct PontoCep {
    pub postal_code: String,
}

#[derive(Debug, Serialize)]
pub struct ProdutoFrete {
    pub id: String,
    pub weight: f64,
    pub width: i64,
    pub height: i64,
    pub length: i64,
    pub insurance_value: f64,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct CalculoFreteRequest {
    pub from: PontoCep,
    pub to: PontoCep,
    pub products: Vec<ProdutoFrete>,
}

#[derive(Clone)]
pub struct MelhorEnvioClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl MelhorEnvioClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::com_base_url(ME_API_BASE, token)
    }

    pub fn com_base_url(base_url: &str, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// POST /shipment/calculate. A API devolve um array de cotações ou um
    /// objeto de erro; o corpo volta cru (o status HTTP não decide — o
    /// formato do corpo decide, no handler).
    pub async fn calcular(
        &self,
        req: &CalculoFreteRequest,
    ) -> Result<serde_json::Value, MeError> {
        let resp = self
            .http
            .post(format!("{}/shipment/calculate", self.base_url))
            .header("Accept", "application/json")
            .header("User-Agent", ME_USER_AGENT)
            .bearer_auth(&self.token)
            .json(req)
            .send()
            .await?;

        let body = resp.text().await?;

        serde_json::from_str::<serde_json::Value>(&body)
            .map_err(|e| MeError::RespostaInvalida(format!("{e}; body={body}")))
    }
}
