// src/api/mod.rs

pub mod frete;
pub mod me_client;
pub mod mp_client;
pub mod pedidos;
pub mod webhooks_mp;

use actix_web::HttpResponse;
use serde_json::json;
use std::fmt;

/// Erro interno unificado dos handlers. Cada handler serializa para o
/// formato que o chamador externo espera: JSON `{erro, detalhes?}` nas rotas
/// da vitrine, texto puro no webhook.
#[derive(Debug)]
pub enum ApiError {
    Validacao { mensagem: String, detalhes: Option<String> },
    Config(String),
    Upstream { origem: &'static str, detalhes: String },
    Persistencia(sqlx::Error),
}

impl ApiError {
    pub fn validacao(mensagem: impl Into<String>) -> Self {
        ApiError::Validacao {
            mensagem: mensagem.into(),
            detalhes: None,
        }
    }

    pub fn validacao_com_detalhes(
        mensagem: impl Into<String>,
        detalhes: impl Into<String>,
    ) -> Self {
        ApiError::Validacao {
            mensagem: mensagem.into(),
            detalhes: Some(detalhes.into()),
        }
    }

    /// Resposta JSON no formato `{erro}` / `{erro, detalhes}`.
    pub fn para_json(&self) -> HttpResponse {
        match self {
            ApiError::Validacao { mensagem, detalhes } => {
                let corpo = match detalhes {
                    Some(detalhes) => json!({ "erro": mensagem, "detalhes": detalhes }),
                    None => json!({ "erro": mensagem }),
                };
                HttpResponse::BadRequest().json(corpo)
            }
            ApiError::Config(mensagem) => {
                HttpResponse::BadRequest().json(json!({ "erro": mensagem }))
            }
            ApiError::Upstream { origem, detalhes } => HttpResponse::InternalServerError()
                .json(json!({ "erro": format!("Erro {origem}"), "detalhes": detalhes })),
            ApiError::Persistencia(e) => {
                HttpResponse::InternalServerError().json(json!({ "erro": e.to_string() }))
            }
        }
    }

    /// Resposta em texto puro (webhook): o processador só olha o status e
    /// reenvia em não-2xx.
    pub fn para_texto(&self) -> HttpResponse {
        HttpResponse::InternalServerError().body(self.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validacao { mensagem, .. } => write!(f, "{mensagem}"),
            ApiError::Config(mensagem) => write!(f, "{mensagem}"),
            ApiError::Upstream { origem, detalhes } => write!(f, "erro {origem}: {detalhes}"),
            ApiError::Persistencia(e) => write!(f, "{e}"),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(value: sqlx::Error) -> Self {
        ApiError::Persistencia(value)
    }
}
