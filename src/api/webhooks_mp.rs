// src/api/webhooks_mp.rs

use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::api::ApiError;
use crate::models::{PagamentoAprovado, STATUS_PAGO};
use crate::{db, AppState};

/// Notificação assíncrona do Mercado Pago. O corpo só traz o id do
/// pagamento; o estado autoritativo vem do re-fetch em /v1/payments.
/// Entrega é "pelo menos uma vez" — o MP reenvia em qualquer não-2xx.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NotificacaoMp {
    #[serde(rename = "type")]
    pub tipo: Option<String>,
    pub data: Option<DadosNotificacao>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DadosNotificacao {
    #[schema(value_type = Option<Object>)]
    pub id: Option<Value>,
}

/// O MP manda o id ora como número, ora como string.
pub fn extrair_payment_id(notificacao: &NotificacaoMp) -> Option<String> {
    match notificacao.data.as_ref()?.id.as_ref()? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn ok() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn processar_notificacao(
    state: &AppState,
    notificacao: NotificacaoMp,
) -> Result<HttpResponse, ApiError> {
    if notificacao.tipo.as_deref() != Some("payment") {
        return Ok(ok());
    }

    let Some(payment_id) = extrair_payment_id(&notificacao) else {
        log::warn!("notificacao payment sem data.id utilizável");
        return Ok(ok());
    };

    let pagamento = state
        .mercado_pago
        .buscar_pagamento(&payment_id)
        .await
        .map_err(|e| ApiError::Upstream {
            origem: "Mercado Pago",
            detalhes: e.to_string(),
        })?;

    if pagamento.status != "approved" {
        log::info!("pagamento {payment_id} status={} ignorado", pagamento.status);
        return Ok(ok());
    }

    let Some(pedido_id) = pagamento
        .external_reference
        .as_deref()
        .and_then(|r| r.parse::<i64>().ok())
    else {
        log::warn!("pagamento {payment_id} aprovado sem external_reference utilizável");
        return Ok(ok());
    };

    let Some(pedido) = db::buscar_pedido(&state.pool, pedido_id).await? else {
        log::warn!("pagamento {payment_id} referencia pedido {pedido_id} inexistente");
        return Ok(ok());
    };

    if pedido.status == STATUS_PAGO {
        // Entrega repetida de um pagamento já processado.
        return Ok(ok());
    }

    if db::buscar_token_loja(&state.pool, pedido.loja_id).await?.is_none() {
        log::warn!(
            "loja {} sem token configurado; pedido {pedido_id} atualizado mesmo assim",
            pedido.loja_id
        );
    }

    let aprovado = PagamentoAprovado {
        mp_payment_id: payment_id.clone(),
        metodo_pagamento: pagamento
            .payment_method_id
            .unwrap_or_else(|| "Mercado Pago".to_string()),
        total: pagamento.transaction_amount,
        email: pagamento.payer.and_then(|p| p.email),
    };

    let atualizado = db::marcar_pago(&state.pool, pedido_id, &aprovado).await?;
    if atualizado {
        log::info!("pedido {pedido_id} pago payment_id={payment_id}");
    } else {
        // Outra entrega venceu a corrida; os valores finais são os mesmos.
        log::info!("pedido {pedido_id} já estava pago; entrega ignorada");
    }

    Ok(ok())
}

#[utoipa::path(
    post,
    path = "/webhook/mercadopago",
    tag = "webhooks",
    request_body = NotificacaoMp,
    responses(
        (status = 200, description = "Notificação reconhecida (processada ou descartada)"),
        (status = 500, description = "Falha ao consultar o pagamento ou atualizar o pedido")
    )
)]
#[post("/webhook/mercadopago")]
pub async fn webhook_mercadopago(
    state: web::Data<AppState>,
    payload: web::Json<NotificacaoMp>,
) -> HttpResponse {
    match processar_notificacao(&state, payload.into_inner()).await {
        Ok(resp) => resp,
        Err(e) => {
            log::error!("webhook_mercadopago error: {e}");
            e.para_texto()
        }
    }
}
