// src/api/pedidos.rs

use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::api::mp_client::{
    BackUrls, CriarPreferenciaRequest, EnderecoPreferencia, ItemPreferencia, MetodosPagamento,
    PagadorPreferencia, TipoPagamento,
};
use crate::api::ApiError;
use crate::models::{NovoItem, NovoPedido};
use crate::{db, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CriarPedidoRequest {
    #[serde(default)]
    pub items: Vec<ItemCarrinho>,
    pub loja_id: Option<i64>,
    pub payer: Option<Pagador>,
    pub tipo_frete: Option<String>,
    pub valor_frete: Option<f64>,
    /// Total calculado no front. Nunca é persistido; serve só para
    /// diagnóstico quando diverge do total calculado aqui.
    pub valor_total: Option<f64>,
    pub cliente: Option<Cliente>,
}

/// Linha do carrinho no formato de item do Mercado Pago.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ItemCarrinho {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub unit_price: f64,
    pub quantity: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct Pagador {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<Endereco>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct Endereco {
    pub street_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct Cliente {
    pub id: Option<i64>,
    pub nome: Option<String>,
    pub whatsapp: Option<String>,
}

pub fn arredondar2(valor: f64) -> f64 {
    (valor * 100.0).round() / 100.0
}

/// Total autoritativo do pedido: soma das linhas mais o frete, com duas
/// casas decimais.
pub fn calcular_total(items: &[ItemCarrinho], valor_frete: f64) -> f64 {
    let subtotal: f64 = items
        .iter()
        .map(|item| item.unit_price * item.quantity as f64)
        .sum();
    arredondar2(subtotal + valor_frete)
}

fn montar_preferencia(
    payload: &CriarPedidoRequest,
    pedido_id: i64,
    loja_base_url: &str,
) -> CriarPreferenciaRequest {
    let payer = payload.payer.as_ref();

    CriarPreferenciaRequest {
        items: payload
            .items
            .iter()
            .map(|item| ItemPreferencia {
                id: item.id.map(|id| id.to_string()),
                title: item.title.clone().unwrap_or_else(|| "Produto".to_string()),
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect(),
        payer: PagadorPreferencia {
            name: payer
                .and_then(|p| p.name.clone())
                .unwrap_or_else(|| "Cliente".to_string()),
            email: payer
                .and_then(|p| p.email.clone())
                .unwrap_or_else(|| "comprador@email.com".to_string()),
            address: EnderecoPreferencia {
                street_name: payer
                    .and_then(|p| p.address.as_ref())
                    .and_then(|a| a.street_name.clone())
                    .unwrap_or_else(|| "Endereço não informado".to_string()),
            },
        },
        payment_methods: MetodosPagamento {
            included_payment_types: ["ticket", "bank_transfer", "credit_card"]
                .iter()
                .map(|id| TipoPagamento { id: (*id).to_string() })
                .collect(),
            installments: 12,
        },
        back_urls: BackUrls {
            success: loja_base_url.to_string(),
            failure: loja_base_url.to_string(),
            pending: loja_base_url.to_string(),
        },
        auto_return: "approved".to_string(),
        external_reference: pedido_id.to_string(),
    }
}

async fn processar_pedido(
    state: &AppState,
    payload: CriarPedidoRequest,
) -> Result<HttpResponse, ApiError> {
    if payload.items.is_empty() {
        return Err(ApiError::validacao("Carrinho vazio."));
    }
    let Some(loja_id) = payload.loja_id else {
        return Err(ApiError::validacao("loja_id não informado."));
    };

    let valor_frete = payload.valor_frete.unwrap_or(0.0);
    let total = calcular_total(&payload.items, valor_frete);
    if total <= 0.0 {
        return Err(ApiError::validacao("Total do pedido inválido."));
    }
    if let Some(valor_total) = payload.valor_total {
        if (valor_total - total).abs() > 0.01 {
            log::warn!(
                "total do front diverge: front={valor_total} calculado={total} loja_id={loja_id}"
            );
        }
    }

    let novo = NovoPedido {
        loja_id,
        cliente_id: payload.cliente.as_ref().and_then(|c| c.id),
        nome_cliente: payload
            .cliente
            .as_ref()
            .and_then(|c| c.nome.clone())
            .or_else(|| payload.payer.as_ref().and_then(|p| p.name.clone())),
        whatsapp: payload.cliente.as_ref().and_then(|c| c.whatsapp.clone()),
        total,
        frete: valor_frete,
        tipo_frete: payload.tipo_frete.clone(),
    };

    let pedido_id = db::inserir_pedido(&state.pool, &novo).await?;

    let itens: Vec<NovoItem> = payload
        .items
        .iter()
        .map(|item| NovoItem {
            produto_id: item.id,
            quantidade: item.quantity,
            preco_unitario: item.unit_price,
        })
        .collect();
    db::inserir_itens(&state.pool, pedido_id, &itens).await?;

    let token = db::buscar_token_loja(&state.pool, loja_id)
        .await?
        .ok_or_else(|| ApiError::Config("Token não configurado no banco.".to_string()))?;

    let preferencia = state
        .mercado_pago
        .criar_preferencia(&token, &montar_preferencia(&payload, pedido_id, &state.loja_base_url))
        .await
        .map_err(|e| ApiError::Upstream {
            origem: "Mercado Pago",
            detalhes: e.to_string(),
        })?;

    db::vincular_preferencia(&state.pool, pedido_id, &preferencia.id).await?;

    log::info!(
        "pedido criado id={pedido_id} loja_id={loja_id} total={total} preference={}",
        preferencia.id
    );

    Ok(HttpResponse::Ok().json(json!({
        "redirect_url": preferencia.init_point,
        "order_id": pedido_id
    })))
}

#[utoipa::path(
    post,
    path = "/pedidos",
    tag = "pedidos",
    request_body = CriarPedidoRequest,
    responses(
        (status = 200, description = "Pedido criado; redirect_url aponta para o checkout"),
        (status = 400, description = "Carrinho/loja inválidos ou token não configurado"),
        (status = 500, description = "Falha de persistência ou do Mercado Pago")
    )
)]
#[post("/pedidos")]
pub async fn criar_pedido(
    state: web::Data<AppState>,
    payload: web::Json<CriarPedidoRequest>,
) -> HttpResponse {
    match processar_pedido(&state, payload.into_inner()).await {
        Ok(resp) => resp,
        Err(e) => {
            log::error!("criar_pedido error: {e}");
            e.para_json()
        }
    }
}
