// src/api/frete.rs

use actix_web::{post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::api::me_client::{CalculoFreteRequest, PontoCep, ProdutoFrete};
use crate::api::ApiError;
use crate::AppState;

// Pisos aceitos pela transportadora.
const LARGURA_MINIMA: i64 = 11;
const ALTURA_MINIMA: i64 = 2;
const COMPRIMENTO_MINIMO: i64 = 16;
const PESO_PADRAO: f64 = 0.3;
const SEGURO_MINIMO: f64 = 50.0;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CotacaoFreteRequest {
    pub cep_origem: Option<String>,
    pub cep_destino: Option<String>,
    #[serde(default)]
    pub itens: Vec<ItemFrete>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ItemFrete {
    pub peso: Option<f64>,
    pub largura: Option<i64>,
    pub altura: Option<i64>,
    pub comprimento: Option<i64>,
    pub quantidade: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OpcaoFrete {
    pub nome: String,
    pub valor: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prazo: Option<i64>,
}

#[derive(Debug, PartialEq)]
pub struct Pacote {
    pub peso: f64,
    pub largura: i64,
    pub altura: i64,
    pub comprimento: i64,
}

pub fn normalizar_cep(cep: Option<&str>) -> String {
    cep.unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect()
}

/// Cubagem conservadora: uma única embalagem acumulada para o carrinho todo.
/// Largura e comprimento ficam com o maior lado entre os itens; altura soma
/// por quantidade (itens empilhados). Valores ausentes ou não positivos caem
/// nos padrões.
pub fn agregar_pacote(itens: &[ItemFrete]) -> Pacote {
    let mut pacote = Pacote {
        peso: 0.0,
        largura: LARGURA_MINIMA,
        altura: ALTURA_MINIMA,
        comprimento: COMPRIMENTO_MINIMO,
    };

    for item in itens {
        let quantidade = match item.quantidade {
            Some(q) if q > 0 => q,
            _ => 1,
        };
        let peso = match item.peso {
            Some(p) if p > 0.0 => p,
            _ => PESO_PADRAO,
        };

        pacote.peso += peso * quantidade as f64;
        pacote.largura = pacote
            .largura
            .max(item.largura.filter(|l| *l > 0).unwrap_or(LARGURA_MINIMA));
        pacote.altura = pacote
            .altura
            .max(item.altura.filter(|a| *a > 0).unwrap_or(ALTURA_MINIMA) * quantidade);
        pacote.comprimento = pacote.comprimento.max(
            item.comprimento
                .filter(|c| *c > 0)
                .unwrap_or(COMPRIMENTO_MINIMO),
        );
    }

    pacote
}

fn preco_numerico(valor: &Value) -> Option<f64> {
    match valor {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// `None` quando a resposta não é a lista de cotações esperada. Entradas com
/// `error` ou sem preço utilizável são descartadas.
pub fn extrair_opcoes(data: &Value) -> Option<Vec<OpcaoFrete>> {
    let lista = data.as_array()?;

    Some(
        lista
            .iter()
            .filter_map(|cotacao| {
                if cotacao.get("error").is_some_and(|e| !e.is_null()) {
                    return None;
                }
                let valor = preco_numerico(cotacao.get("price")?)?;
                let nome = cotacao.get("name")?.as_str()?.to_string();
                let prazo = cotacao
                    .get("delivery_time")
                    .and_then(Value::as_i64)
                    .or_else(|| cotacao.get("deadline").and_then(Value::as_i64));
                Some(OpcaoFrete { nome, valor, prazo })
            })
            .collect(),
    )
}

async fn processar_cotacao(
    state: &AppState,
    payload: CotacaoFreteRequest,
) -> Result<HttpResponse, ApiError> {
    let cep_origem = normalizar_cep(payload.cep_origem.as_deref());
    let cep_destino = normalizar_cep(payload.cep_destino.as_deref());

    if cep_origem.len() != 8 || cep_destino.len() != 8 || payload.itens.is_empty() {
        return Err(ApiError::validacao_com_detalhes(
            "Dados inválidos",
            "Verifique os CEPs (8 dígitos) e se o carrinho não está vazio.",
        ));
    }

    let pacote = agregar_pacote(&payload.itens);
    log::info!(
        "cotacao frete origem={cep_origem} destino={cep_destino} itens={} peso={}",
        payload.itens.len(),
        pacote.peso
    );

    let req = CalculoFreteRequest {
        from: PontoCep { postal_code: cep_origem },
        to: PontoCep { postal_code: cep_destino },
        products: vec![ProdutoFrete {
            id: "carrinho".to_string(),
            weight: pacote.peso,
            width: pacote.largura,
            height: pacote.altura,
            length: pacote.comprimento,
            insurance_value: SEGURO_MINIMO,
            quantity: 1,
        }],
    };

    let data = state
        .melhor_envio
        .calcular(&req)
        .await
        .map_err(|e| ApiError::Upstream {
            origem: "Melhor Envio",
            detalhes: e.to_string(),
        })?;

    match extrair_opcoes(&data) {
        Some(opcoes) => Ok(HttpResponse::Ok().json(json!({ "opcoes": opcoes }))),
        None => {
            // Erro "suave": a vitrine quer exibir a mensagem, não quebrar a
            // página, então a resposta continua 200.
            let detalhes = data
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Resposta inválida")
                .to_string();
            log::warn!("melhor envio resposta inesperada: {detalhes}");
            Ok(HttpResponse::Ok().json(json!({
                "erro": "Erro Melhor Envio",
                "detalhes": detalhes,
                "raw": data
            })))
        }
    }
}

#[utoipa::path(
    post,
    path = "/frete",
    tag = "frete",
    request_body = CotacaoFreteRequest,
    responses(
        (status = 200, description = "Lista de opções, ou erro exibível do Melhor Envio"),
        (status = 400, description = "CEPs malformados ou carrinho vazio"),
        (status = 500, description = "Falha de rede ao consultar o Melhor Envio")
    )
)]
#[post("/frete")]
pub async fn cotar_frete(
    state: web::Data<AppState>,
    payload: web::Json<CotacaoFreteRequest>,
) -> HttpResponse {
    match processar_cotacao(&state, payload.into_inner()).await {
        Ok(resp) => resp,
        Err(e) => {
            log::error!("cotar_frete error: {e}");
            e.para_json()
        }
    }
}
