// src/db.rs

use sqlx::{PgPool, Row};

use crate::models::{
    NovoItem, NovoPedido, PagamentoAprovado, Pedido, PedidoItem, STATUS_PAGO, STATUS_PENDENTE,
};

/// Token do Mercado Pago da loja. Token vazio ou só com espaços conta como
/// não configurado.
pub async fn buscar_token_loja(pool: &PgPool, loja_id: i64) -> Result<Option<String>, sqlx::Error> {
    let row = sqlx::query("SELECT mp_access_token FROM lojas WHERE id = $1")
        .bind(loja_id)
        .fetch_optional(pool)
        .await?;

    Ok(row
        .and_then(|r| r.get::<Option<String>, _>("mp_access_token"))
        .filter(|t| !t.trim().is_empty()))
}

pub async fn inserir_pedido(pool: &PgPool, novo: &NovoPedido) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        r#"INSERT INTO pedidos
           (loja_id, cliente_id, nome_cliente, whatsapp, total, frete, tipo_frete, status, metodo_pagamento)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'Mercado Pago')
           RETURNING id"#,
    )
    .bind(novo.loja_id)
    .bind(novo.cliente_id)
    .bind(&novo.nome_cliente)
    .bind(&novo.whatsapp)
    .bind(novo.total)
    .bind(novo.frete)
    .bind(&novo.tipo_frete)
    .bind(STATUS_PENDENTE)
    .fetch_one(pool)
    .await?;

    Ok(row.get("id"))
}

pub async fn inserir_itens(
    pool: &PgPool,
    pedido_id: i64,
    itens: &[NovoItem],
) -> Result<(), sqlx::Error> {
    for item in itens {
        sqlx::query(
            r#"INSERT INTO pedido_itens (pedido_id, produto_id, quantidade, preco_unitario)
               VALUES ($1, $2, $3, $4)"#,
        )
        .bind(pedido_id)
        .bind(item.produto_id)
        .bind(item.quantidade)
        .bind(item.preco_unitario)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn vincular_preferencia(
    pool: &PgPool,
    pedido_id: i64,
    preference_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE pedidos SET mp_preference_id = $1 WHERE id = $2")
        .bind(preference_id)
        .bind(pedido_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn buscar_pedido(pool: &PgPool, pedido_id: i64) -> Result<Option<Pedido>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT id, loja_id, cliente_id, nome_cliente, whatsapp, email, total, frete,
                  tipo_frete, status, metodo_pagamento, mp_preference_id, mp_payment_id, criado_em
           FROM pedidos
           WHERE id = $1"#,
    )
    .bind(pedido_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| Pedido {
        id: r.get("id"),
        loja_id: r.get("loja_id"),
        cliente_id: r.get("cliente_id"),
        nome_cliente: r.get("nome_cliente"),
        whatsapp: r.get("whatsapp"),
        email: r.get("email"),
        total: r.get("total"),
        frete: r.get("frete"),
        tipo_frete: r.get("tipo_frete"),
        status: r.get("status"),
        metodo_pagamento: r.get("metodo_pagamento"),
        mp_preference_id: r.get("mp_preference_id"),
        mp_payment_id: r.get("mp_payment_id"),
        criado_em: r.get("criado_em"),
    }))
}

pub async fn listar_itens(pool: &PgPool, pedido_id: i64) -> Result<Vec<PedidoItem>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT id, pedido_id, produto_id, quantidade, preco_unitario
           FROM pedido_itens
           WHERE pedido_id = $1
           ORDER BY id"#,
    )
    .bind(pedido_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| PedidoItem {
            id: r.get("id"),
            pedido_id: r.get("pedido_id"),
            produto_id: r.get("produto_id"),
            quantidade: r.get("quantidade"),
            preco_unitario: r.get("preco_unitario"),
        })
        .collect())
}

/// Transição Pendente→Pago numa única atualização condicional. Entregas
/// duplicadas do webhook disputam o `WHERE status = 'Pendente'`; só uma
/// efetiva a transição. Devolve se esta chamada venceu.
pub async fn marcar_pago(
    pool: &PgPool,
    pedido_id: i64,
    pagamento: &PagamentoAprovado,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE pedidos
           SET status = $1,
               mp_payment_id = $2,
               metodo_pagamento = $3,
               total = COALESCE($4, total),
               email = COALESCE($5, email)
           WHERE id = $6 AND status = $7"#,
    )
    .bind(STATUS_PAGO)
    .bind(&pagamento.mp_payment_id)
    .bind(&pagamento.metodo_pagamento)
    .bind(pagamento.total)
    .bind(&pagamento.email)
    .bind(pedido_id)
    .bind(STATUS_PENDENTE)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
