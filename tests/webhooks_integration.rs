use actix_web::test::TestRequest;
use actix_web::{test, web, App};
use httpmock::Method::GET;
use httpmock::MockServer;
use serde_json::json;
use sqlx::PgPool;

use portal_checkout::api::webhooks_mp::webhook_mercadopago;
use portal_checkout::db;
use portal_checkout::models::{NovoPedido, PagamentoAprovado, STATUS_PAGO};

mod support;

async fn inserir_pedido_pendente(pool: &PgPool, loja_id: i64, total: f64) -> i64 {
    db::inserir_pedido(
        pool,
        &NovoPedido {
            loja_id,
            cliente_id: None,
            nome_cliente: Some("Maria".to_string()),
            whatsapp: None,
            total,
            frete: 0.0,
            tipo_frete: None,
        },
    )
    .await
    .expect("inserir pedido")
}

#[actix_web::test]
async fn metodo_diferente_de_post_da_405() {
    let state = web::Data::new(support::build_state(
        support::lazy_pool(),
        "http://127.0.0.1:9",
        "http://127.0.0.1:9",
    ));
    let app =
        test::init_service(App::new().app_data(state.clone()).service(webhook_mercadopago)).await;

    let req = TestRequest::get().uri("/webhook/mercadopago").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 405);
}

#[actix_web::test]
async fn evento_que_nao_e_pagamento_nao_consulta_nada() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path_contains("/v1/payments/");
            then.status(200).json_body(json!({ "status": "approved" }));
        })
        .await;

    let state = web::Data::new(support::build_state(
        support::lazy_pool(),
        &server.url(""),
        "http://127.0.0.1:9",
    ));
    let app =
        test::init_service(App::new().app_data(state.clone()).service(webhook_mercadopago)).await;

    let req = TestRequest::post()
        .uri("/webhook/mercadopago")
        .set_json(json!({ "type": "test", "data": { "id": 123 } }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body = test::read_body(resp).await;
    assert_eq!(&body[..], b"ok");
    assert_eq!(mock.hits_async().await, 0);
}

#[actix_web::test]
async fn pagamento_nao_aprovado_e_reconhecido_sem_mutacao() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/payments/123")
                .header("authorization", "Bearer test-master-token");
            then.status(200).json_body(json!({
                "status": "pending",
                "transaction_amount": 28.5,
                "external_reference": "1"
            }));
        })
        .await;

    let state = web::Data::new(support::build_state(
        support::lazy_pool(),
        &server.url(""),
        "http://127.0.0.1:9",
    ));
    let app =
        test::init_service(App::new().app_data(state.clone()).service(webhook_mercadopago)).await;

    let req = TestRequest::post()
        .uri("/webhook/mercadopago")
        .set_json(json!({ "type": "payment", "data": { "id": 123 } }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    mock.assert_async().await;
}

#[actix_web::test]
async fn referencia_externa_invalida_e_reconhecida() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/payments/55");
            then.status(200).json_body(json!({
                "status": "approved",
                "external_reference": "abc"
            }));
        })
        .await;

    let state = web::Data::new(support::build_state(
        support::lazy_pool(),
        &server.url(""),
        "http://127.0.0.1:9",
    ));
    let app =
        test::init_service(App::new().app_data(state.clone()).service(webhook_mercadopago)).await;

    let req = TestRequest::post()
        .uri("/webhook/mercadopago")
        .set_json(json!({ "type": "payment", "data": { "id": 55 } }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn falha_na_consulta_do_pagamento_vira_500() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/payments/66");
            then.status(500).body("boom");
        })
        .await;

    let state = web::Data::new(support::build_state(
        support::lazy_pool(),
        &server.url(""),
        "http://127.0.0.1:9",
    ));
    let app =
        test::init_service(App::new().app_data(state.clone()).service(webhook_mercadopago)).await;

    let req = TestRequest::post()
        .uri("/webhook/mercadopago")
        .set_json(json!({ "type": "payment", "data": { "id": 66 } }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    // Não-2xx faz o Mercado Pago reentregar depois.
    assert_eq!(resp.status(), 500);
}

#[actix_web::test]
async fn pagamento_aprovado_marca_o_pedido_uma_unica_vez() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;

    let loja_id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO lojas (nome, mp_access_token) VALUES ($1, $2) RETURNING id",
    )
    .bind("Loja Teste")
    .bind("tok-loja-1")
    .fetch_one(pool)
    .await
    .expect("insert loja");

    let pedido_id = inserir_pedido_pendente(pool, loja_id, 28.5).await;

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/payments/777")
                .header("authorization", "Bearer test-master-token");
            then.status(200).json_body(json!({
                "status": "approved",
                "transaction_amount": 29.0,
                "payment_method_id": "pix",
                "payer": { "email": "maria@example.com" },
                "external_reference": pedido_id.to_string()
            }));
        })
        .await;

    let state = web::Data::new(support::build_state(
        pool.clone(),
        &server.url(""),
        "http://127.0.0.1:9",
    ));
    let app =
        test::init_service(App::new().app_data(state.clone()).service(webhook_mercadopago)).await;

    let notificacao = json!({ "type": "payment", "data": { "id": 777 } });

    let req = TestRequest::post()
        .uri("/webhook/mercadopago")
        .set_json(notificacao.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let pedido = db::buscar_pedido(pool, pedido_id)
        .await
        .expect("buscar pedido")
        .expect("pedido existe");
    assert_eq!(pedido.status, STATUS_PAGO);
    assert_eq!(pedido.mp_payment_id.as_deref(), Some("777"));
    assert_eq!(pedido.metodo_pagamento.as_deref(), Some("pix"));
    assert_eq!(pedido.email.as_deref(), Some("maria@example.com"));
    // O total passa a ser o valor autoritativo da transação.
    assert!((pedido.total - 29.0).abs() < 1e-9);

    // Entrega repetida: re-consulta o pagamento, mas não muda mais nada.
    let req = TestRequest::post()
        .uri("/webhook/mercadopago")
        .set_json(notificacao)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(mock.hits_async().await, 2);

    let pedido = db::buscar_pedido(pool, pedido_id)
        .await
        .expect("buscar pedido")
        .expect("pedido existe");
    assert_eq!(pedido.status, STATUS_PAGO);
    assert_eq!(pedido.mp_payment_id.as_deref(), Some("777"));
}

#[actix_web::test]
async fn loja_sem_token_nao_impede_a_transicao() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;

    let loja_id: i64 =
        sqlx::query_scalar::<_, i64>("INSERT INTO lojas (nome) VALUES ($1) RETURNING id")
            .bind("Loja Sem Token")
            .fetch_one(pool)
            .await
            .expect("insert loja");

    let pedido_id = inserir_pedido_pendente(pool, loja_id, 10.0).await;

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/payments/888");
            then.status(200).json_body(json!({
                "status": "approved",
                "transaction_amount": 10.0,
                "external_reference": pedido_id.to_string()
            }));
        })
        .await;

    let state = web::Data::new(support::build_state(
        pool.clone(),
        &server.url(""),
        "http://127.0.0.1:9",
    ));
    let app =
        test::init_service(App::new().app_data(state.clone()).service(webhook_mercadopago)).await;

    let req = TestRequest::post()
        .uri("/webhook/mercadopago")
        .set_json(json!({ "type": "payment", "data": { "id": 888 } }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let pedido = db::buscar_pedido(pool, pedido_id)
        .await
        .expect("buscar pedido")
        .expect("pedido existe");
    assert_eq!(pedido.status, STATUS_PAGO);
    // Sem payment_method_id na resposta, fica o rótulo genérico.
    assert_eq!(pedido.metodo_pagamento.as_deref(), Some("Mercado Pago"));
}

#[actix_web::test]
async fn pedido_inexistente_e_reconhecido_sem_erro() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/payments/999");
            then.status(200).json_body(json!({
                "status": "approved",
                "external_reference": "424242"
            }));
        })
        .await;

    let state = web::Data::new(support::build_state(
        pool.clone(),
        &server.url(""),
        "http://127.0.0.1:9",
    ));
    let app =
        test::init_service(App::new().app_data(state.clone()).service(webhook_mercadopago)).await;

    let req = TestRequest::post()
        .uri("/webhook/mercadopago")
        .set_json(json!({ "type": "payment", "data": { "id": 999 } }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn marcar_pago_e_condicional_no_status() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;

    let loja_id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO lojas (nome, mp_access_token) VALUES ($1, $2) RETURNING id",
    )
    .bind("Loja Teste")
    .bind("tok")
    .fetch_one(pool)
    .await
    .expect("insert loja");

    let pedido_id = inserir_pedido_pendente(pool, loja_id, 15.0).await;

    let aprovado = PagamentoAprovado {
        mp_payment_id: "42".to_string(),
        metodo_pagamento: "pix".to_string(),
        total: Some(15.0),
        email: None,
    };

    let primeira = db::marcar_pago(pool, pedido_id, &aprovado)
        .await
        .expect("marcar pago");
    assert!(primeira);

    // Segunda entrega perde a disputa do UPDATE condicional.
    let segunda = db::marcar_pago(pool, pedido_id, &aprovado)
        .await
        .expect("marcar pago");
    assert!(!segunda);

    let pedido = db::buscar_pedido(pool, pedido_id)
        .await
        .expect("buscar pedido")
        .expect("pedido existe");
    assert_eq!(pedido.status, STATUS_PAGO);
}
