use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::pedidos::criar_pedido,
        crate::api::frete::cotar_frete,
        crate::api::webhooks_mp::webhook_mercadopago
    ),
    components(
        schemas(
            crate::api::pedidos::CriarPedidoRequest,
            crate::api::pedidos::ItemCarrinho,
            crate::api::pedidos::Pagador,
            crate::api::pedidos::Endereco,
            crate::api::pedidos::Cliente,
            crate::api::frete::CotacaoFreteRequest,
            crate::api::frete::ItemFrete,
            crate::api::frete::OpcaoFrete,
            crate::api::webhooks_mp::NotificacaoMp,
            crate::api::webhooks_mp::DadosNotificacao
        )
    ),
    tags(
        (name = "pedidos", description = "Criação de pedidos e checkout"),
        (name = "frete", description = "Cotação de frete"),
        (name = "webhooks", description = "Notificações do Mercado Pago")
    )
)]
pub struct ApiDoc;
