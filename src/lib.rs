pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use config::Config;
use services::{OrderManagerClient, XeroClient, XeroSession};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub session: XeroSession,
    pub xero: XeroClient,
    pub order_manager: OrderManagerClient,
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let session = XeroSession::new(config.xero.clone())?;
        session.load_from_disk().await;

        let xero = XeroClient::new(&config.xero)?;
        let order_manager = OrderManagerClient::new(&config.order_manager)?;

        if config.xero.webhook_key.is_none() {
            tracing::warn!("XERO_WEBHOOK_KEY not set - webhook signatures will not be verified");
        }

        let state = AppState {
            config: config.clone(),
            session,
            xero,
            order_manager,
        };

        let router = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/invoices", post(handlers::invoice::create_invoice))
            .route("/webhooks/xero", post(handlers::webhook::xero_webhook))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");

                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                }),
            )
            .with_state(state);

        // Port 0 binds a random port for tests.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        tracing::info!("Listening on port {}", self.port);
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }
}
