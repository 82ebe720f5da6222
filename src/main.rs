// src/main.rs

// --- Declaração dos Módulos ---
mod config;
mod error;
mod models;
mod services;
mod state;
mod templates;
mod web;

// --- Imports ---
use crate::{
    config::AppConfig,
    services::{api_client::ApiClient, request_coordinator::RequestCoordinator},
    state::AppState,
};
use axum::serve;
use std::{env, sync::Arc};
use time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuração do Logging (Tracing) ---
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                env::var("RUST_LOG")
                    .unwrap_or_else(|_| "siq_web=debug,tower_http=info,tower_sessions=info".into())
                    .into()
            }),
        )
        .with(fmt::layer())
        .init();

    tracing::info!("🚀 Iniciando SIQ Web...");

    // --- Configuração ---
    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("❌ Configuração inválida: {}", e);
            return Err(anyhow::anyhow!("Falha ao carregar configuração: {}", e));
        }
    };
    tracing::info!(
        "API: {} | política pivot: {} | política cartão: {}",
        config.api_url,
        config.pivot_policy,
        config.card_policy
    );

    // --- Cliente da API ---
    // O coordenador é partilhado por todos os pedidos (fila de refresh de tokens)
    let coordinator = Arc::new(RequestCoordinator::new());
    let api = ApiClient::new(&config.api_url, config.api_timeout, coordinator)
        .map_err(|e| anyhow::anyhow!("Falha ao criar cliente HTTP: {}", e))?;

    // --- Configuração das Sessões ---
    // Só guardam tokens e estado das vistas; nada persiste entre reinícios
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            config.session_inactivity_hours,
        )));
    tracing::info!("🔑 Camada de sessão configurada.");

    let addr = config.bind_addr;
    let app_state = AppState {
        api,
        config: Arc::new(config),
    };

    // --- Listener ---
    tracing::info!("📡 Servidor escutando em http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("❌ Falha ao iniciar listener em {}: {}", addr, e);
            return Err(e.into());
        }
    };

    // --- Router + Middlewares ---
    let app = web::routes::create_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(session_layer),
    );
    tracing::info!("✅ Router e middlewares configurados.");

    if let Err(e) = serve(listener, app.into_make_service()).await {
        tracing::error!("❌ Erro fatal no servidor: {}", e);
        return Err(e.into());
    }

    Ok(())
}
