// src/state.rs
use crate::{config::AppConfig, services::api_client::ApiClient};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub api: ApiClient,
    // Partilhado e só de leitura depois do arranque
    pub config: Arc<AppConfig>,
}

// Permite extrair o cliente da API diretamente
impl axum::extract::FromRef<AppState> for ApiClient {
    fn from_ref(state: &AppState) -> ApiClient {
        state.api.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(state: &AppState) -> Arc<AppConfig> {
        state.config.clone()
    }
}
