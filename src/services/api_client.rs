// src/services/api_client.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        qualificacao::{parse_crew_payload, CrewMember},
        user::{LoginRequest, RefreshResponse, TokenPair},
    },
    services::request_coordinator::{RefreshFailure, RequestCoordinator},
};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};

/// Cliente HTTP para a API SIQ.
///
/// Toda a resposta passa por [`parse_crew_payload`] (ou equivalente) antes
/// de sair daqui: quem chama só vê tipos de domínio.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    coordinator: Arc<RequestCoordinator>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        coordinator: Arc<RequestCoordinator>,
    ) -> AppResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            coordinator,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST /auth/login`. 400/401/403 são credenciais inválidas.
    pub async fn login(&self, nip: &str, password: &str) -> AppResult<TokenPair> {
        tracing::debug!("Login na API para NIP {}", nip);
        let resp = self
            .http
            .post(self.url("/auth/login"))
            .json(&LoginRequest { nip, password })
            .send()
            .await?;

        match resp.status() {
            s if s.is_success() => Ok(resp.json::<TokenPair>().await?),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(AppError::InvalidCredentials)
            }
            s => Err(AppError::ApiStatus(s.as_u16())),
        }
    }

    async fn refresh(&self, refresh_token: String) -> Result<TokenPair, RefreshFailure> {
        let resp = self
            .http
            .post(self.url("/auth/refresh"))
            .json(&json!({ "refresh_token": &refresh_token }))
            .send()
            .await
            .map_err(|e| RefreshFailure::Failed(e.to_string()))?;

        match resp.status() {
            s if s.is_success() => resp
                .json::<RefreshResponse>()
                .await
                .map(|r| r.into_pair(&refresh_token))
                .map_err(|e| RefreshFailure::Failed(e.to_string())),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                tracing::info!("Refresh token recusado pela API");
                Err(RefreshFailure::Rejected)
            }
            s => Err(RefreshFailure::Failed(format!("estado {}", s))),
        }
    }

    async fn send_authorized(
        &self,
        method: &Method,
        path: &str,
        tokens: &TokenPair,
    ) -> AppResult<reqwest::Response> {
        Ok(self
            .http
            .request(method.clone(), self.url(path))
            .bearer_auth(&tokens.access_token)
            .send()
            .await?)
    }

    /// Pedido autenticado. Em 401 renova os tokens (uma vez) e repete.
    /// Se houve renovação, `tokens` fica com o par novo.
    async fn get_json(&self, path: &str, tokens: &mut TokenPair) -> AppResult<Value> {
        let mut resp = self.send_authorized(&Method::GET, path, tokens).await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!("401 em {}, a renovar tokens", path);
            let fresh = self
                .coordinator
                .refresh_with(tokens, |rt| self.refresh(rt))
                .await?;
            *tokens = fresh;
            resp = self.send_authorized(&Method::GET, path, tokens).await?;
            if resp.status() == StatusCode::UNAUTHORIZED {
                return Err(AppError::SessionExpired);
            }
        }

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!("GET {} respondeu {}", path, status);
            return Err(AppError::ApiStatus(status.as_u16()));
        }
        Ok(resp.json::<Value>().await?)
    }

    /// `GET /v2/tripulantes/qualificacoes/{tipo}`
    pub async fn fetch_crew_qualifications(
        &self,
        tipo: &str,
        tokens: &mut TokenPair,
    ) -> AppResult<Vec<CrewMember>> {
        let path = format!("/v2/tripulantes/qualificacoes/{}", urlencoding::encode(tipo));
        let payload = self.get_json(&path, tokens).await?;
        let crew = parse_crew_payload(payload)?;
        tracing::debug!("{} tripulantes recebidos para tipo '{}'", crew.len(), tipo);
        Ok(crew)
    }
}
