// src/services/request_coordinator.rs
//! Coordena a renovação de tokens entre pedidos concorrentes.
//!
//! O primeiro pedido que recebe 401 com um dado refresh token faz a
//! renovação; os outros que chegam entretanto com o mesmo token ficam em
//! `pending` e recebem o mesmo resultado. Assim sai no máximo um
//! `POST /auth/refresh` por token de cada vez.

use crate::{
    error::{AppError, AppResult},
    models::user::TokenPair,
};
use std::{
    collections::HashMap,
    future::Future,
    sync::{Mutex, MutexGuard},
    time::{Duration, Instant},
};
use tokio::sync::oneshot;
use uuid::Uuid;

/// Quanto tempo um refresh concluído é reaproveitado por pedidos atrasados
/// que ainda trazem o token antigo.
const RECENT_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshFailure {
    /// O backend recusou o refresh token.
    Rejected,
    /// Erro de transporte ou resposta inesperada.
    Failed(String),
}

impl From<RefreshFailure> for AppError {
    fn from(f: RefreshFailure) -> Self {
        match f {
            RefreshFailure::Rejected => AppError::SessionExpired,
            RefreshFailure::Failed(msg) => AppError::RefreshFailed(msg),
        }
    }
}

type RefreshOutcome = Result<TokenPair, RefreshFailure>;

/// Pedido à espera de um refresh já em curso.
#[derive(Debug)]
pub struct PendingRequest {
    pub id: Uuid,
    respond_to: oneshot::Sender<RefreshOutcome>,
}

#[derive(Debug, Default)]
struct CoordinatorState {
    // refresh token antigo -> pedidos à espera
    in_flight: HashMap<String, Vec<PendingRequest>>,
    // refresh token antigo -> par novo
    recent: HashMap<String, (Instant, TokenPair)>,
}

#[derive(Debug, Default)]
pub struct RequestCoordinator {
    state: Mutex<CoordinatorState>,
}

enum Role {
    Leader,
    Waiter(Uuid, oneshot::Receiver<RefreshOutcome>),
    Done(TokenPair),
}

// Se o líder for cancelado a meio, liberta a entrada e acorda quem espera (com erro)
struct LeaderGuard<'a> {
    coordinator: &'a RequestCoordinator,
    key: String,
    armed: bool,
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("Refresh cancelado antes de terminar; pedidos em espera libertados");
            self.coordinator.lock().in_flight.remove(&self.key);
        }
    }
}

impl RequestCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        // Nenhum código com o lock pode entrar em pânico a meio de uma escrita
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[cfg(test)]
    /// Número de pedidos à espera de um refresh em curso para este token.
    pub fn pending_count(&self, refresh_token: &str) -> usize {
        self.lock()
            .in_flight
            .get(refresh_token)
            .map_or(0, |p| p.len())
    }

    fn join(&self, key: &str) -> Role {
        let mut state = self.lock();
        let now = Instant::now();
        state.recent.retain(|_, (at, _)| now.duration_since(*at) < RECENT_TTL);

        if let Some((_, pair)) = state.recent.get(key) {
            return Role::Done(pair.clone());
        }
        match state.in_flight.get_mut(key) {
            Some(pending) => {
                let (tx, rx) = oneshot::channel();
                let id = Uuid::new_v4();
                pending.push(PendingRequest { id, respond_to: tx });
                Role::Waiter(id, rx)
            }
            None => {
                state.in_flight.insert(key.to_string(), Vec::new());
                Role::Leader
            }
        }
    }

    /// Obtém tokens novos para `stale`, chamando `refresh` só se ninguém o estiver a fazer.
    pub async fn refresh_with<F, Fut>(&self, stale: &TokenPair, refresh: F) -> AppResult<TokenPair>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = RefreshOutcome>,
    {
        let key = stale.refresh_token.clone();

        match self.join(&key) {
            Role::Done(pair) => {
                tracing::debug!("Refresh recente reaproveitado");
                Ok(pair)
            }
            Role::Waiter(id, rx) => {
                tracing::debug!("Pedido {} à espera de refresh em curso", id);
                match rx.await {
                    Ok(outcome) => outcome.map_err(AppError::from),
                    Err(_) => Err(AppError::RefreshFailed("refresh interrompido".into())),
                }
            }
            Role::Leader => {
                let mut guard = LeaderGuard {
                    coordinator: self,
                    key: key.clone(),
                    armed: true,
                };
                tracing::debug!("A renovar tokens");
                let outcome = refresh(key.clone()).await;

                let pending = {
                    let mut state = self.lock();
                    if let Ok(pair) = &outcome {
                        state.recent.insert(key.clone(), (Instant::now(), pair.clone()));
                    }
                    state.in_flight.remove(&key).unwrap_or_default()
                };
                guard.armed = false;

                if !pending.is_empty() {
                    tracing::debug!("Refresh concluído, a responder a {} pedidos em espera", pending.len());
                }
                for p in pending {
                    if p.respond_to.send(outcome.clone()).is_err() {
                        tracing::debug!("Pedido {} já não está à espera", p.id);
                    }
                }
                outcome.map_err(AppError::from)
            }
        }
    }
}
