// src/services/auth_service.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{SessionUser, TokenPair},
    services::api_client::ApiClient,
};
use tower_sessions::Session;

/// Chave da sessão onde fica o NIP + tokens.
pub const SESSION_USER_KEY: &str = "siq_user";

/// Valida as credenciais no backend e abre a sessão local.
pub async fn authenticate(
    api: &ApiClient,
    session: &Session,
    nip: &str,
    password: &str,
) -> AppResult<SessionUser> {
    let tokens = api.login(nip, password).await?;

    session
        .cycle_id() // Novo ID de sessão depois do login
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao rodar ID: {}", e)))?;

    let user = SessionUser {
        nip: nip.to_string(),
        tokens,
    };
    store_user(session, &user).await?;
    tracing::info!("✅ Login bem-sucedido para: {}", nip);
    Ok(user)
}

pub async fn current_user(session: &Session) -> AppResult<Option<SessionUser>> {
    session
        .get::<SessionUser>(SESSION_USER_KEY)
        .await
        .map_err(|e| AppError::SessionError(format!("Erro ao ler sessão: {}", e)))
}

pub async fn store_user(session: &Session, user: &SessionUser) -> AppResult<()> {
    session
        .insert(SESSION_USER_KEY, user)
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao inserir na sessão: {}", e)))
}

/// Guarda os tokens se o cliente os renovou durante o pedido.
pub async fn persist_if_refreshed(
    session: &Session,
    user: &SessionUser,
    tokens: TokenPair,
) -> AppResult<()> {
    if tokens == user.tokens {
        return Ok(());
    }
    tracing::debug!("Tokens renovados para {}, a atualizar sessão", user.nip);
    let updated = SessionUser {
        nip: user.nip.clone(),
        tokens,
    };
    store_user(session, &updated).await
}

pub async fn logout(session: &Session) -> AppResult<Option<String>> {
    let nip = current_user(session).await.ok().flatten().map(|u| u.nip);
    session
        .delete()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao apagar sessão: {}", e)))?;
    Ok(nip)
}
