// src/web/mw_auth.rs
use crate::{error::AppError, services::auth_service};
use axum::{
    extract::Request, // Usar Request para ter acesso às extensões
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

// Middleware que verifica se o utilizador está logado
pub async fn require_auth(
    session: Session,
    mut request: Request, // Mutável para adicionar extensões
    next: Next,
) -> Result<Response, AppError> {
    match auth_service::current_user(&session).await? {
        Some(user) => {
            tracing::debug!("Autenticação MW: NIP '{}' autenticado. Prosseguindo...", user.nip);

            // Os handlers protegidos recebem NIP + tokens via Extension<SessionUser>
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        None => {
            tracing::debug!("Autenticação MW: Não autenticado. Redirecionando para /login");
            Ok(Redirect::to("/login").into_response())
        }
    }
}
