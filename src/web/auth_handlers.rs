// src/web/auth_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::LoginForm,
    services::{api_client::ApiClient, auth_service},
    templates::LoginPage,
};
use askama::Template;
use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

fn render_login(error: Option<String>) -> AppResult<Response> {
    let template = LoginPage { error };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar template de login: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

// GET /login
pub async fn show_login_form(session: Session) -> AppResult<Response> {
    // Já existe sessão válida?
    if auth_service::current_user(&session).await.ok().flatten().is_some() {
        tracing::debug!("GET /login: Utilizador já logado, redirecionando para /user");
        return Ok(Redirect::to("/user").into_response());
    }
    render_login(None)
}

// POST /login: as credenciais são validadas pelo backend, não aqui
pub async fn handle_login(
    State(api): State<ApiClient>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    tracing::info!("Tentativa de login para NIP: {}", form.nip);

    match auth_service::authenticate(&api, &session, form.nip.trim(), &form.password).await {
        Ok(_) => Ok(Redirect::to("/user").into_response()),
        Err(AppError::InvalidCredentials) => {
            tracing::warn!("Credenciais recusadas para NIP: {}", form.nip);
            let page = render_login(Some("NIP ou senha inválidos.".to_string()))?;
            Ok((StatusCode::UNAUTHORIZED, page).into_response())
        }
        Err(e @ (AppError::Api(_) | AppError::ApiStatus(_))) => {
            tracing::error!("API indisponível no login de {}: {:?}", form.nip, e);
            render_login(Some("Serviço indisponível. Tente mais tarde.".to_string()))
        }
        Err(e) => Err(e),
    }
}

// GET /logout
pub async fn handle_logout(session: Session) -> AppResult<Redirect> {
    match auth_service::logout(&session).await? {
        Some(nip) => tracing::info!("🚪 Utilizador '{}' desligado.", nip),
        None => tracing::info!("🚪 Sessão anónima desligada."),
    }
    Ok(Redirect::to("/login"))
}
