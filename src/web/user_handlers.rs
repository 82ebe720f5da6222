// src/web/user_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::SessionUser,
    templates::{path_segment, TipoLink, UserPage},
};
use askama::Template;
use axum::{
    extract::Extension,
    response::{Html, IntoResponse},
};

/// Tipos de tripulante conhecidos: (valor na API, rótulo).
pub const TIPOS_TRIPULANTE: &[(&str, &str)] = &[
    ("PILOTO", "Pilotos"),
    ("OPERADOR CABINE", "Operadores de Cabine"),
    ("OPERADOR SISTEMAS", "Operadores de Sistemas"),
    ("OPERADOR VIGILANCIA", "Operadores de Vigilância"),
];

// Handler para GET /user (protegido pelo middleware)
pub async fn user_page_handler(
    Extension(user): Extension<SessionUser>, // Posto por require_auth
) -> AppResult<impl IntoResponse> {
    tracing::debug!("GET /user: Acesso para {}", user.nip);

    let template = UserPage {
        nip: user.nip,
        tipos: TIPOS_TRIPULANTE
            .iter()
            .map(|&(tipo, label)| TipoLink {
                label,
                href: format!("/qualificacoes/{}", path_segment(tipo)),
            })
            .collect(),
    };

    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar template UserPage: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}
