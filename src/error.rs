// src/error.rs
use axum::{http::StatusCode, response::Html, response::IntoResponse};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Erro de comunicação com a API: {0}")]
    Api(#[from] reqwest::Error),

    #[error("API respondeu com estado {0}")]
    ApiStatus(u16),

    // Resposta da API com forma inesperada (ex: objeto em vez de lista)
    #[error("Resposta da API inválida: {0}")]
    Schema(String),

    #[error("Falha ao renovar tokens: {0}")]
    RefreshFailed(String),

    #[error("Configuração inválida: {0}")]
    Config(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    // Refresh token recusado pelo backend: é preciso novo login
    #[error("Sessão expirada")]
    SessionExpired,

    #[error("Erro na sessão: {0}")]
    SessionError(String),

    #[error("Não encontrado: {0}")]
    NotFound(String),

    #[error("Erro interno inesperado")]
    InternalServerError,
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Api(_)
            | AppError::ApiStatus(_)
            | AppError::Schema(_)
            | AppError::RefreshFailed(_) => {
                (StatusCode::BAD_GATEWAY, "Erro ao aceder aos dados.")
            }
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Erro de configuração."),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "NIP ou senha inválidos."),
            AppError::SessionExpired => (StatusCode::UNAUTHORIZED, "A sua sessão expirou."),
            AppError::SessionError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro na gestão da sua sessão.")
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Página não encontrada."),
            AppError::InternalServerError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.")
            }
        }
    }
}

// Como converter AppError numa resposta HTTP
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("Erro processado: {:?}", self);

        let (status, user_message) = self.status_and_message();

        (status, Html(format!(r#"
            <!DOCTYPE html><html><head><title>Erro</title><style>body{{font-family:sans-serif;}}</style></head>
            <body><h1>Erro {status_code}</h1><p>{message}</p><a href="javascript:history.back()">Voltar</a></body></html>
         "#, status_code=status.as_u16(), message=user_message))).into_response()
    }
}

// Tipo Result padrão para a aplicação
pub type AppResult<T = ()> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_errors_map_to_bad_gateway() {
        assert_eq!(
            AppError::ApiStatus(500).status_and_message().0,
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Schema("x".into()).status_and_message().0,
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_auth_errors_map_to_unauthorized() {
        assert_eq!(
            AppError::InvalidCredentials.status_and_message().0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::SessionExpired.status_and_message().0,
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_response_has_error_page() {
        let resp = AppError::Config("SIQ_PIVOT_POLICY".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
