// src/models/user.rs
use serde::{Deserialize, Serialize};

// Struct para dados do formulário de login
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(rename = "username")] // Mapeia do HTML 'username'
    pub nip: String,
    pub password: String,
}

/// Payload enviado para `POST /auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub nip: &'a str,
    pub password: &'a str,
}

/// Par de tokens emitido pelo backend. Guardado na sessão do utilizador.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Resposta de `POST /auth/refresh`: o backend pode ou não rodar o refresh token.
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl RefreshResponse {
    pub fn into_pair(self, previous_refresh: &str) -> TokenPair {
        TokenPair {
            access_token: self.access_token,
            refresh_token: self
                .refresh_token
                .unwrap_or_else(|| previous_refresh.to_string()),
        }
    }
}

/// O que fica na sessão depois do login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub nip: String,
    pub tokens: TokenPair,
}
