// src/web/mod.rs
pub mod auth_handlers;
pub mod mw_auth;
pub mod qualificacao_handlers;
pub mod routes;
pub mod user_handlers;
