pub mod qualificacao;
pub mod user;
