// src/config.rs
use crate::{
    error::{AppError, AppResult},
    services::expiry_service::ThresholdPolicy,
};
use std::{collections::HashMap, net::SocketAddr, str::FromStr, time::Duration};

const DEFAULT_API_TIMEOUT_SECS: u64 = 15;
const DEFAULT_DAYS_LEFT_WINDOW: i64 = 180;
const DEFAULT_SESSION_INACTIVITY_HOURS: i64 = 24;
// 100 anos
const MAX_DAYS_LEFT_WINDOW: i64 = 36_500;
// 1 ano
const MAX_SESSION_INACTIVITY_HOURS: i64 = 24 * 365;

/// Configuração lida do ambiente (e do `.env`, via dotenvy).
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// URL base da API SIQ, sem `/` final.
    pub api_url: String,
    pub bind_addr: SocketAddr,
    pub api_timeout: Duration,
    /// Política usada na tabela pivot.
    pub pivot_policy: ThresholdPolicy,
    /// Política usada no cartão de cada tripulante.
    pub card_policy: ThresholdPolicy,
    /// Janela (dias) para o cálculo de dias a partir de `data_ultima`.
    pub days_left_window: i64,
    pub session_inactivity_hours: i64,
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        let vars: HashMap<String, String> = std::env::vars()
            .filter(|(k, _)| k.starts_with("SIQ_"))
            .collect();
        Self::from_vars(&vars)
    }

    /// Separado de `from_env` para poder ser testado sem mexer no ambiente do processo.
    pub fn from_vars(vars: &HashMap<String, String>) -> AppResult<Self> {
        let api_url = vars
            .get("SIQ_API_URL")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Config("SIQ_API_URL não definida".into()))?;

        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "SIQ_API_URL deve começar por http:// ou https:// (recebido '{}')",
                api_url
            )));
        }

        let config = AppConfig {
            api_url,
            bind_addr: parse_or(vars, "SIQ_BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            api_timeout: Duration::from_secs(parse_or(vars, "SIQ_API_TIMEOUT_SECS", DEFAULT_API_TIMEOUT_SECS)?),
            pivot_policy: parse_or(vars, "SIQ_PIVOT_POLICY", ThresholdPolicy::default())?,
            card_policy: parse_or(vars, "SIQ_CARD_POLICY", ThresholdPolicy::proportional_default())?,
            days_left_window: parse_or(vars, "SIQ_DAYS_LEFT_WINDOW", DEFAULT_DAYS_LEFT_WINDOW)?,
            session_inactivity_hours: parse_or(
                vars,
                "SIQ_SESSION_INACTIVITY_HOURS",
                DEFAULT_SESSION_INACTIVITY_HOURS,
            )?,
        };

        if !(1..=MAX_SESSION_INACTIVITY_HOURS).contains(&config.session_inactivity_hours) {
            return Err(AppError::Config(format!(
                "SIQ_SESSION_INACTIVITY_HOURS deve estar entre 1 e {}",
                MAX_SESSION_INACTIVITY_HOURS
            )));
        }
        if !(0..=MAX_DAYS_LEFT_WINDOW).contains(&config.days_left_window) {
            return Err(AppError::Config(format!(
                "SIQ_DAYS_LEFT_WINDOW deve estar entre 0 e {}",
                MAX_DAYS_LEFT_WINDOW
            )));
        }
        if config.pivot_policy != config.card_policy {
            tracing::info!(
                "Políticas de validade diferentes: pivot={} cartão={}",
                config.pivot_policy,
                config.card_policy
            );
        }
        Ok(config)
    }
}

fn parse_or<T: FromStr>(vars: &HashMap<String, String>, key: &str, default: T) -> AppResult<T> {
    match vars.get(key).map(|s| s.trim()).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::Config(format!("{}: valor inválido '{}'", key, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_vars(&vars(&[("SIQ_API_URL", "http://api.local/")])).unwrap();
        assert_eq!(config.api_url, "http://api.local");
        assert_eq!(config.bind_addr, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.api_timeout, Duration::from_secs(15));
        assert_eq!(config.pivot_policy, ThresholdPolicy::Fixed { soon_days: 10 });
        assert_eq!(config.card_policy, ThresholdPolicy::Proportional { divisor: 6 });
        assert_eq!(config.days_left_window, 180);
        assert_eq!(config.session_inactivity_hours, 24);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_vars(&vars(&[
            ("SIQ_API_URL", "https://siq.example"),
            ("SIQ_BIND_ADDR", "127.0.0.1:8080"),
            ("SIQ_API_TIMEOUT_SECS", "3"),
            ("SIQ_PIVOT_POLICY", "proportional:6"),
            ("SIQ_CARD_POLICY", "fixed:10"),
            ("SIQ_DAYS_LEFT_WINDOW", "45"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.api_timeout, Duration::from_secs(3));
        assert_eq!(config.pivot_policy, ThresholdPolicy::Proportional { divisor: 6 });
        assert_eq!(config.card_policy, ThresholdPolicy::Fixed { soon_days: 10 });
        assert_eq!(config.days_left_window, 45);
    }

    #[test]
    fn test_range_limits_are_inclusive() {
        let config = AppConfig::from_vars(&vars(&[
            ("SIQ_API_URL", "http://api.local"),
            ("SIQ_DAYS_LEFT_WINDOW", "36500"),
            ("SIQ_SESSION_INACTIVITY_HOURS", "8760"),
        ]))
        .unwrap();
        assert_eq!(config.days_left_window, 36_500);
        // Não pode entrar em pânico no arranque
        let _ = time::Duration::hours(config.session_inactivity_hours);
    }

    #[test]
    fn test_missing_api_url() {
        let err = AppConfig::from_vars(&vars(&[])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("SIQ_API_URL", "ftp://x"),
            ("SIQ_PIVOT_POLICY", "sempre"),
            ("SIQ_API_TIMEOUT_SECS", "-1"),
            ("SIQ_SESSION_INACTIVITY_HOURS", "0"),
            ("SIQ_SESSION_INACTIVITY_HOURS", "9223372036854775807"),
            ("SIQ_SESSION_INACTIVITY_HOURS", "8761"),
            ("SIQ_DAYS_LEFT_WINDOW", "-1"),
            ("SIQ_DAYS_LEFT_WINDOW", "200000000"),
        ] {
            let mut v = vars(&[("SIQ_API_URL", "http://api.local")]);
            v.insert(key.to_string(), value.to_string());
            assert!(AppConfig::from_vars(&v).is_err(), "{}={} devia falhar", key, value);
        }
    }
}
