// src/services/expiry_service.rs
use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Estado de uma qualificação, usado apenas para a cor na UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExpiryStatus {
    Expired,
    ExpiringSoon,
    Valid,
}

impl ExpiryStatus {
    pub fn background(&self) -> &'static str {
        match self {
            ExpiryStatus::Expired => "red",
            ExpiryStatus::ExpiringSoon => "yellow",
            ExpiryStatus::Valid => "green",
        }
    }

    // Branco só sobre vermelho, preto no resto (contraste)
    pub fn text_color(&self) -> &'static str {
        match self {
            ExpiryStatus::Expired => "white",
            _ => "black",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExpiryStatus::Expired => "Expirada",
            ExpiryStatus::ExpiringSoon => "A expirar",
            ExpiryStatus::Valid => "Válida",
        }
    }
}

/// Política de limiar para "a expirar".
///
/// Existem duas políticas em uso: a fixa (tabelas/pivot) e a proporcional
/// à janela de validade (painéis por tripulante). Cada vista recebe a sua
/// política da configuração.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdPolicy {
    /// `0 <= dias < soon_days` => a expirar.
    Fixed { soon_days: i64 },
    /// `dias < janela / divisor` => a expirar.
    Proportional { divisor: i64 },
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        ThresholdPolicy::Fixed { soon_days: 10 }
    }
}

impl ThresholdPolicy {
    pub fn proportional_default() -> Self {
        ThresholdPolicy::Proportional { divisor: 6 }
    }

    /// Limiar efetivo em dias para uma dada janela de validade.
    pub fn threshold(&self, validity_window_days: i64) -> i64 {
        match *self {
            ThresholdPolicy::Fixed { soon_days } => soon_days,
            ThresholdPolicy::Proportional { divisor } => {
                validity_window_days.checked_div(divisor).unwrap_or(0)
            }
        }
    }

    pub fn classify(&self, remaining_days: i64, validity_window_days: i64) -> ExpiryStatus {
        if remaining_days < 0 {
            ExpiryStatus::Expired
        } else if remaining_days < self.threshold(validity_window_days) {
            ExpiryStatus::ExpiringSoon
        } else {
            ExpiryStatus::Valid
        }
    }

    /// Versão para células que podem não ter dados (tripulante sem a qualificação).
    pub fn classify_opt(
        &self,
        remaining_days: Option<i64>,
        validity_window_days: i64,
    ) -> Option<ExpiryStatus> {
        remaining_days.map(|d| self.classify(d, validity_window_days))
    }
}

impl fmt::Display for ThresholdPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdPolicy::Fixed { soon_days } => write!(f, "fixed:{}", soon_days),
            ThresholdPolicy::Proportional { divisor } => write!(f, "proportional:{}", divisor),
        }
    }
}

impl FromStr for ThresholdPolicy {
    type Err = String;

    /// Formato: `fixed:10` ou `proportional:6`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, value) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("política '{}' sem ':'", s))?;
        let n: i64 = value
            .trim()
            .parse()
            .map_err(|_| format!("valor inválido em '{}'", s))?;
        match kind.trim().to_ascii_lowercase().as_str() {
            "fixed" if n >= 0 => Ok(ThresholdPolicy::Fixed { soon_days: n }),
            "proportional" if n > 0 => Ok(ThresholdPolicy::Proportional { divisor: n }),
            "fixed" | "proportional" => Err(format!("valor fora do intervalo em '{}'", s)),
            other => Err(format!("tipo de política desconhecido: '{}'", other)),
        }
    }
}

/// Dias que faltam calculados a partir da data de realização:
/// `realizacao + janela - hoje`, em dias inteiros.
///
/// `None` quando a data de expiração sai do intervalo do calendário: a
/// célula mostra "sem dados".
pub fn days_left(completion: NaiveDate, validity_window_days: i64, today: NaiveDate) -> Option<i64> {
    let expiry = completion.checked_add_signed(TimeDelta::try_days(validity_window_days)?)?;
    Some(expiry.signed_duration_since(today).num_days())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_policy_boundaries() {
        let policy = ThresholdPolicy::default();
        assert_eq!(policy.classify(-1, 0), ExpiryStatus::Expired);
        assert_eq!(policy.classify(0, 0), ExpiryStatus::ExpiringSoon);
        assert_eq!(policy.classify(9, 0), ExpiryStatus::ExpiringSoon);
        assert_eq!(policy.classify(10, 0), ExpiryStatus::Valid);
        assert_eq!(policy.classify(i64::MIN, 0), ExpiryStatus::Expired);
    }

    #[test]
    fn test_fixed_policy_ignores_window() {
        let policy = ThresholdPolicy::default();
        for window in [0, 30, 365] {
            assert_eq!(policy.classify(5, window), ExpiryStatus::ExpiringSoon);
            assert_eq!(policy.classify(15, window), ExpiryStatus::Valid);
        }
    }

    #[test]
    fn test_fixed_policy_partition_holds_for_range() {
        let policy = ThresholdPolicy::default();
        for d in -50..50 {
            let expected = if d < 0 {
                ExpiryStatus::Expired
            } else if d < 10 {
                ExpiryStatus::ExpiringSoon
            } else {
                ExpiryStatus::Valid
            };
            assert_eq!(policy.classify(d, 90), expected, "d = {}", d);
        }
    }

    #[test]
    fn test_proportional_policy() {
        let policy = ThresholdPolicy::proportional_default();
        // 180 / 6 = 30
        assert_eq!(policy.classify(-1, 180), ExpiryStatus::Expired);
        assert_eq!(policy.classify(0, 180), ExpiryStatus::ExpiringSoon);
        assert_eq!(policy.classify(29, 180), ExpiryStatus::ExpiringSoon);
        assert_eq!(policy.classify(30, 180), ExpiryStatus::Valid);
        // Janela pequena: 5 / 6 = 0, só negativos ficam assinalados
        assert_eq!(policy.classify(0, 5), ExpiryStatus::Valid);
    }

    #[test]
    fn test_classify_opt_keeps_no_data_distinct() {
        let policy = ThresholdPolicy::default();
        assert_eq!(policy.classify_opt(None, 90), None);
        assert_eq!(policy.classify_opt(Some(50), 90), Some(ExpiryStatus::Valid));
    }

    #[test]
    fn test_colors() {
        assert_eq!(ExpiryStatus::Expired.background(), "red");
        assert_eq!(ExpiryStatus::Expired.text_color(), "white");
        assert_eq!(ExpiryStatus::ExpiringSoon.background(), "yellow");
        assert_eq!(ExpiryStatus::ExpiringSoon.text_color(), "black");
        assert_eq!(ExpiryStatus::Valid.background(), "green");
        assert_eq!(ExpiryStatus::Valid.text_color(), "black");
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "fixed:10".parse::<ThresholdPolicy>(),
            Ok(ThresholdPolicy::Fixed { soon_days: 10 })
        );
        assert_eq!(
            " Proportional : 6 ".parse::<ThresholdPolicy>(),
            Ok(ThresholdPolicy::Proportional { divisor: 6 })
        );
        assert!("proportional:0".parse::<ThresholdPolicy>().is_err());
        assert!("fixed:-1".parse::<ThresholdPolicy>().is_err());
        assert!("fixed".parse::<ThresholdPolicy>().is_err());
        assert!("linear:3".parse::<ThresholdPolicy>().is_err());
    }

    #[test]
    fn test_policy_display_parses_back() {
        for policy in [ThresholdPolicy::default(), ThresholdPolicy::proportional_default()] {
            assert_eq!(policy.to_string().parse::<ThresholdPolicy>(), Ok(policy));
        }
    }

    #[test]
    fn test_days_left() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let done = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        // 1 set + 45 = 16 out
        assert_eq!(days_left(done, 45, today), Some(-1));
        assert_eq!(days_left(done, 180, today), Some(134));
        assert_eq!(days_left(today, 0, today), Some(0));
    }

    #[test]
    fn test_days_left_out_of_calendar_range_is_none() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert_eq!(days_left(NaiveDate::MAX, 180, today), None);
        assert_eq!(days_left(NaiveDate::MIN, -1, today), None);
        assert_eq!(days_left(today, 200_000_000, today), None);
        assert_eq!(days_left(today, i64::MAX, today), None);
    }
}
