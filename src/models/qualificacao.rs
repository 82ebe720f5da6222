// src/models/qualificacao.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::error::{AppError, AppResult};

/// Grupo atribuído a qualificações que chegam sem `grupo`.
pub const UNGROUPED: &str = "Ungrouped";

// --- Estruturas de domínio (já validadas) ---

/// Interpretação tipada do tuplo `validade_info` devolvido pela API:
/// `[dias_restantes, etiqueta_expiracao, janela_validade_dias]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidityInfo {
    pub remaining_days: i64, // Pode ser negativo (já expirou)
    pub expiry_label: String,
    pub validity_window_days: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualificationRecord {
    pub name: String,
    pub group: String,
    // None = "sem dados" (validade_info ausente ou malformado)
    pub validity: Option<ValidityInfo>,
    pub last_done: Option<NaiveDate>,
}

impl QualificationRecord {
    pub fn remaining_days(&self) -> Option<i64> {
        self.validity.as_ref().map(|v| v.remaining_days)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrewMember {
    pub nip: String,
    pub name: String,
    pub rank: String,
    pub position: String,
    pub qualifications: Vec<QualificationRecord>,
}

impl CrewMember {
    /// Primeira qualificação com este nome (não há fusão de duplicados).
    pub fn qualification(&self, name: &str) -> Option<&QualificationRecord> {
        self.qualifications.iter().find(|q| q.name == name)
    }
}

// --- Estruturas que espelham o JSON da API ---

#[derive(Debug, Deserialize)]
struct CrewMemberWire {
    nip: Value, // Número ou string, depende do endpoint
    #[serde(default, alias = "nome")]
    name: Option<String>,
    #[serde(default, alias = "posto")]
    rank: Option<String>,
    #[serde(default, alias = "funcao")]
    position: Option<String>,
    #[serde(default)]
    qualificacoes: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct QualificationWire {
    #[serde(default, alias = "nome")]
    name: Option<String>,
    #[serde(default, alias = "grupo")]
    group: Option<String>,
    #[serde(default)]
    validade_info: Option<Value>,
    #[serde(default)]
    data_ultima: Option<String>,
}

// --- Fronteira de validação: JSON da API -> tipos de domínio ---

impl ValidityInfo {
    /// Converte o tuplo do wire. Qualquer forma inesperada devolve `None`.
    pub fn from_wire(value: &Value) -> Option<Self> {
        let items = value.as_array()?;
        if items.len() != 3 {
            return None;
        }
        let remaining_days = integer(&items[0])?;
        let expiry_label = match &items[1] {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            _ => return None,
        };
        let validity_window_days = integer(&items[2])?;
        Some(ValidityInfo {
            remaining_days,
            expiry_label,
            validity_window_days,
        })
    }
}

// Aceita inteiros e floats sem parte decimal (o backend serializa alguns como 12.0)
fn integer(value: &Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    let f = value.as_f64()?;
    (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

fn nip_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_qualification(nip: &str, raw: Value) -> Option<QualificationRecord> {
    let wire: QualificationWire = match serde_json::from_value(raw) {
        Ok(w) => w,
        Err(e) => {
            tracing::warn!("Qualificação ignorada (tripulante {}): {}", nip, e);
            return None;
        }
    };

    let name = wire.name.map(|n| n.trim().to_string()).unwrap_or_default();
    if name.is_empty() {
        tracing::warn!("Qualificação sem nome ignorada (tripulante {})", nip);
        return None;
    }

    let group = wire
        .group
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .unwrap_or_else(|| UNGROUPED.to_string());

    let validity = match wire.validade_info.as_ref() {
        None | Some(Value::Null) => None,
        Some(v) => {
            let parsed = ValidityInfo::from_wire(v);
            if parsed.is_none() {
                tracing::warn!(
                    "validade_info malformado para {} (tripulante {}): {}",
                    name,
                    nip,
                    v
                );
            }
            parsed
        }
    };

    let last_done = wire.data_ultima.as_deref().and_then(|s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| tracing::warn!("data_ultima inválida para {} ({}): {}", name, nip, e))
            .ok()
    });

    Some(QualificationRecord {
        name,
        group,
        validity,
        last_done,
    })
}

fn parse_crew_member(raw: Value) -> Option<CrewMember> {
    let wire: CrewMemberWire = match serde_json::from_value(raw) {
        Ok(w) => w,
        Err(e) => {
            tracing::warn!("Tripulante ignorado (payload inválido): {}", e);
            return None;
        }
    };

    let Some(nip) = nip_to_string(&wire.nip) else {
        tracing::warn!("Tripulante ignorado: NIP inválido ({})", wire.nip);
        return None;
    };

    // Duplicados: fica a primeira ocorrência de cada nome
    let mut seen = HashSet::new();
    let mut qualifications = Vec::new();
    for raw_q in wire.qualificacoes.unwrap_or_default() {
        let Some(q) = parse_qualification(&nip, raw_q) else {
            continue;
        };
        if seen.insert(q.name.clone()) {
            qualifications.push(q);
        } else {
            tracing::warn!("Qualificação duplicada '{}' para {}, mantida a primeira", q.name, nip);
        }
    }

    Some(CrewMember {
        nip,
        name: wire.name.unwrap_or_default(),
        rank: wire.rank.unwrap_or_default(),
        position: wire.position.unwrap_or_default(),
        qualifications,
    })
}

/// Converte a resposta de `GET /v2/tripulantes/qualificacoes/{tipo}`.
/// Só falha se o topo não for uma lista; entradas inválidas são descartadas.
pub fn parse_crew_payload(payload: Value) -> AppResult<Vec<CrewMember>> {
    let Value::Array(items) = payload else {
        return Err(AppError::Schema(format!(
            "esperada lista de tripulantes, recebido {}",
            json_kind(&payload)
        )));
    };
    let total = items.len();
    let crew: Vec<CrewMember> = items.into_iter().filter_map(parse_crew_member).collect();
    if crew.len() != total {
        tracing::warn!("{} de {} tripulantes descartados na validação", total - crew.len(), total);
    }
    Ok(crew)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "booleano",
        Value::Number(_) => "número",
        Value::String(_) => "string",
        Value::Array(_) => "lista",
        Value::Object(_) => "objeto",
    }
}
