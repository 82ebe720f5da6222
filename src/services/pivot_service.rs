// src/services/pivot_service.rs
//! Tabela pivot tripulante x qualificação.
//!
//! Uma linha por tripulante, uma coluna por qualificação, com as colunas
//! agrupadas pelo `grupo` da qualificação. O estado de ordenação e de filtro
//! por grupo vive em [`PivotViewState`], que os handlers guardam na sessão.

use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashSet},
};

use crate::{
    models::qualificacao::CrewMember,
    services::expiry_service::{ExpiryStatus, ThresholdPolicy},
};

// --- Colunas ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotColumn {
    pub name: String,
    pub group: String,
}

/// Cabeçalho de grupo: ocupa `columns.len()` colunas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnGroup {
    pub name: String,
    pub columns: Vec<PivotColumn>,
}

impl ColumnGroup {
    pub fn span(&self) -> usize {
        self.columns.len()
    }
}

// Chave de comparação "à portuguesa": sem acentos e sem distinção de maiúsculas
fn fold_char(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Ì' | 'Î' | 'Ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' | 'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' | 'Ú' | 'Ù' | 'Û' | 'Ü' => 'u',
        'ç' | 'Ç' => 'c',
        'ñ' | 'Ñ' => 'n',
        other => other.to_lowercase().next().unwrap_or(other),
    }
}

/// Comparação de strings sensível ao idioma (pt).
/// Em empate na forma dobrada, desempata pela string original para a ordem ser total.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.chars()
        .map(fold_char)
        .cmp(b.chars().map(fold_char))
        .then_with(|| a.cmp(b))
}

/// Descobre as colunas: um par (nome, grupo) por nome de qualificação,
/// onde a primeira ocorrência fixa o grupo. Ordenado por (grupo, nome).
pub fn discover_columns(crew: &[CrewMember]) -> Vec<PivotColumn> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for member in crew {
        for q in &member.qualifications {
            if seen.insert(q.name.as_str()) {
                columns.push(PivotColumn {
                    name: q.name.clone(),
                    group: q.group.clone(),
                });
            }
        }
    }
    columns.sort_by(|a, b| locale_cmp(&a.group, &b.group).then_with(|| locale_cmp(&a.name, &b.name)));
    columns
}

/// Parte a lista (já ordenada) de colunas em grupos consecutivos.
pub fn group_columns(columns: &[PivotColumn]) -> Vec<ColumnGroup> {
    let mut groups: Vec<ColumnGroup> = Vec::new();
    for col in columns {
        match groups.last_mut() {
            Some(last) if last.name == col.group => last.columns.push(col.clone()),
            _ => groups.push(ColumnGroup {
                name: col.group.clone(),
                columns: vec![col.clone()],
            }),
        }
    }
    groups
}

/// Nomes dos grupos pela ordem das colunas.
pub fn discovered_groups(columns: &[PivotColumn]) -> Vec<String> {
    group_columns(columns).into_iter().map(|g| g.name).collect()
}

// --- Estado da vista (ordenação + filtro de grupos) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

/// Só uma coluna ativa de cada vez.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortState {
    pub column: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    /// Clique no cabeçalho: mesma coluna alterna asc/desc, coluna nova começa em asc.
    pub fn click(&mut self, column: &str) {
        if self.column.as_deref() == Some(column) {
            self.direction = self.direction.toggled();
        } else {
            self.column = Some(column.to_string());
            self.direction = SortDirection::Asc;
        }
    }

    pub fn is_active(&self, column: &str) -> bool {
        self.column.as_deref() == Some(column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GroupSelection {
    /// Ainda não houve carga de dados para esta vista.
    #[default]
    Uninitialized,
    Ready {
        /// Grupos da última carga.
        known: Vec<String>,
        /// Todos os grupos que já apareceram nesta vista.
        #[serde(default)]
        seen: BTreeSet<String>,
        selected: BTreeSet<String>,
    },
}

/// Ação do formulário de filtro de grupos.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupAction {
    Toggle,
    All,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PivotViewState {
    pub groups: GroupSelection,
    pub sort: SortState,
}

impl PivotViewState {
    /// Chamado a cada carga de dados.
    ///
    /// Na primeira carga seleciona todos os grupos. Nas seguintes só entram
    /// selecionados os grupos nunca vistos; um grupo desmarcado continua
    /// desmarcado mesmo que desapareça numa carga e volte na seguinte.
    pub fn sync_groups(&mut self, discovered: &[String]) {
        if let GroupSelection::Ready { known, seen, selected } = &mut self.groups {
            for g in discovered {
                if seen.insert(g.clone()) {
                    tracing::debug!("Grupo novo '{}' selecionado", g);
                    selected.insert(g.clone());
                }
            }
            *known = discovered.to_vec();
            return;
        }

        tracing::debug!("Grupos inicializados: {:?}", discovered);
        self.groups = GroupSelection::Ready {
            known: discovered.to_vec(),
            seen: discovered.iter().cloned().collect(),
            selected: discovered.iter().cloned().collect(),
        };
    }

    pub fn is_group_selected(&self, group: &str) -> bool {
        match &self.groups {
            GroupSelection::Uninitialized => true,
            GroupSelection::Ready { selected, .. } => selected.contains(group),
        }
    }

    pub fn toggle_group(&mut self, group: &str) {
        if let GroupSelection::Ready { known, selected, .. } = &mut self.groups {
            if !known.iter().any(|g| g == group) {
                tracing::debug!("toggle '{}' ignorado: grupo fora da carga atual", group);
                return;
            }
            if !selected.remove(group) {
                selected.insert(group.to_string());
            }
        } else {
            tracing::debug!("toggle '{}' ignorado: grupos ainda não carregados", group);
        }
    }

    pub fn select_all(&mut self) {
        if let GroupSelection::Ready { known, selected, .. } = &mut self.groups {
            selected.extend(known.iter().cloned());
        }
    }

    pub fn select_none(&mut self) {
        if let GroupSelection::Ready { selected, .. } = &mut self.groups {
            selected.clear();
        }
    }

    pub fn apply(&mut self, action: &GroupAction, group: Option<&str>) {
        match (action, group) {
            (GroupAction::Toggle, Some(g)) => self.toggle_group(g),
            (GroupAction::Toggle, None) => tracing::debug!("toggle sem grupo ignorado"),
            (GroupAction::All, _) => self.select_all(),
            (GroupAction::None, _) => self.select_none(),
        }
    }
}

// --- Tabela calculada ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotCell {
    pub remaining_days: Option<i64>,
    pub expiry_label: String,
    pub status: Option<ExpiryStatus>,
}

impl PivotCell {
    pub fn display(&self) -> String {
        self.remaining_days
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string())
    }

    pub fn css_class(&self) -> &'static str {
        match self.status {
            Some(ExpiryStatus::Expired) => "cell-expired",
            Some(ExpiryStatus::ExpiringSoon) => "cell-soon",
            Some(ExpiryStatus::Valid) => "cell-valid",
            None => "cell-nodata",
        }
    }

    pub fn style(&self) -> String {
        match self.status {
            Some(s) => format!("background:{};color:{}", s.background(), s.text_color()),
            None => "background:#eee;color:#888".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotRow {
    pub nip: String,
    pub name: String,
    pub rank: String,
    pub position: String,
    pub cells: Vec<PivotCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupOption {
    pub name: String,
    pub selected: bool,
    pub column_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotTable {
    /// Só os grupos selecionados.
    pub groups: Vec<ColumnGroup>,
    pub columns: Vec<PivotColumn>,
    pub rows: Vec<PivotRow>,
    /// Todos os grupos descobertos, para o filtro.
    pub group_options: Vec<GroupOption>,
    pub sort: SortState,
}

impl PivotTable {
    /// Posto/função + nome + colunas de qualificação.
    pub fn total_columns(&self) -> usize {
        2 + self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Ordena de forma estável; `None` fica sempre no fim, em qualquer direção.
pub fn sort_nulls_last<T>(items: &mut [T], direction: SortDirection, key: impl Fn(&T) -> Option<i64>) {
    items.sort_by(|a, b| match (key(a), key(b)) {
        (Some(x), Some(y)) => match direction {
            SortDirection::Asc => x.cmp(&y),
            SortDirection::Desc => y.cmp(&x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Constrói a tabela a partir da lista de tripulantes e do estado da vista.
/// O estado deve ter passado por [`PivotViewState::sync_groups`] com os grupos atuais.
pub fn build_pivot(crew: &[CrewMember], view: &PivotViewState, policy: &ThresholdPolicy) -> PivotTable {
    let all_columns = discover_columns(crew);
    let all_groups = group_columns(&all_columns);

    let group_options = all_groups
        .iter()
        .map(|g| GroupOption {
            name: g.name.clone(),
            selected: view.is_group_selected(&g.name),
            column_count: g.span(),
        })
        .collect();

    let groups: Vec<ColumnGroup> = all_groups
        .into_iter()
        .filter(|g| view.is_group_selected(&g.name))
        .collect();
    let columns: Vec<PivotColumn> = groups.iter().flat_map(|g| g.columns.iter().cloned()).collect();

    let mut members: Vec<&CrewMember> = crew.iter().collect();
    if let Some(sort_col) = view.sort.column.as_deref() {
        sort_nulls_last(&mut members, view.sort.direction, |m| {
            m.qualification(sort_col).and_then(|q| q.remaining_days())
        });
    }

    let rows = members
        .into_iter()
        .map(|member| PivotRow {
            nip: member.nip.clone(),
            name: member.name.clone(),
            rank: member.rank.clone(),
            position: member.position.clone(),
            cells: columns
                .iter()
                .map(|col| {
                    let validity = member.qualification(&col.name).and_then(|q| q.validity.as_ref());
                    PivotCell {
                        remaining_days: validity.map(|v| v.remaining_days),
                        expiry_label: validity.map(|v| v.expiry_label.clone()).unwrap_or_default(),
                        status: validity.map(|v| policy.classify(v.remaining_days, v.validity_window_days)),
                    }
                })
                .collect(),
        })
        .collect();

    PivotTable {
        groups,
        columns,
        rows,
        group_options,
        sort: view.sort.clone(),
    }
}

// --- Resumo (dashboard) ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub expired: usize,
    pub expiring_soon: usize,
    pub valid: usize,
    pub no_data: usize,
}

impl StatusCounts {
    fn add(&mut self, status: Option<ExpiryStatus>) {
        match status {
            Some(ExpiryStatus::Expired) => self.expired += 1,
            Some(ExpiryStatus::ExpiringSoon) => self.expiring_soon += 1,
            Some(ExpiryStatus::Valid) => self.valid += 1,
            None => self.no_data += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.expired + self.expiring_soon + self.valid + self.no_data
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub group: String,
    pub counts: StatusCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PivotSummary {
    pub groups: Vec<GroupSummary>,
    pub overall: StatusCounts,
}

/// Contagens por estado sobre as colunas visíveis.
pub fn summarize(table: &PivotTable) -> PivotSummary {
    let mut summary = PivotSummary::default();
    let mut offset = 0;
    for group in &table.groups {
        let mut counts = StatusCounts::default();
        for row in &table.rows {
            for cell in &row.cells[offset..offset + group.span()] {
                counts.add(cell.status);
                summary.overall.add(cell.status);
            }
        }
        offset += group.span();
        summary.groups.push(GroupSummary {
            group: group.name.clone(),
            counts,
        });
    }
    summary
}
