// src/templates.rs
use askama::Template; // Trait necessário para Askama
use chrono::NaiveDate;

use crate::{
    models::qualificacao::CrewMember,
    services::{
        expiry_service::{days_left, ThresholdPolicy},
        pivot_service::{locale_cmp, PivotSummary, PivotTable, StatusCounts},
    },
};

/// Segmento de URL seguro para nomes com espaços/acentos.
pub fn path_segment(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

// Struct para o template `login.html`
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    // Campo opcional para passar uma mensagem de erro para o template
    pub error: Option<String>,
}

#[derive(Clone, Debug)]
pub struct TipoLink {
    pub label: &'static str,
    pub href: String,
}

#[derive(Template)]
#[template(path = "user_page.html")]
pub struct UserPage {
    pub nip: String,
    pub tipos: Vec<TipoLink>,
}

// --- Página da tabela pivot ---

#[derive(Clone, Debug)]
pub struct GroupHeader {
    pub name: String,
    pub span: usize,
}

#[derive(Clone, Debug)]
pub struct HeaderCell {
    pub name: String,
    pub href: String,
    pub indicator: &'static str,
}

#[derive(Clone, Debug)]
pub struct CellView {
    pub text: String,
    pub class: &'static str,
    pub style: String,
    pub title: String,
}

#[derive(Clone, Debug)]
pub struct RowView {
    pub nip: String,
    pub name: String,
    pub rank: String,
    pub position: String,
    pub card_href: String,
    pub cells: Vec<CellView>,
}

#[derive(Clone, Debug)]
pub struct GroupFilterView {
    pub name: String,
    pub selected: bool,
    pub column_count: usize,
}

#[derive(Clone, Debug)]
pub struct SummaryLine {
    pub label: String,
    pub counts: StatusCounts,
}

#[derive(Template)]
#[template(path = "qualificacoes.html")]
pub struct QualificacoesPage {
    pub tipo: String,
    pub tipo_href: String,
    pub policy: String,
    pub load_error: Option<String>,
    pub group_headers: Vec<GroupHeader>,
    pub headers: Vec<HeaderCell>,
    pub rows: Vec<RowView>,
    pub filters: Vec<GroupFilterView>,
    pub summary: Vec<SummaryLine>,
    pub total_columns: usize,
}

impl QualificacoesPage {
    pub fn new(
        tipo: &str,
        table: &PivotTable,
        summary: &PivotSummary,
        policy: &ThresholdPolicy,
        load_error: Option<String>,
    ) -> Self {
        let tipo_href = format!("/qualificacoes/{}", path_segment(tipo));

        let headers = table
            .columns
            .iter()
            .map(|c| HeaderCell {
                name: c.name.clone(),
                href: format!("{}/sort/{}", tipo_href, path_segment(&c.name)),
                indicator: if table.sort.is_active(&c.name) {
                    table.sort.direction.arrow()
                } else {
                    ""
                },
            })
            .collect();

        let rows = table
            .rows
            .iter()
            .map(|r| RowView {
                nip: r.nip.clone(),
                name: r.name.clone(),
                rank: r.rank.clone(),
                position: r.position.clone(),
                card_href: format!("{}/{}", tipo_href, path_segment(&r.nip)),
                cells: r
                    .cells
                    .iter()
                    .map(|c| CellView {
                        text: c.display(),
                        class: c.css_class(),
                        style: c.style(),
                        title: c.expiry_label.clone(),
                    })
                    .collect(),
            })
            .collect();

        let mut summary_lines: Vec<SummaryLine> = summary
            .groups
            .iter()
            .map(|g| SummaryLine {
                label: g.group.clone(),
                counts: g.counts.clone(),
            })
            .collect();
        if !summary_lines.is_empty() {
            summary_lines.push(SummaryLine {
                label: "Total".to_string(),
                counts: summary.overall.clone(),
            });
        }

        QualificacoesPage {
            tipo: tipo.to_string(),
            tipo_href,
            policy: policy.to_string(),
            load_error,
            group_headers: table
                .groups
                .iter()
                .map(|g| GroupHeader {
                    name: g.name.clone(),
                    span: g.span(),
                })
                .collect(),
            headers,
            rows,
            filters: table
                .group_options
                .iter()
                .map(|g| GroupFilterView {
                    name: g.name.clone(),
                    selected: g.selected,
                    column_count: g.column_count,
                })
                .collect(),
            summary: summary_lines,
            total_columns: table.total_columns(),
        }
    }
}

// --- Cartão do tripulante ---

#[derive(Clone, Debug)]
pub struct CardItem {
    pub name: String,
    pub remaining: String,
    pub expiry_label: String,
    pub status_label: &'static str,
    pub style: String,
    /// Dias calculados a partir de `data_ultima`, se existir.
    pub computed: Option<i64>,
}

#[derive(Clone, Debug)]
pub struct CardGroup {
    pub name: String,
    pub items: Vec<CardItem>,
}

#[derive(Template)]
#[template(path = "crew_card.html")]
pub struct CrewCardPage {
    pub tipo: String,
    pub tipo_href: String,
    pub nip: String,
    pub name: String,
    pub rank: String,
    pub position: String,
    pub policy: String,
    pub groups: Vec<CardGroup>,
}

impl CrewCardPage {
    pub fn new(
        tipo: &str,
        member: &CrewMember,
        policy: &ThresholdPolicy,
        days_left_window: i64,
        today: NaiveDate,
    ) -> Self {
        let mut groups: Vec<CardGroup> = Vec::new();
        let mut quals: Vec<_> = member.qualifications.iter().collect();
        quals.sort_by(|a, b| {
            locale_cmp(&a.group, &b.group).then_with(|| locale_cmp(&a.name, &b.name))
        });

        for q in quals {
            let window = q.validity.as_ref().map_or(0, |v| v.validity_window_days);
            let status = policy.classify_opt(q.remaining_days(), window);
            let item = CardItem {
                name: q.name.clone(),
                remaining: q
                    .remaining_days()
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                expiry_label: q
                    .validity
                    .as_ref()
                    .map(|v| v.expiry_label.clone())
                    .unwrap_or_default(),
                status_label: status.map_or("Sem dados", |s| s.label()),
                style: status.map_or_else(
                    || "background:#eee;color:#888".to_string(),
                    |s| format!("background:{};color:{}", s.background(), s.text_color()),
                ),
                computed: q.last_done.and_then(|d| days_left(d, days_left_window, today)),
            };
            match groups.last_mut() {
                Some(g) if g.name == q.group => g.items.push(item),
                _ => groups.push(CardGroup {
                    name: q.group.clone(),
                    items: vec![item],
                }),
            }
        }

        CrewCardPage {
            tipo: tipo.to_string(),
            tipo_href: format!("/qualificacoes/{}", path_segment(tipo)),
            nip: member.nip.clone(),
            name: member.name.clone(),
            rank: member.rank.clone(),
            position: member.position.clone(),
            policy: policy.to_string(),
            groups,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::qualificacao::{QualificationRecord, ValidityInfo},
        services::pivot_service::{build_pivot, summarize, PivotViewState},
    };

    fn crew() -> Vec<CrewMember> {
        vec![CrewMember {
            nip: "123".to_string(),
            name: "Silva".to_string(),
            rank: "TEN".to_string(),
            position: "PI".to_string(),
            qualifications: vec![
                QualificationRecord {
                    name: "QA 1".to_string(),
                    group: "Voo".to_string(),
                    validity: Some(ValidityInfo {
                        remaining_days: -2,
                        expiry_label: "15/10/2026".to_string(),
                        validity_window_days: 180,
                    }),
                    last_done: NaiveDate::from_ymd_opt(2026, 4, 18),
                },
                QualificationRecord {
                    name: "BSP1".to_string(),
                    group: "Segurança".to_string(),
                    validity: Some(ValidityInfo {
                        remaining_days: 20,
                        expiry_label: "06/11/2026".to_string(),
                        validity_window_days: 180,
                    }),
                    last_done: None,
                },
            ],
        }]
    }

    #[test]
    fn test_empty_table_renders_placeholder_row() {
        let table = build_pivot(&[], &PivotViewState::default(), &ThresholdPolicy::default());
        let page = QualificacoesPage::new(
            "PILOTO",
            &table,
            &summarize(&table),
            &ThresholdPolicy::default(),
            None,
        );
        let html = page.render().unwrap();
        assert!(html.contains("Sem dados"));
        assert!(html.contains(r#"colspan="2""#));
        assert!(page.summary.is_empty());
    }

    #[test]
    fn test_page_links_and_headers() {
        let crew = crew();
        let mut view = PivotViewState::default();
        view.sync_groups(&["Segurança".to_string(), "Voo".to_string()]);
        view.sort.click("QA 1");
        let table = build_pivot(&crew, &view, &ThresholdPolicy::default());
        let page = QualificacoesPage::new(
            "OPERADOR CABINE",
            &table,
            &summarize(&table),
            &ThresholdPolicy::default(),
            None,
        );

        assert_eq!(page.tipo_href, "/qualificacoes/OPERADOR%20CABINE");
        assert_eq!(page.headers[1].href, "/qualificacoes/OPERADOR%20CABINE/sort/QA%201");
        assert_eq!(page.headers[1].indicator, "▲");
        assert_eq!(page.headers[0].indicator, "");
        assert_eq!(page.rows[0].card_href, "/qualificacoes/OPERADOR%20CABINE/123");
        assert_eq!(page.total_columns, 4);
        assert_eq!(page.summary.last().unwrap().label, "Total");

        let html = page.render().unwrap();
        assert!(html.contains("background:red;color:white"));
        assert!(html.contains("Segurança"));
    }

    #[test]
    fn test_crew_card_uses_card_policy_and_days_left() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let page = CrewCardPage::new(
            "PILOTO",
            &crew()[0],
            &ThresholdPolicy::proportional_default(),
            180,
            today,
        );
        assert_eq!(page.groups.len(), 2);
        assert_eq!(page.groups[0].name, "Segurança");
        // 20 < 180/6 = 30
        assert_eq!(page.groups[0].items[0].status_label, "A expirar");
        assert_eq!(page.groups[1].items[0].status_label, "Expirada");
        // 18 abr + 180 = 15 out
        assert_eq!(page.groups[1].items[0].computed, Some(-2));
        assert!(page.render().unwrap().contains("Silva"));
    }

    #[test]
    fn test_crew_card_with_extreme_last_done_renders_no_data() {
        let mut member = crew().remove(0);
        member.qualifications[1].last_done = Some(NaiveDate::MAX);
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let page = CrewCardPage::new("PILOTO", &member, &ThresholdPolicy::default(), 180, today);
        assert_eq!(page.groups[0].items[0].name, "BSP1");
        assert_eq!(page.groups[0].items[0].computed, None);
        assert!(page.render().is_ok());
    }
}
