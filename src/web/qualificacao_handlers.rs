// src/web/qualificacao_handlers.rs
use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    models::{qualificacao::CrewMember, user::SessionUser},
    services::{
        api_client::ApiClient,
        auth_service,
        pivot_service::{build_pivot, discover_columns, discovered_groups, summarize, GroupAction},
        view_state_service,
    },
    templates::{path_segment, CrewCardPage, QualificacoesPage},
};
use askama::Template;
use axum::{
    extract::{Extension, Form, Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

// ?action=toggle|all|none
#[derive(Deserialize, Debug)]
pub struct GroupQuery {
    action: GroupAction,
}

#[derive(Deserialize, Debug)]
pub struct GroupForm {
    group: Option<String>,
}

fn tipo_href(tipo: &str) -> String {
    format!("/qualificacoes/{}", path_segment(tipo))
}

fn render<T: Template>(template: &T, name: &str) -> AppResult<Response> {
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar template {}: {}", name, e);
            Err(AppError::InternalServerError)
        }
    }
}

/// Busca os tripulantes na API e guarda tokens renovados, se for o caso.
async fn load_crew(
    api: &ApiClient,
    session: &Session,
    user: &SessionUser,
    tipo: &str,
) -> AppResult<Vec<CrewMember>> {
    let mut tokens = user.tokens.clone();
    let result = api.fetch_crew_qualifications(tipo, &mut tokens).await;
    // Mesmo com erro no pedido, o refresh pode ter acontecido
    auth_service::persist_if_refreshed(session, user, tokens).await?;
    result
}

async fn session_expired(session: &Session) -> AppResult<Response> {
    tracing::info!("Sessão expirada no backend, a pedir novo login");
    auth_service::logout(session).await?;
    Ok(Redirect::to("/login").into_response())
}

// GET /qualificacoes/{tipo}
pub async fn pivot_page_handler(
    State(api): State<ApiClient>,
    State(config): State<Arc<AppConfig>>,
    session: Session,
    Extension(user): Extension<SessionUser>,
    Path(tipo): Path<String>,
) -> AppResult<Response> {
    tracing::debug!("GET /qualificacoes/{}: {}", tipo, user.nip);

    let mut view = view_state_service::load(&session, &tipo).await?;

    // Erros da API não partem a página: tabela vazia + aviso
    let (crew, load_error) = match load_crew(&api, &session, &user, &tipo).await {
        Ok(crew) => {
            // Só com dados reais; uma falha não pode limpar a seleção do utilizador
            view.sync_groups(&discovered_groups(&discover_columns(&crew)));
            view_state_service::save(&session, &tipo, &view).await?;
            (crew, None)
        }
        Err(AppError::SessionExpired) => return session_expired(&session).await,
        Err(e) => {
            tracing::error!("Falha ao carregar qualificações '{}': {:?}", tipo, e);
            (Vec::new(), Some("Não foi possível carregar os dados.".to_string()))
        }
    };

    let policy = config.pivot_policy;
    let table = build_pivot(&crew, &view, &policy);
    let summary = summarize(&table);
    if table.is_empty() {
        tracing::debug!("Pivot '{}' sem tripulantes, a mostrar placeholder", tipo);
    }
    tracing::debug!(
        "Pivot '{}': {} linhas, {} colunas visíveis",
        tipo,
        table.rows.len(),
        table.columns.len()
    );

    let page = QualificacoesPage::new(&tipo, &table, &summary, &policy, load_error);
    render(&page, "QualificacoesPage")
}

// GET /qualificacoes/{tipo}/sort/{qualificacao}
pub async fn handle_sort(
    session: Session,
    Path((tipo, qualificacao)): Path<(String, String)>,
) -> AppResult<Redirect> {
    let mut view = view_state_service::load(&session, &tipo).await?;
    view.sort.click(&qualificacao);
    tracing::debug!(
        "Ordenação '{}': {:?} {:?}",
        tipo,
        view.sort.column,
        view.sort.direction
    );
    view_state_service::save(&session, &tipo, &view).await?;
    Ok(Redirect::to(&tipo_href(&tipo)))
}

// POST /qualificacoes/{tipo}/grupos?action=...
pub async fn handle_group_filter(
    session: Session,
    Path(tipo): Path<String>,
    Query(query): Query<GroupQuery>,
    Form(form): Form<GroupForm>,
) -> AppResult<Redirect> {
    let mut view = view_state_service::load(&session, &tipo).await?;
    view.apply(&query.action, form.group.as_deref());
    view_state_service::save(&session, &tipo, &view).await?;
    Ok(Redirect::to(&tipo_href(&tipo)))
}

// GET /qualificacoes/{tipo}/{nip}
pub async fn crew_card_handler(
    State(api): State<ApiClient>,
    State(config): State<Arc<AppConfig>>,
    session: Session,
    Extension(user): Extension<SessionUser>,
    Path((tipo, nip)): Path<(String, String)>,
) -> AppResult<Response> {
    let crew = match load_crew(&api, &session, &user, &tipo).await {
        Ok(crew) => crew,
        Err(AppError::SessionExpired) => return session_expired(&session).await,
        Err(e) => return Err(e),
    };

    let member = crew
        .iter()
        .find(|m| m.nip == nip)
        .ok_or_else(|| AppError::NotFound(format!("tripulante {} em {}", nip, tipo)))?;

    let today = chrono::Local::now().date_naive();
    let page = CrewCardPage::new(
        &tipo,
        member,
        &config.card_policy,
        config.days_left_window,
        today,
    );
    render(&page, "CrewCardPage")
}
