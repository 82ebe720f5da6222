// src/web/routes.rs
use crate::{
    state::AppState,
    web::{auth_handlers, mw_auth, qualificacao_handlers, user_handlers},
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub fn create_router(app_state: AppState) -> Router {
    // --- Rotas Públicas ---
    let public_routes = Router::new()
        .route("/login", get(auth_handlers::show_login_form).post(auth_handlers::handle_login))
        .route("/logout", get(auth_handlers::handle_logout))
        .route("/", get(|| async { axum::response::Redirect::permanent("/login") }));

    let qualificacao_routes = Router::new()
        .route("/{tipo}", get(qualificacao_handlers::pivot_page_handler))
        // Clique no cabeçalho da coluna
        .route("/{tipo}/sort/{qualificacao}", get(qualificacao_handlers::handle_sort))
        .route("/{tipo}/grupos", post(qualificacao_handlers::handle_group_filter))
        .route("/{tipo}/{nip}", get(qualificacao_handlers::crew_card_handler));

    // --- Rotas Autenticadas ---
    let authenticated_routes = Router::new()
        .route("/user", get(user_handlers::user_page_handler))
        .nest("/qualificacoes", qualificacao_routes)
        // require_auth em TODAS as rotas acima (incluindo as aninhadas)
        .route_layer(middleware::from_fn(mw_auth::require_auth));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        services::{api_client::ApiClient, request_coordinator::RequestCoordinator},
    };
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use std::{collections::HashMap, sync::Arc, time::Duration};
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    fn app() -> Router {
        let vars: HashMap<String, String> =
            [("SIQ_API_URL".to_string(), "http://127.0.0.1:9".to_string())].into();
        let config = AppConfig::from_vars(&vars).unwrap();
        let api = ApiClient::new(
            &config.api_url,
            Duration::from_secs(1),
            Arc::new(RequestCoordinator::new()),
        )
        .unwrap();
        let state = AppState {
            api,
            config: Arc::new(config),
        };
        create_router(state).layer(SessionManagerLayer::new(MemoryStore::default()))
    }

    #[tokio::test]
    async fn test_protected_routes_redirect_to_login() {
        for uri in ["/user", "/qualificacoes/PILOTO", "/qualificacoes/PILOTO/123"] {
            let resp = app()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{}", uri);
            assert_eq!(resp.headers()[header::LOCATION], "/login");
        }
    }

    #[tokio::test]
    async fn test_login_page_renders() {
        let resp = app()
            .oneshot(Request::builder().uri("/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_with_backend_down_shows_unavailable() {
        let resp = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("username=123&password=x"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("Serviço indisponível"));
    }

    #[tokio::test]
    async fn test_root_redirects() {
        let resp = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PERMANENT_REDIRECT);
    }
}
