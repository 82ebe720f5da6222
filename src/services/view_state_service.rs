// src/services/view_state_service.rs
use crate::{
    error::{AppError, AppResult},
    services::pivot_service::PivotViewState,
};
use tower_sessions::Session;

// Um estado de vista por tipo de tripulante
fn session_key(tipo: &str) -> String {
    format!("pivot_view:{}", tipo)
}

pub async fn load(session: &Session, tipo: &str) -> AppResult<PivotViewState> {
    let state = session
        .get::<PivotViewState>(&session_key(tipo))
        .await
        .map_err(|e| AppError::SessionError(format!("Erro ao ler estado da vista: {}", e)))?;
    Ok(state.unwrap_or_default())
}

pub async fn save(session: &Session, tipo: &str, state: &PivotViewState) -> AppResult<()> {
    session
        .insert(&session_key(tipo), state)
        .await
        .map_err(|e| AppError::SessionError(format!("Erro ao guardar estado da vista: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    #[tokio::test]
    async fn test_state_round_trips_through_session() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        assert_eq!(load(&session, "PILOTO").await.unwrap(), PivotViewState::default());

        let mut state = PivotViewState::default();
        state.sync_groups(&["Voo".to_string(), "Segurança".to_string()]);
        state.toggle_group("Voo");
        state.sort.click("QA1");
        save(&session, "PILOTO", &state).await.unwrap();

        assert_eq!(load(&session, "PILOTO").await.unwrap(), state);
        // Tipos diferentes não partilham estado
        assert_eq!(load(&session, "OC").await.unwrap(), PivotViewState::default());
    }
}
