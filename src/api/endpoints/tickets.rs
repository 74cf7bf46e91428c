//! Clinician triage queue.
//!
//! - `GET /api/tickets?status=open|resolved|all`: newest first
//! - `GET /api/tickets/:id`
//! - `POST /api/tickets/:id/resolve`

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ResolveRequest, TicketListResponse, TicketView};
use crate::db::SqliteStore;
use crate::models::TicketStatusFilter;
use crate::pipeline::triage::TicketManager;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: TicketStatusFilter,
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<ListQuery>,
) -> Result<Json<TicketListResponse>, ApiError> {
    let response = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let conn = ctx.open_db()?;
        let store = SqliteStore::new(&conn);
        let manager = TicketManager::new(&store);

        let tickets = manager.list(query.status)?;
        let open_count = manager.count_open()?;
        Ok(TicketListResponse {
            tickets: tickets.into_iter().map(TicketView::from).collect(),
            open_count,
        })
    })
    .await??;

    Ok(Json(response))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<TicketView>, ApiError> {
    let id = parse_ticket_id(&id)?;
    let ticket = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let conn = ctx.open_db()?;
        let store = SqliteStore::new(&conn);
        Ok(TicketManager::new(&store).get(id)?)
    })
    .await??;

    Ok(Json(TicketView::from(ticket)))
}

pub async fn resolve(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<TicketView>, ApiError> {
    let id = parse_ticket_id(&id)?;
    let ticket = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let conn = ctx.open_db()?;
        let store = SqliteStore::new(&conn);
        let resolved_by = req.resolved_by.as_deref().filter(|s| !s.trim().is_empty());
        Ok(TicketManager::new(&store).resolve_by(id, &req.notes, resolved_by)?)
    })
    .await??;

    Ok(Json(TicketView::from(ticket)))
}

fn parse_ticket_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid ticket id: {raw}")))
}
