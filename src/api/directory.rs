//! The directory endpoint: heartbeat, removal and listing
//!
//! One request, terminal in one step. The entry key is `client_ip:port`
//! where the IP comes from the transport, never from a client-supplied
//! field, so a server can only ever register or remove itself.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form,
};

use crate::api::AppState;
use crate::error::AppResult;
use crate::format::{self, OutputKind};
use crate::models::DirectoryParams;
use crate::validate;

/// Listing (and occasionally heartbeat) via query string
pub async fn handle_get(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Query(params): Query<DirectoryParams>,
) -> AppResult<Response> {
    handle(state, peer, params).await
}

/// Heartbeat via urlencoded form body
pub async fn handle_post(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Form(params): Form<DirectoryParams>,
) -> AppResult<Response> {
    handle(state, peer, params).await
}

async fn handle(state: AppState, peer: SocketAddr, params: DirectoryParams) -> AppResult<Response> {
    mutate(&state, peer, &params).await?;
    list(&state, &params).await
}

/// Apply the heartbeat/removal half of the request, if any.
///
/// A request without a `port` is a pure listing. A request with a `port` but
/// no `name` means the server is done hosting. Invalid registrations are
/// dropped without touching the store and without surfacing an error; the
/// reporting server is deliberately not told.
async fn mutate(state: &AppState, peer: SocketAddr, params: &DirectoryParams) -> AppResult<()> {
    if params.port.is_none() {
        return Ok(());
    }

    if params.name.is_none() {
        if let Some(port) = validate::port(params.port.as_deref()) {
            let address = format!("{}:{}", peer.ip(), port);
            state.store.remove(&address).await?;
        }
        return Ok(());
    }

    match validate::registration(
        params.name.as_deref(),
        params.info.as_deref(),
        params.port.as_deref(),
        params.protocol.as_deref(),
    ) {
        Ok(reg) => {
            let address = format!("{}:{}", peer.ip(), reg.port);
            state.store.upsert(&address, reg).await?;
        }
        Err(rejection) => {
            tracing::debug!(peer = %peer.ip(), %rejection, "dropping invalid registration");
        }
    }

    Ok(())
}

/// Render the swept listing. Runs after the mutation branch so an
/// unrecognized format can never cause a heartbeat to be skipped.
async fn list(state: &AppState, params: &DirectoryParams) -> AppResult<Response> {
    let Some(kind) = OutputKind::resolve(params.format.as_deref()) else {
        return Ok((
            StatusCode::BAD_REQUEST,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            "Invalid format",
        )
            .into_response());
    };

    let entries = state.store.snapshot().await?;
    let body = format::render(kind, &entries);
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, kind.content_type())],
        body,
    )
        .into_response())
}
