//src/main.rs

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod common;
mod config;
mod db;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG manda; sem ele, info
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = AppConfig::from_env()?;
    let app_state = AppState::new(&config).await?;

    // Estado local da sessão: carregado uma vez, depois mantido pelos motores
    app_state.sync().await?;

    let app = app_router(app_state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn app_router(app_state: AppState) -> Router {
    let lead_routes = Router::new()
        .route("/"
               ,get(handlers::crm::list_leads)
               .post(handlers::crm::create_lead)
        )
        .route("/{id}"
               ,put(handlers::crm::update_lead)
               .delete(handlers::crm::delete_lead)
        )
        .route("/{id}/phase", patch(handlers::crm::move_lead))
        .route("/{id}/matching-vehicles", get(handlers::crm::matching_vehicles))
        .route("/{id}/purchases", get(handlers::crm::purchases));

    let vehicle_routes = Router::new()
        .route("/"
               ,get(handlers::inventory::list_vehicles)
               .post(handlers::inventory::create_vehicle)
        )
        .route("/{id}"
               ,put(handlers::inventory::update_vehicle)
               .delete(handlers::inventory::delete_vehicle)
        )
        .route("/{id}/sell", post(handlers::inventory::sell_vehicle))
        .route("/{id}/matching-leads", get(handlers::inventory::matching_leads));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/sync", post(handlers::crm::sync_state))
        .route("/api/funnel/{menu}", get(handlers::crm::funnel_board))
        .route("/api/dashboard", get(handlers::dashboard::get_snapshot))
        .nest("/api/leads", lead_routes)
        .nest("/api/vehicles", vehicle_routes)
        .with_state(app_state)
}
