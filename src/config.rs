// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use chrono::FixedOffset;
use sqlx::postgres::PgPoolOptions;

use crate::{
    common::{clock::{Clock, SystemClock}, error::AppError},
    db::{InMemoryLeadStore, InMemoryVehicleStore, LeadStore, PgLeadRepository, PgVehicleRepository, VehicleStore},
    services::{state::CrmState, DashboardService, InventoryService, LeadService},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    // Sem banco: demonstração e testes
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("CRM_STORE desconhecido: '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    // Fuso da loja: todo corte de dia/mês usa este offset
    pub utc_offset: FixedOffset,
    pub bind_addr: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let store = match lookup("CRM_STORE") {
            Some(raw) => raw.parse::<StoreBackend>().map_err(|e| anyhow!(e))?,
            None => StoreBackend::Postgres,
        };

        let database_url = lookup("DATABASE_URL");
        if store == StoreBackend::Postgres && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL deve ser definida quando CRM_STORE=postgres"));
        }

        let max_connections: u32 = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().context("DB_MAX_CONNECTIONS inválido")?,
            None => 5,
        };

        let offset_minutes: i32 = match lookup("CRM_UTC_OFFSET_MINUTES") {
            Some(raw) => raw.parse().context("CRM_UTC_OFFSET_MINUTES inválido")?,
            None => -180,
        };
        let utc_offset = FixedOffset::east_opt(offset_minutes * 60)
            .ok_or_else(|| anyhow!("CRM_UTC_OFFSET_MINUTES fora do intervalo: {}", offset_minutes))?;

        Ok(Self {
            store,
            database_url,
            max_connections,
            utc_offset,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub crm: Arc<CrmState>,
    pub lead_service: LeadService,
    pub inventory_service: InventoryService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let (leads, vehicles): (Arc<dyn LeadStore>, Arc<dyn VehicleStore>) = match config.store {
            StoreBackend::Memory => {
                tracing::warn!("⚠️ CRM_STORE=memory: dados não sobrevivem ao reinício");
                (Arc::new(InMemoryLeadStore::new()), Arc::new(InMemoryVehicleStore::new()))
            }
            StoreBackend::Postgres => {
                let database_url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL deve ser definida")?;

                let db_pool = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await?;
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!().run(&db_pool).await?;
                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                (
                    Arc::new(PgLeadRepository::new(db_pool.clone())),
                    Arc::new(PgVehicleRepository::new(db_pool)),
                )
            }
        };

        Ok(Self::with_stores(leads, vehicles, Arc::new(SystemClock), config.utc_offset))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_stores(
        leads: Arc<dyn LeadStore>,
        vehicles: Arc<dyn VehicleStore>,
        clock: Arc<dyn Clock>,
        utc_offset: FixedOffset,
    ) -> Self {
        let lead_service = LeadService::new(leads, clock.clone());
        let inventory_service = InventoryService::new(vehicles, lead_service.clone(), clock.clone());
        let dashboard_service = DashboardService::new(clock, utc_offset);

        Self {
            crm: Arc::new(CrmState::new()),
            lead_service,
            inventory_service,
            dashboard_service,
        }
    }

    /// Recarrega as duas coleções do store (o `loadData` da tela).
    pub async fn sync(&self) -> Result<(usize, usize), AppError> {
        let leads = self.lead_service.reload().await?;
        let vehicles = self.inventory_service.reload().await?;
        let counts = (leads.len(), vehicles.len());

        self.crm.replace_all(leads, vehicles).await;
        tracing::info!(leads = counts.0, vehicles = counts.1, "🔄 Estado local sincronizado");
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_for_memory_store() {
        let config = AppConfig::from_lookup(lookup(&[("CRM_STORE", "memory")])).unwrap();

        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.utc_offset.local_minus_utc(), -180 * 60);
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn postgres_requires_database_url() {
        assert!(AppConfig::from_lookup(lookup(&[])).is_err());

        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/crm"),
            ("CRM_UTC_OFFSET_MINUTES", "60"),
            ("DB_MAX_CONNECTIONS", "12"),
        ]))
        .unwrap();
        assert_eq!(config.store, StoreBackend::Postgres);
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.utc_offset.local_minus_utc(), 3600);
    }

    #[test]
    fn rejects_unknown_backend_and_bad_offset() {
        assert!(AppConfig::from_lookup(lookup(&[("CRM_STORE", "redis")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("CRM_STORE", "memory"), ("CRM_UTC_OFFSET_MINUTES", "99999")])).is_err());
    }
}
