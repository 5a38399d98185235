// src/db/lead_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::crm::{FunnelHistory, Lead, LeadPreference, NewLead},
    models::funnel::{LeadPhase, LeadSource, LeadTemperature},
};

/// O "lead store": a única porta para persistir leads.
/// Qualquer falha (rede, validação, banco) sai como `AppError`; os motores
/// não interpretam o subtipo, só "falhou".
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Lead>, AppError>;
    async fn create(&self, lead: &NewLead) -> Result<Lead, AppError>;
    /// Persiste o lead completo; o servidor carimba `last_update`.
    async fn update(&self, lead: &Lead) -> Result<Lead, AppError>;
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

// =========================================================================
//  LINHA DO BANCO
// =========================================================================

#[derive(Debug, FromRow)]
struct LeadRow {
    id: Uuid,
    name: String,
    phone: Option<String>,
    email: Option<String>,
    phase: String,
    temperature: String,
    preferences: Option<Json<LeadPreference>>,
    presented_vehicles: Vec<Uuid>,
    source: Option<String>,
    notes: Option<String>,
    funnel_history: Json<FunnelHistory>,
    created_at: DateTime<Utc>,
    last_update: DateTime<Utc>,
}

impl TryFrom<LeadRow> for Lead {
    type Error = AppError;

    fn try_from(row: LeadRow) -> Result<Self, Self::Error> {
        let phase: LeadPhase = row.phase.parse().map_err(AppError::CorruptRecord)?;
        let temperature: LeadTemperature = row.temperature.parse().map_err(AppError::CorruptRecord)?;

        Ok(Lead {
            id: row.id,
            name: row.name,
            phone: row.phone.unwrap_or_default(),
            email: row.email.unwrap_or_default(),
            phase,
            temperature,
            source: LeadSource::parse_lenient(row.source.as_deref().unwrap_or_default()),
            notes: row.notes.unwrap_or_default(),
            preferences: row.preferences.map(|json| json.0).unwrap_or_default(),
            presented_vehicles: row.presented_vehicles,
            created_at: row.created_at,
            last_update: row.last_update,
            funnel_history: row.funnel_history.0,
        })
    }
}

const LEAD_COLUMNS: &str = r#"
    id, name, phone, email, phase, temperature, preferences,
    presented_vehicles, source, notes, funnel_history, created_at, last_update
"#;

// =========================================================================
//  POSTGRES
// =========================================================================

#[derive(Clone)]
pub struct PgLeadRepository {
    pool: PgPool,
}

impl PgLeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadStore for PgLeadRepository {
    async fn list(&self) -> Result<Vec<Lead>, AppError> {
        let rows = sqlx::query_as::<_, LeadRow>(&format!(
            "SELECT {} FROM leads ORDER BY last_update DESC",
            LEAD_COLUMNS
        ))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Lead::try_from).collect()
    }

    async fn create(&self, lead: &NewLead) -> Result<Lead, AppError> {
        let row = sqlx::query_as::<_, LeadRow>(&format!(
            r#"
            INSERT INTO leads (
                name, phone, email, phase, temperature, preferences,
                presented_vehicles, source, notes, funnel_history
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            LEAD_COLUMNS
        ))
            .bind(&lead.name)
            .bind(&lead.phone)
            .bind(&lead.email)
            .bind(lead.phase.as_str())
            .bind(lead.temperature.as_str())
            .bind(Json(&lead.preferences))
            .bind(&lead.presented_vehicles)
            .bind(lead.source.as_str())
            .bind(&lead.notes)
            .bind(Json(&lead.funnel_history))
            .fetch_one(&self.pool)
            .await?;

        Lead::try_from(row)
    }

    async fn update(&self, lead: &Lead) -> Result<Lead, AppError> {
        let row = sqlx::query_as::<_, LeadRow>(&format!(
            r#"
            UPDATE leads SET
                name = $2, phone = $3, email = $4, phase = $5, temperature = $6,
                preferences = $7, presented_vehicles = $8, source = $9, notes = $10,
                funnel_history = $11,
                last_update = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            LEAD_COLUMNS
        ))
            .bind(lead.id)
            .bind(&lead.name)
            .bind(&lead.phone)
            .bind(&lead.email)
            .bind(lead.phase.as_str())
            .bind(lead.temperature.as_str())
            .bind(Json(&lead.preferences))
            .bind(&lead.presented_vehicles)
            .bind(lead.source.as_str())
            .bind(&lead.notes)
            .bind(Json(&lead.funnel_history))
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::LeadNotFound(lead.id))?;

        Lead::try_from(row)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::LeadNotFound(id));
        }
        Ok(())
    }
}
