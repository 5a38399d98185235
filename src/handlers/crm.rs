// src/handlers/crm.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::{Validate, ValidateEmail, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::crm::{FunnelHistory, Lead, LeadPreference, NewLead},
    models::funnel::{FunnelMenu, LeadPhase, LeadSource, LeadTemperature},
    services::crm_service,
};

// ---
// Validações customizadas
// ---
fn validate_price_band(pref: &LeadPreference) -> Result<(), ValidationError> {
    let negative = [pref.min_price, pref.max_price].into_iter().flatten().any(|p| p.is_sign_negative());
    if negative {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    if let (Some(min), Some(max)) = (pref.min_price, pref.max_price) {
        if min > max {
            let mut err = ValidationError::new("price_band");
            err.message = Some("O preço mínimo não pode ser maior que o máximo.".into());
            return Err(err);
        }
    }
    Ok(())
}

// E-mail é opcional no formulário; vazio passa
fn validate_optional_email(email: &str) -> Result<(), ValidationError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Ok(());
    }
    if trimmed.to_owned().validate_email() {
        return Ok(());
    }
    let mut err = ValidationError::new("email");
    err.message = Some("E-mail inválido.".into());
    Err(err)
}

// =============================================================================
//  ÁREA 1: LEADS
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LeadPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    #[serde(default)]
    pub phone: String,

    #[validate(custom(function = "validate_optional_email"))]
    #[serde(default)]
    pub email: String,

    // Ausente: Novo Lead na criação, fase atual na edição
    pub phase: Option<LeadPhase>,

    pub temperature: Option<LeadTemperature>,

    // Texto livre da tela; origem desconhecida é guardada como veio
    pub source: Option<String>,

    #[serde(default)]
    pub notes: String,

    #[validate(custom(function = "validate_price_band"))]
    #[serde(default)]
    pub preferences: LeadPreference,

    #[serde(default)]
    pub presented_vehicles: Vec<Uuid>,
}

impl LeadPayload {
    fn into_new_lead(self) -> NewLead {
        NewLead {
            name: self.name,
            phone: self.phone,
            email: self.email,
            phase: self.phase.unwrap_or(LeadPhase::New),
            temperature: self.temperature.unwrap_or(LeadTemperature::Warm),
            source: self.source.as_deref().map_or(LeadSource::Other, LeadSource::parse_lenient),
            notes: self.notes,
            preferences: self.preferences,
            presented_vehicles: self.presented_vehicles,
            funnel_history: FunnelHistory::new(),
        }
    }

    // Registro completo: o que não veio no payload fica como está
    fn into_candidate(self, current: Lead) -> Lead {
        Lead {
            name: self.name,
            phone: self.phone,
            email: self.email,
            phase: self.phase.unwrap_or(current.phase),
            temperature: self.temperature.unwrap_or(current.temperature),
            source: self.source.as_deref().map_or(current.source, LeadSource::parse_lenient),
            notes: self.notes,
            preferences: self.preferences,
            presented_vehicles: self.presented_vehicles,
            ..current
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveLeadPayload {
    pub phase: LeadPhase,
}

// GET /api/leads
pub async fn list_leads(State(app_state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(app_state.crm.leads().await))
}

// POST /api/leads
pub async fn create_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<LeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let lead = app_state
        .lead_service
        .create_lead(&app_state.crm, payload.into_new_lead())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(lead)))
}

// PUT /api/leads/{id}
pub async fn update_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(lead_id): Path<Uuid>,
    Json(payload): Json<LeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let current = app_state
        .crm
        .find_lead(lead_id)
        .await
        .ok_or_else(|| AppError::LeadNotFound(lead_id).to_api_error(&locale))?;

    let lead = app_state
        .lead_service
        .update_lead(&app_state.crm, payload.into_candidate(current))
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(lead)))
}

// PATCH /api/leads/{id}/phase
pub async fn move_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(lead_id): Path<Uuid>,
    Json(payload): Json<MoveLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let lead = app_state
        .lead_service
        .move_lead(&app_state.crm, lead_id, payload.phase)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(lead)))
}

// DELETE /api/leads/{id}
pub async fn delete_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(lead_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .lead_service
        .delete_lead(&app_state.crm, lead_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/leads/{id}/matching-vehicles
pub async fn matching_vehicles(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(lead_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let lead = app_state
        .crm
        .find_lead(lead_id)
        .await
        .ok_or_else(|| AppError::LeadNotFound(lead_id).to_api_error(&locale))?;

    let vehicles = app_state.crm.vehicles().await;
    let matches: Vec<_> = crm_service::matching_vehicles(&lead, &vehicles).into_iter().cloned().collect();

    Ok((StatusCode::OK, Json(matches)))
}

// GET /api/leads/{id}/purchases
pub async fn purchases(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(lead_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if app_state.crm.find_lead(lead_id).await.is_none() {
        return Err(AppError::LeadNotFound(lead_id).to_api_error(&locale));
    }

    let vehicles = app_state.crm.vehicles().await;
    let bought: Vec<_> = crm_service::purchased_vehicles(lead_id, &vehicles).into_iter().cloned().collect();

    Ok((StatusCode::OK, Json(bought)))
}

// =============================================================================
//  ÁREA 2: SINCRONIZAÇÃO E QUADRO DO FUNIL
// =============================================================================

// POST /api/sync
pub async fn sync_state(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let (leads, vehicles) = app_state
        .sync()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(json!({ "leads": leads, "vehicles": vehicles }))))
}

// GET /api/funnel/{menu}
pub async fn funnel_board(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(menu): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let menu: FunnelMenu = menu
        .parse()
        .map_err(|e: String| AppError::InvalidParameter(e).to_api_error(&locale))?;

    let board = app_state.lead_service.board(&app_state.crm, menu).await;
    Ok((StatusCode::OK, Json(board)))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn payload(json: serde_json::Value) -> LeadPayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn minimal_payload_gets_form_defaults() {
        let draft = payload(serde_json::json!({ "name": "Ana", "source": "Instagram" })).into_new_lead();

        assert_eq!(draft.phase, LeadPhase::New);
        assert_eq!(draft.temperature, LeadTemperature::Warm);
        assert_eq!(draft.source, LeadSource::Custom("Instagram".into()));
        assert!(draft.preferences.accepts_any_type());
    }

    #[test]
    fn inverted_price_band_and_bad_email_fail_validation() {
        let mut p = payload(serde_json::json!({ "name": "Ana", "email": "ana-sem-arroba" }));
        p.preferences.min_price = Some(Decimal::from(90_000));
        p.preferences.max_price = Some(Decimal::from(50_000));

        let errors = p.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("preferences"));
    }

    #[test]
    fn email_goes_through_validator_rules() {
        for bad in ["a b@c.d", "ana@@x.com", "ana@.com", "ana@x.", "@x.com"] {
            assert!(validate_optional_email(bad).is_err(), "{bad} deveria falhar");
        }
        for ok in ["", "   ", "ana@loja.com.br", " marcos.silva@gmail.com "] {
            assert!(validate_optional_email(ok).is_ok(), "{ok} deveria passar");
        }
    }

    #[test]
    fn candidate_keeps_identity_and_history_of_current() {
        let current = crate::services::state::fixtures::lead("Ana", LeadPhase::Visit, chrono::Utc::now());
        let candidate = payload(serde_json::json!({ "name": "Ana Souza" })).into_candidate(current.clone());

        assert_eq!(candidate.id, current.id);
        assert_eq!(candidate.phase, LeadPhase::Visit);
        assert_eq!(candidate.created_at, current.created_at);
        assert_eq!(candidate.funnel_history, current.funnel_history);
        assert_eq!(candidate.name, "Ana Souza");
    }
}
