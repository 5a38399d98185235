// src/handlers/inventory.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::inventory::{EngineType, NewVehicle, SaleDetails, Transmission, VehicleStatus, VehicleType},
};

// ---
// Validação Customizada
// ---
fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payload: ficha do veículo (criação e edição)
// ---
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePayload {
    #[validate(length(min = 1, message = "A marca é obrigatória."))]
    pub brand: String,

    #[validate(length(min = 1, message = "O modelo é obrigatório."))]
    pub model: String,

    #[validate(range(min = 1900, max = 2100, message = "Ano inválido."))]
    pub year: i32,

    // Ausente: igual ao ano de fabricação
    pub model_year: Option<i32>,
    pub plate: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    pub price: Decimal,

    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,

    #[serde(default = "open_transmission")]
    pub transmission: Transmission,
    #[serde(default = "open_engine")]
    pub engine: EngineType,

    #[validate(range(min = 0, message = "A quilometragem não pode ser negativa."))]
    #[serde(default)]
    pub mileage: i32,

    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub is_single_owner: bool,
    #[serde(default)]
    pub is_service_history_complete: bool,
    #[serde(default)]
    pub is_ipva_paid: bool,
    #[serde(default)]
    pub has_warranty: bool,
    #[serde(default)]
    pub optionals: Vec<String>,
    #[serde(default)]
    pub image_url: String,
}

fn open_transmission() -> Transmission {
    Transmission::Open
}

fn open_engine() -> EngineType {
    EngineType::Open
}

impl From<VehiclePayload> for NewVehicle {
    fn from(p: VehiclePayload) -> Self {
        NewVehicle {
            model_year: p.model_year.or(Some(p.year)),
            brand: p.brand,
            model: p.model,
            year: p.year,
            plate: p.plate.filter(|plate| !plate.trim().is_empty()),
            price: p.price,
            vehicle_type: p.vehicle_type,
            transmission: p.transmission,
            engine: p.engine,
            mileage: p.mileage,
            color: p.color,
            is_single_owner: p.is_single_owner,
            is_service_history_complete: p.is_service_history_complete,
            is_ipva_paid: p.is_ipva_paid,
            has_warranty: p.has_warranty,
            optionals: p.optionals,
            image_url: p.image_url,
        }
    }
}

// Edição: a ficha + um status opcional (só aceito se não mudar nada)
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehiclePayload {
    #[serde(flatten)]
    #[validate(nested)]
    pub vehicle: VehiclePayload,

    pub status: Option<VehicleStatus>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SellVehiclePayload {
    #[validate(custom(function = "validate_not_negative"))]
    pub sale_price: Decimal,

    pub sale_date: NaiveDate,

    pub buyer_lead_id: Option<Uuid>,

    #[validate(length(min = 1, message = "O nome do comprador é obrigatório."))]
    pub buyer_name: String,

    #[serde(default)]
    pub is_follow_up_sale: bool,
}

impl From<SellVehiclePayload> for SaleDetails {
    fn from(p: SellVehiclePayload) -> Self {
        SaleDetails {
            sale_price: p.sale_price,
            sale_date: p.sale_date,
            buyer_lead_id: p.buyer_lead_id,
            buyer_name: p.buyer_name,
            is_follow_up_sale: p.is_follow_up_sale,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VehicleListQuery {
    pub status: Option<String>,
}

// GET /api/vehicles?status=available
pub async fn list_vehicles(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<VehicleListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<VehicleStatus>)
        .transpose()
        .map_err(|e| AppError::InvalidParameter(e).to_api_error(&locale))?;

    let mut vehicles = app_state.crm.vehicles().await;
    if let Some(status) = status {
        vehicles.retain(|v| v.status == status);
    }

    Ok((StatusCode::OK, Json(vehicles)))
}

// POST /api/vehicles
pub async fn create_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<VehiclePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let vehicle = app_state
        .inventory_service
        .create_vehicle(&app_state.crm, payload.into())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(vehicle)))
}

// PUT /api/vehicles/{id}
pub async fn update_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(vehicle_id): Path<Uuid>,
    Json(payload): Json<UpdateVehiclePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let vehicle = app_state
        .inventory_service
        .update_vehicle(&app_state.crm, vehicle_id, payload.vehicle.into(), payload.status)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(vehicle)))
}

// DELETE /api/vehicles/{id}
pub async fn delete_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(vehicle_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .inventory_service
        .delete_vehicle(&app_state.crm, vehicle_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/vehicles/{id}/sell
pub async fn sell_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(vehicle_id): Path<Uuid>,
    Json(payload): Json<SellVehiclePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let outcome = app_state
        .inventory_service
        .sell_vehicle(&app_state.crm, vehicle_id, payload.into())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(outcome)))
}

// GET /api/vehicles/{id}/matching-leads
pub async fn matching_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(vehicle_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let leads = app_state
        .inventory_service
        .matching_leads(&app_state.crm, vehicle_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(leads)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_defaults_and_model_year_fallback() {
        let payload: VehiclePayload = serde_json::from_value(serde_json::json!({
            "brand": "Fiat",
            "model": "Strada",
            "year": 2023,
            "price": 98000.0,
            "type": "Picape",
            "plate": "  "
        }))
        .unwrap();
        assert!(payload.validate().is_ok());

        let draft: NewVehicle = payload.into();
        assert_eq!(draft.model_year, Some(2023));
        assert_eq!(draft.plate, None);
        assert_eq!(draft.transmission, Transmission::Open);
        assert_eq!(draft.vehicle_type, VehicleType::Pickup);
    }

    #[test]
    fn negative_price_is_rejected() {
        let payload: SellVehiclePayload = serde_json::from_value(serde_json::json!({
            "salePrice": -1.0,
            "saleDate": "2025-06-10",
            "buyerName": ""
        }))
        .unwrap();

        // preço e nome do comprador
        let errors = payload.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 2);
    }
}
