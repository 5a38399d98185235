// src/db/vehicle_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::inventory::{NewVehicle, SaleDetails, Vehicle, VehicleStatus},
};

/// O "vehicle store". `sell` marca como vendido e anexa os dados da venda.
#[async_trait]
pub trait VehicleStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Vehicle>, AppError>;
    async fn create(&self, vehicle: &NewVehicle) -> Result<Vehicle, AppError>;
    async fn update(&self, vehicle: &Vehicle) -> Result<Vehicle, AppError>;
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
    async fn sell(&self, id: Uuid, sale: &SaleDetails) -> Result<(), AppError>;
}

#[derive(Debug, FromRow)]
struct VehicleRow {
    id: Uuid,
    brand: String,
    model: String,
    year: i32,
    model_year: Option<i32>,
    plate: Option<String>,
    price: Decimal,
    #[sqlx(rename = "type")]
    vehicle_type: String,
    transmission: String,
    engine: String,
    mileage: i32,
    color: String,
    is_single_owner: bool,
    is_service_history_complete: bool,
    is_ipva_paid: bool,
    has_warranty: bool,
    optionals: Vec<String>,
    image_url: Option<String>,
    status: String,
    sale_details: Option<Json<SaleDetails>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<VehicleRow> for Vehicle {
    type Error = AppError;

    fn try_from(row: VehicleRow) -> Result<Self, Self::Error> {
        Ok(Vehicle {
            id: row.id,
            brand: row.brand,
            model: row.model,
            year: row.year,
            // Sem ano-modelo cadastrado, vale o ano de fabricação
            model_year: row.model_year.or(Some(row.year)),
            plate: row.plate,
            price: row.price,
            vehicle_type: row.vehicle_type.parse().map_err(AppError::CorruptRecord)?,
            transmission: row.transmission.parse().map_err(AppError::CorruptRecord)?,
            engine: row.engine.parse().map_err(AppError::CorruptRecord)?,
            mileage: row.mileage,
            color: row.color,
            is_single_owner: row.is_single_owner,
            is_service_history_complete: row.is_service_history_complete,
            is_ipva_paid: row.is_ipva_paid,
            has_warranty: row.has_warranty,
            optionals: row.optionals,
            image_url: row.image_url.unwrap_or_default(),
            status: row.status.parse().map_err(AppError::CorruptRecord)?,
            sale_details: row.sale_details.map(|json| json.0),
            created_at: row.created_at,
        })
    }
}

const VEHICLE_COLUMNS: &str = r#"
    id, brand, model, year, model_year, plate, price, type, transmission, engine,
    mileage, color, is_single_owner, is_service_history_complete, is_ipva_paid,
    has_warranty, optionals, image_url, status, sale_details, created_at
"#;

#[derive(Clone)]
pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleStore for PgVehicleRepository {
    async fn list(&self) -> Result<Vec<Vehicle>, AppError> {
        let rows = sqlx::query_as::<_, VehicleRow>(&format!(
            "SELECT {} FROM vehicles ORDER BY created_at DESC",
            VEHICLE_COLUMNS
        ))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Vehicle::try_from).collect()
    }

    async fn create(&self, vehicle: &NewVehicle) -> Result<Vehicle, AppError> {
        let row = sqlx::query_as::<_, VehicleRow>(&format!(
            r#"
            INSERT INTO vehicles (
                brand, model, year, model_year, plate, price, type, transmission, engine,
                mileage, color, is_single_owner, is_service_history_complete, is_ipva_paid,
                has_warranty, optionals, image_url, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING {}
            "#,
            VEHICLE_COLUMNS
        ))
            .bind(&vehicle.brand)
            .bind(&vehicle.model)
            .bind(vehicle.year)
            .bind(vehicle.model_year)
            .bind(&vehicle.plate)
            .bind(vehicle.price)
            .bind(vehicle.vehicle_type.as_str())
            .bind(vehicle.transmission.as_str())
            .bind(vehicle.engine.as_str())
            .bind(vehicle.mileage)
            .bind(&vehicle.color)
            .bind(vehicle.is_single_owner)
            .bind(vehicle.is_service_history_complete)
            .bind(vehicle.is_ipva_paid)
            .bind(vehicle.has_warranty)
            .bind(&vehicle.optionals)
            .bind(&vehicle.image_url)
            .bind(VehicleStatus::Available.as_str())
            .fetch_one(&self.pool)
            .await?;

        Vehicle::try_from(row)
    }

    async fn update(&self, vehicle: &Vehicle) -> Result<Vehicle, AppError> {
        let row = sqlx::query_as::<_, VehicleRow>(&format!(
            r#"
            UPDATE vehicles SET
                brand = $2, model = $3, year = $4, model_year = $5, plate = $6, price = $7,
                type = $8, transmission = $9, engine = $10, mileage = $11, color = $12,
                is_single_owner = $13, is_service_history_complete = $14, is_ipva_paid = $15,
                has_warranty = $16, optionals = $17, image_url = $18,
                status = $19, sale_details = $20
            WHERE id = $1
            RETURNING {}
            "#,
            VEHICLE_COLUMNS
        ))
            .bind(vehicle.id)
            .bind(&vehicle.brand)
            .bind(&vehicle.model)
            .bind(vehicle.year)
            .bind(vehicle.model_year)
            .bind(&vehicle.plate)
            .bind(vehicle.price)
            .bind(vehicle.vehicle_type.as_str())
            .bind(vehicle.transmission.as_str())
            .bind(vehicle.engine.as_str())
            .bind(vehicle.mileage)
            .bind(&vehicle.color)
            .bind(vehicle.is_single_owner)
            .bind(vehicle.is_service_history_complete)
            .bind(vehicle.is_ipva_paid)
            .bind(vehicle.has_warranty)
            .bind(&vehicle.optionals)
            .bind(&vehicle.image_url)
            .bind(vehicle.status.as_str())
            .bind(vehicle.sale_details.as_ref().map(Json))
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::VehicleNotFound(vehicle.id))?;

        Vehicle::try_from(row)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::VehicleNotFound(id));
        }
        Ok(())
    }

    async fn sell(&self, id: Uuid, sale: &SaleDetails) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET status = $2, sale_details = $3
            WHERE id = $1
            "#,
        )
            .bind(id)
            .bind(VehicleStatus::Sold.as_str())
            .bind(Json(sale))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::VehicleNotFound(id));
        }
        Ok(())
    }
}
