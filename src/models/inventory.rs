// src/models/inventory.rs

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- 1. Vocabulários do Veículo ---

// "Em aberto" só faz sentido na preferência do lead, nunca num carro do estoque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VehicleType {
    #[serde(rename = "SUV")]
    Suv,
    #[serde(rename = "Sedan")]
    Sedan,
    #[serde(rename = "Hatch")]
    Hatch,
    #[serde(rename = "Picape")]
    Pickup,
    #[serde(rename = "Esportivo")]
    Sports,
    #[serde(rename = "Conversível")]
    Convertible,
    #[serde(rename = "Van")]
    Van,
    #[serde(rename = "Em aberto")]
    Open,
}

impl VehicleType {
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleType::Suv => "SUV",
            VehicleType::Sedan => "Sedan",
            VehicleType::Hatch => "Hatch",
            VehicleType::Pickup => "Picape",
            VehicleType::Sports => "Esportivo",
            VehicleType::Convertible => "Conversível",
            VehicleType::Van => "Van",
            VehicleType::Open => "Em aberto",
        }
    }
}

impl FromStr for VehicleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUV" => Ok(VehicleType::Suv),
            "Sedan" => Ok(VehicleType::Sedan),
            "Hatch" => Ok(VehicleType::Hatch),
            "Picape" => Ok(VehicleType::Pickup),
            "Esportivo" => Ok(VehicleType::Sports),
            "Conversível" => Ok(VehicleType::Convertible),
            "Van" => Ok(VehicleType::Van),
            "Em aberto" => Ok(VehicleType::Open),
            other => Err(format!("tipo de veículo desconhecido: '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transmission {
    #[serde(rename = "Manual")]
    Manual,
    #[serde(rename = "Automático")]
    Automatic,
    #[serde(rename = "Em aberto")]
    Open,
}

impl Transmission {
    pub fn as_str(self) -> &'static str {
        match self {
            Transmission::Manual => "Manual",
            Transmission::Automatic => "Automático",
            Transmission::Open => "Em aberto",
        }
    }
}

impl FromStr for Transmission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Manual" => Ok(Transmission::Manual),
            "Automático" => Ok(Transmission::Automatic),
            "Em aberto" => Ok(Transmission::Open),
            other => Err(format!("câmbio desconhecido: '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineType {
    #[serde(rename = "1.0")]
    OnePointZero,
    #[serde(rename = "1.4")]
    OnePointFour,
    #[serde(rename = "1.6")]
    OnePointSix,
    #[serde(rename = "2.0+")]
    TwoPointZeroPlus,
    #[serde(rename = "Elétrico")]
    Electric,
    #[serde(rename = "Híbrido")]
    Hybrid,
    #[serde(rename = "Em aberto")]
    Open,
}

impl EngineType {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineType::OnePointZero => "1.0",
            EngineType::OnePointFour => "1.4",
            EngineType::OnePointSix => "1.6",
            EngineType::TwoPointZeroPlus => "2.0+",
            EngineType::Electric => "Elétrico",
            EngineType::Hybrid => "Híbrido",
            EngineType::Open => "Em aberto",
        }
    }
}

impl FromStr for EngineType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.0" => Ok(EngineType::OnePointZero),
            "1.4" => Ok(EngineType::OnePointFour),
            "1.6" => Ok(EngineType::OnePointSix),
            "2.0+" => Ok(EngineType::TwoPointZeroPlus),
            "Elétrico" => Ok(EngineType::Electric),
            "Híbrido" => Ok(EngineType::Hybrid),
            "Em aberto" => Ok(EngineType::Open),
            other => Err(format!("motor desconhecido: '{}'", other)),
        }
    }
}

// --- 2. Status (mão única: available -> sold) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Available,
    Sold,
}

impl VehicleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::Sold => "sold",
        }
    }
}

impl FromStr for VehicleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(VehicleStatus::Available),
            "sold" => Ok(VehicleStatus::Sold),
            other => Err(format!("status de veículo desconhecido: '{}'", other)),
        }
    }
}

// --- 3. Dados da Venda ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetails {
    pub sale_price: Decimal,
    pub sale_date: NaiveDate, // Dia/Mês/Ano, sem fuso

    // Referência fraca: o lead pode ter sido excluído depois da venda.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_lead_id: Option<Uuid>,

    pub buyer_name: String,

    #[serde(default)]
    pub is_follow_up_sale: bool,
}

// --- 4. Veículo ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub model_year: Option<i32>,
    pub plate: Option<String>,
    pub price: Decimal,

    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    pub transmission: Transmission,
    pub engine: EngineType,

    pub mileage: i32,
    pub color: String,
    pub is_single_owner: bool,
    pub is_service_history_complete: bool,
    pub is_ipva_paid: bool,
    pub has_warranty: bool,
    pub optionals: Vec<String>,
    pub image_url: String,

    pub status: VehicleStatus,
    // Presente se e somente se status = sold
    pub sale_details: Option<SaleDetails>,

    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Available
    }

    pub fn is_sold(&self) -> bool {
        self.status == VehicleStatus::Sold
    }

    pub fn buyer_lead_id(&self) -> Option<Uuid> {
        self.sale_details.as_ref().and_then(|sale| sale.buyer_lead_id)
    }
}

// --- 5. Veículo novo (sem id, sem datas; sempre nasce disponível) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVehicle {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub model_year: Option<i32>,
    pub plate: Option<String>,
    pub price: Decimal,
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    pub transmission: Transmission,
    pub engine: EngineType,
    pub mileage: i32,
    pub color: String,
    pub is_single_owner: bool,
    pub is_service_history_complete: bool,
    pub is_ipva_paid: bool,
    pub has_warranty: bool,
    pub optionals: Vec<String>,
    pub image_url: String,
}
