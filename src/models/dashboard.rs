// src/models/dashboard.rs

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

use crate::models::funnel::LeadPhase;
use crate::models::inventory::VehicleType;

// --- Filtro de período do Dashboard ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowMode {
    All,
    Today,
    Yesterday,
    #[serde(rename = "last-7-days")]
    Last7Days,
    #[default]
    ThisMonth,
    LastMonth,
    Custom,
}

impl FromStr for WindowMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(WindowMode::All),
            "today" => Ok(WindowMode::Today),
            "yesterday" => Ok(WindowMode::Yesterday),
            "last-7-days" => Ok(WindowMode::Last7Days),
            "this-month" => Ok(WindowMode::ThisMonth),
            "last-month" => Ok(WindowMode::LastMonth),
            "custom" => Ok(WindowMode::Custom),
            other => Err(format!("filtro de período desconhecido: '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSelector {
    pub mode: WindowMode,
    // Só usados no modo custom; faltando um deles, o filtro aceita tudo
    pub custom_start: Option<NaiveDate>,
    pub custom_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Month,
}

// 1. Cards do topo
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadStats {
    pub received: usize,
    pub disqualified: usize,
    pub qualified: usize,
    pub sales_made: usize,
}

// 2. Funil (sempre sobre a coleção inteira)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelStage {
    pub name: &'static str,
    pub phase: LeadPhase,
    pub value: usize,
}

// 3. Estoque (apenas disponíveis)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMetrics {
    pub available_count: usize,
    pub total_value: Decimal,
    pub average_ticket: Decimal,
    #[serde(serialize_with = "category_or_na")]
    pub top_category: Option<VehicleType>,
}

fn category_or_na<S: Serializer>(value: &Option<VehicleType>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.map_or("N/A", VehicleType::as_str))
}

// 4. Gráfico de crescimento
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSummary {
    pub mode: WindowMode,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub granularity: Granularity,
}

// Tudo que a tela do Dashboard precisa, num pacote só
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub window: WindowSummary,
    pub stats: LeadStats,
    pub funnel: Vec<FunnelStage>,
    pub stock: StockMetrics,
    pub trend: Vec<TrendPoint>,
    pub growth_percentage: i64,
}
