// src/models/crm.rs

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::funnel::{LeadPhase, LeadSource, LeadTemperature};
use crate::models::inventory::{EngineType, Transmission, VehicleType};

// --- HISTÓRICO DO FUNIL ---

/// Fase -> momento em que o lead entrou nela (a última entrada, se voltou).
/// No JSON vira `{ "Novo Lead": "2025-03-01T12:00:00Z", ... }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunnelHistory(BTreeMap<LeadPhase, DateTime<Utc>>);

impl FunnelHistory {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Histórico de um lead recém-criado.
    pub fn started_at(at: DateTime<Utc>) -> Self {
        let mut history = Self::new();
        history.record(LeadPhase::New, at);
        history
    }

    pub fn entered_at(&self, phase: LeadPhase) -> Option<DateTime<Utc>> {
        self.0.get(&phase).copied()
    }

    pub fn contains(&self, phase: LeadPhase) -> bool {
        self.0.contains_key(&phase)
    }

    pub fn contains_any(&self, phases: &[LeadPhase]) -> bool {
        phases.iter().any(|phase| self.contains(*phase))
    }

    /// Cria ou sobrescreve a chave da fase.
    pub fn record(&mut self, phase: LeadPhase, at: DateTime<Utc>) {
        self.0.insert(phase, at);
    }

    #[cfg(test)]
    pub fn phase_count(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(LeadPhase, DateTime<Utc>)> for FunnelHistory {
    fn from_iter<I: IntoIterator<Item = (LeadPhase, DateTime<Utc>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// --- PREFERÊNCIAS (objeto embutido no lead) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadPreference {
    // Pode conter "Em aberto" (qualquer tipo)
    #[serde(default)]
    pub types: BTreeSet<VehicleType>,

    // Ausente = sem limite
    #[serde(default)]
    pub min_price: Option<Decimal>,
    #[serde(default)]
    pub max_price: Option<Decimal>,

    #[serde(default)]
    pub brands: BTreeSet<String>,
    #[serde(default)]
    pub models: BTreeSet<String>,

    pub transmission: Transmission,
    pub engine: EngineType,

    #[serde(default)]
    pub additional_notes: String,
}

impl Default for LeadPreference {
    // Preferência de um lead novo: aceita qualquer coisa
    fn default() -> Self {
        Self {
            types: BTreeSet::from([VehicleType::Open]),
            min_price: None,
            max_price: None,
            brands: BTreeSet::new(),
            models: BTreeSet::new(),
            transmission: Transmission::Open,
            engine: EngineType::Open,
            additional_notes: String::new(),
        }
    }
}

impl LeadPreference {
    pub fn accepts_any_type(&self) -> bool {
        self.types.is_empty() || self.types.contains(&VehicleType::Open)
    }

    pub fn fits_price(&self, price: Decimal) -> bool {
        self.min_price.is_none_or(|min| price >= min) && self.max_price.is_none_or(|max| price <= max)
    }
}

// --- LEAD ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,

    pub name: String,
    pub phone: String,
    pub email: String,

    pub phase: LeadPhase,
    pub temperature: LeadTemperature,
    pub source: LeadSource,
    pub notes: String,
    pub preferences: LeadPreference,

    // Veículos já apresentados ao lead
    #[serde(default)]
    pub presented_vehicles: Vec<Uuid>,

    pub created_at: DateTime<Utc>,
    // Carimbado pelo servidor em todo update
    pub last_update: DateTime<Utc>,

    #[serde(default)]
    pub funnel_history: FunnelHistory,
}

impl Lead {
    pub fn is_disqualified(&self) -> bool {
        self.phase == LeadPhase::Disqualified
    }
}

// --- LEAD NOVO (sem id e sem datas; o store gera) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub phase: LeadPhase,
    pub temperature: LeadTemperature,
    pub source: LeadSource,
    pub notes: String,
    pub preferences: LeadPreference,
    pub presented_vehicles: Vec<Uuid>,
    pub funnel_history: FunnelHistory,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn history_serializes_with_phase_labels_as_keys() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let history = FunnelHistory::started_at(at);

        let json = serde_json::to_value(&history).unwrap();
        assert_eq!(json["Novo Lead"], "2025-03-01T12:00:00Z");

        let back: FunnelHistory = serde_json::from_value(json).unwrap();
        assert_eq!(back.entered_at(LeadPhase::New), Some(at));
    }

    #[test]
    fn price_band_is_unbounded_when_absent() {
        let mut pref = LeadPreference::default();
        assert!(pref.fits_price(Decimal::from(1_000_000)));

        pref.max_price = Some(Decimal::from(50_000));
        pref.min_price = Some(Decimal::from(20_000));
        assert!(pref.fits_price(Decimal::from(50_000)));
        assert!(!pref.fits_price(Decimal::from(50_001)));
        assert!(!pref.fits_price(Decimal::from(19_999)));
    }

    #[test]
    fn default_preference_accepts_any_type() {
        assert!(LeadPreference::default().accepts_any_type());
    }
}
