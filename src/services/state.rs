// src/services/state.rs

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::crm::Lead;
use crate::models::inventory::{SaleDetails, Vehicle, VehicleStatus};

// =========================================================================
//  MUTAÇÕES DE LEAD (pendente -> confirmada | revertida)
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
    /// Aplicada antes da resposta do store
    Pending,
    /// Substituída pelo registro devolvido pelo store
    Confirmed,
    /// Store falhou; volta a versão anterior
    Reverted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeadMutation {
    pub phase: MutationPhase,
    pub lead: Lead,
}

impl LeadMutation {
    pub fn pending(lead: Lead) -> Self {
        Self { phase: MutationPhase::Pending, lead }
    }

    pub fn confirmed(lead: Lead) -> Self {
        Self { phase: MutationPhase::Confirmed, lead }
    }

    pub fn reverted(lead: Lead) -> Self {
        Self { phase: MutationPhase::Reverted, lead }
    }
}

/// Redutor puro: as três fases fazem a mesma coisa na lista (troca pelo id),
/// o que muda é a origem do registro. Id ausente = lista intacta.
pub fn reduce_leads(leads: &mut [Lead], mutation: &LeadMutation) -> bool {
    match leads.iter_mut().find(|lead| lead.id == mutation.lead.id) {
        Some(slot) => {
            *slot = mutation.lead.clone();
            true
        }
        None => false,
    }
}

// =========================================================================
//  ESTADO LOCAL DA SESSÃO
// =========================================================================

/// As duas coleções que a tela enxerga. Um único usuário escreve;
/// os locks só protegem a memória, não coordenam edições concorrentes.
#[derive(Debug, Default)]
pub struct CrmState {
    leads: RwLock<Vec<Lead>>,
    vehicles: RwLock<Vec<Vehicle>>,
}

impl CrmState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn replace_all(&self, leads: Vec<Lead>, vehicles: Vec<Vehicle>) {
        *self.leads.write().await = leads;
        *self.vehicles.write().await = vehicles;
    }

    // --- Leads ---

    pub async fn leads(&self) -> Vec<Lead> {
        self.leads.read().await.clone()
    }

    pub async fn find_lead(&self, id: Uuid) -> Option<Lead> {
        self.leads.read().await.iter().find(|lead| lead.id == id).cloned()
    }

    pub async fn apply(&self, mutation: &LeadMutation) -> bool {
        let applied = reduce_leads(&mut self.leads.write().await, mutation);
        tracing::debug!(lead_id = %mutation.lead.id, phase = ?mutation.phase, applied, "mutação de lead aplicada");
        applied
    }

    pub async fn prepend_lead(&self, lead: Lead) {
        self.leads.write().await.insert(0, lead);
    }

    pub async fn remove_lead(&self, id: Uuid) {
        self.leads.write().await.retain(|lead| lead.id != id);
    }

    // --- Veículos ---

    pub async fn vehicles(&self) -> Vec<Vehicle> {
        self.vehicles.read().await.clone()
    }

    pub async fn find_vehicle(&self, id: Uuid) -> Option<Vehicle> {
        self.vehicles.read().await.iter().find(|v| v.id == id).cloned()
    }

    pub async fn prepend_vehicle(&self, vehicle: Vehicle) {
        self.vehicles.write().await.insert(0, vehicle);
    }

    pub async fn replace_vehicle(&self, vehicle: Vehicle) {
        if let Some(slot) = self.vehicles.write().await.iter_mut().find(|v| v.id == vehicle.id) {
            *slot = vehicle;
        }
    }

    pub async fn remove_vehicle(&self, id: Uuid) {
        self.vehicles.write().await.retain(|v| v.id != id);
    }

    /// Reflete localmente uma venda já gravada no store.
    pub async fn mark_sold(&self, id: Uuid, sale: SaleDetails) -> Option<Vehicle> {
        let mut vehicles = self.vehicles.write().await;
        let vehicle = vehicles.iter_mut().find(|v| v.id == id)?;
        vehicle.status = VehicleStatus::Sold;
        vehicle.sale_details = Some(sale);
        Some(vehicle.clone())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use crate::models::crm::{FunnelHistory, Lead, LeadPreference};
    use crate::models::funnel::{LeadPhase, LeadSource, LeadTemperature};
    use crate::models::inventory::{EngineType, Transmission, Vehicle, VehicleStatus, VehicleType};

    pub fn lead(name: &str, phase: LeadPhase, created_at: DateTime<Utc>) -> Lead {
        Lead {
            id: Uuid::new_v4(),
            name: name.to_string(),
            phone: "11999990000".to_string(),
            email: String::new(),
            phase,
            temperature: LeadTemperature::Warm,
            source: LeadSource::WhatsApp,
            notes: String::new(),
            preferences: LeadPreference::default(),
            presented_vehicles: Vec::new(),
            created_at,
            last_update: created_at,
            funnel_history: FunnelHistory::started_at(created_at),
        }
    }

    pub fn vehicle(vehicle_type: VehicleType, price: i64) -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            brand: "Toyota".to_string(),
            model: "Corolla".to_string(),
            year: 2021,
            model_year: Some(2022),
            plate: None,
            price: Decimal::from(price),
            vehicle_type,
            transmission: Transmission::Automatic,
            engine: EngineType::TwoPointZeroPlus,
            mileage: 30_000,
            color: "Prata".to_string(),
            is_single_owner: true,
            is_service_history_complete: true,
            is_ipva_paid: true,
            has_warranty: false,
            optionals: Vec::new(),
            image_url: String::new(),
            status: VehicleStatus::Available,
            sale_details: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures;
    use super::*;
    use crate::models::funnel::LeadPhase;
    use chrono::Utc;

    #[test]
    fn reducer_replaces_only_the_matching_lead() {
        let a = fixtures::lead("Ana", LeadPhase::New, Utc::now());
        let b = fixtures::lead("Bruno", LeadPhase::New, Utc::now());
        let mut leads = vec![a.clone(), b.clone()];

        let pending = Lead { phase: LeadPhase::Visit, ..a.clone() };
        assert!(reduce_leads(&mut leads, &LeadMutation::pending(pending.clone())));
        assert_eq!(leads[0], pending);
        assert_eq!(leads[1], b);

        assert!(reduce_leads(&mut leads, &LeadMutation::reverted(a.clone())));
        assert_eq!(leads[0], a);
    }

    #[test]
    fn reducer_ignores_unknown_ids() {
        let a = fixtures::lead("Ana", LeadPhase::New, Utc::now());
        let stranger = fixtures::lead("Carla", LeadPhase::New, Utc::now());
        let mut leads = vec![a.clone()];

        assert!(!reduce_leads(&mut leads, &LeadMutation::confirmed(stranger)));
        assert_eq!(leads, vec![a]);
    }

    #[tokio::test]
    async fn mark_sold_attaches_sale_details() {
        let state = CrmState::new();
        let car = fixtures::vehicle(crate::models::inventory::VehicleType::Sedan, 50_000);
        state.replace_all(Vec::new(), vec![car.clone()]).await;

        let sale = SaleDetails {
            sale_price: rust_decimal::Decimal::from(45_000),
            sale_date: Utc::now().date_naive(),
            buyer_lead_id: None,
            buyer_name: "Ana".into(),
            is_follow_up_sale: false,
        };
        let sold = state.mark_sold(car.id, sale.clone()).await.unwrap();

        assert_eq!(sold.status, VehicleStatus::Sold);
        assert_eq!(sold.sale_details, Some(sale));
        assert!(state.mark_sold(uuid::Uuid::new_v4(), sold.sale_details.clone().unwrap()).await.is_none());
    }
}
