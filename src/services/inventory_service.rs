// src/services/inventory_service.rs

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    common::{clock::Clock, error::AppError},
    db::VehicleStore,
    models::crm::Lead,
    models::funnel::LeadPhase,
    models::inventory::{NewVehicle, SaleDetails, Vehicle, VehicleStatus},
    services::crm_service::LeadService,
    services::state::{CrmState, LeadMutation},
};

/// O que aconteceu com o lead comprador depois da venda.
/// Nenhum dos casos desfaz a venda.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum LeadLink {
    NotLinked,
    Completed { lead: Lead },
    // Id pendurado: lead excluído ou lista local desatualizada
    Missing { lead_id: Uuid },
    Failed { lead_id: Uuid },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleOutcome {
    pub vehicle: Vehicle,
    pub lead_link: LeadLink,
}

#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn VehicleStore>,
    leads: LeadService,
    clock: Arc<dyn Clock>,
}

impl InventoryService {
    pub fn new(store: Arc<dyn VehicleStore>, leads: LeadService, clock: Arc<dyn Clock>) -> Self {
        Self { store, leads, clock }
    }

    pub async fn reload(&self) -> Result<Vec<Vehicle>, AppError> {
        self.store.list().await
    }

    // =========================================================================
    //  1. CADASTRO (sem passo otimista: store primeiro, depois memória)
    // =========================================================================

    pub async fn create_vehicle(&self, state: &CrmState, draft: NewVehicle) -> Result<Vehicle, AppError> {
        let created = self
            .store
            .create(&draft)
            .await
            .map_err(|e| AppError::persistence("veículo", &e))?;

        state.prepend_vehicle(created.clone()).await;
        tracing::info!(vehicle_id = %created.id, "✅ Veículo cadastrado: {} {}", created.brand, created.model);
        Ok(created)
    }

    /// Edição de ficha. Status e dados da venda ficam como estão; pedir
    /// outro status aqui é recusado (só a venda muda o status).
    pub async fn update_vehicle(
        &self,
        state: &CrmState,
        id: Uuid,
        fields: NewVehicle,
        requested_status: Option<VehicleStatus>,
    ) -> Result<Vehicle, AppError> {
        let current = state.find_vehicle(id).await.ok_or(AppError::VehicleNotFound(id))?;
        if requested_status.is_some_and(|status| status != current.status) {
            return Err(AppError::VehicleStatusLocked(id));
        }

        let candidate = Vehicle {
            id,
            brand: fields.brand,
            model: fields.model,
            year: fields.year,
            model_year: fields.model_year,
            plate: fields.plate,
            price: fields.price,
            vehicle_type: fields.vehicle_type,
            transmission: fields.transmission,
            engine: fields.engine,
            mileage: fields.mileage,
            color: fields.color,
            is_single_owner: fields.is_single_owner,
            is_service_history_complete: fields.is_service_history_complete,
            is_ipva_paid: fields.is_ipva_paid,
            has_warranty: fields.has_warranty,
            optionals: fields.optionals,
            image_url: fields.image_url,
            status: current.status,
            sale_details: current.sale_details,
            created_at: current.created_at,
        };

        let saved = self
            .store
            .update(&candidate)
            .await
            .map_err(|e| AppError::persistence("veículo", &e))?;

        state.replace_vehicle(saved.clone()).await;
        Ok(saved)
    }

    pub async fn delete_vehicle(&self, state: &CrmState, id: Uuid) -> Result<(), AppError> {
        if state.find_vehicle(id).await.is_none() {
            return Err(AppError::VehicleNotFound(id));
        }

        self.store
            .delete(id)
            .await
            .map_err(|e| AppError::persistence("veículo", &e))?;

        state.remove_vehicle(id).await;
        tracing::info!(vehicle_id = %id, "Veículo removido");
        Ok(())
    }

    // =========================================================================
    //  2. VENDA
    // =========================================================================

    /// Marca o veículo como vendido e, se houver comprador vinculado, leva o
    /// lead para Concluído.
    ///
    /// A venda do veículo é independente do lado do lead: lead sumido ou
    /// falha ao gravá-lo só aparecem em `lead_link` e no log.
    pub async fn sell_vehicle(&self, state: &CrmState, id: Uuid, sale: SaleDetails) -> Result<SaleOutcome, AppError> {
        let vehicle = state.find_vehicle(id).await.ok_or(AppError::VehicleNotFound(id))?;
        if vehicle.is_sold() {
            return Err(AppError::VehicleAlreadySold(id));
        }

        let sale = resolve_buyer(&state.leads().await, sale);

        // (a) Store
        if let Err(e) = self.store.sell(id, &sale).await {
            tracing::error!(vehicle_id = %id, "🔥 Falha ao registrar venda: {}", e);
            return Err(AppError::persistence("veículo", &e));
        }

        // (b) Memória
        let sold = match state.mark_sold(id, sale.clone()).await {
            Some(sold) => sold,
            // Removido da lista no meio do caminho; a venda já está gravada
            None => Vehicle { status: VehicleStatus::Sold, sale_details: Some(sale.clone()), ..vehicle },
        };
        tracing::info!(vehicle_id = %id, price = %sale.sale_price, "💰 Venda registrada");

        // (c) Lead comprador
        let lead_link = match sale.buyer_lead_id {
            None => LeadLink::NotLinked,
            Some(lead_id) => self.complete_buyer(state, lead_id).await,
        };

        Ok(SaleOutcome { vehicle: sold, lead_link })
    }

    async fn complete_buyer(&self, state: &CrmState, lead_id: Uuid) -> LeadLink {
        let Some(lead) = state.find_lead(lead_id).await else {
            tracing::warn!(%lead_id, "Lead comprador não encontrado; venda mantida sem atualizar o lead");
            return LeadLink::Missing { lead_id };
        };

        let now = self.clock.now();
        let mut funnel_history = lead.funnel_history.clone();
        funnel_history.record(LeadPhase::Completed, now);
        let candidate = Lead { phase: LeadPhase::Completed, last_update: now, funnel_history, ..lead };

        // Direto no store: esta rotina já cuida da lista local
        match self.leads.persist(&candidate).await {
            Ok(saved) => {
                state.apply(&LeadMutation::confirmed(saved.clone())).await;
                LeadLink::Completed { lead: saved }
            }
            Err(e) => {
                tracing::error!(%lead_id, "Falha ao concluir lead após venda: {}", e);
                LeadLink::Failed { lead_id }
            }
        }
    }

    // =========================================================================
    //  3. LEITURAS
    // =========================================================================

    pub async fn matching_leads(&self, state: &CrmState, id: Uuid) -> Result<Vec<Lead>, AppError> {
        let vehicle = state.find_vehicle(id).await.ok_or(AppError::VehicleNotFound(id))?;
        let leads = state.leads().await;
        Ok(interested_leads(&vehicle, &leads).into_iter().cloned().collect())
    }
}

// --- Funções puras ---

/// Sem `buyerLeadId`, tenta achar o lead pelo nome exato do comprador.
pub fn resolve_buyer(leads: &[Lead], mut sale: SaleDetails) -> SaleDetails {
    if sale.buyer_lead_id.is_none() {
        sale.buyer_lead_id = leads.iter().find(|lead| lead.name == sale.buyer_name).map(|lead| lead.id);
    }
    sale
}

/// Leads em aberto que combinam com o veículo: tipo desejado ou marca
/// preferida contida na marca do carro, e dentro do teto de preço.
pub fn interested_leads<'a>(vehicle: &Vehicle, leads: &'a [Lead]) -> Vec<&'a Lead> {
    let brand = vehicle.brand.to_lowercase();

    leads
        .iter()
        .filter(|lead| !matches!(lead.phase, LeadPhase::Lost | LeadPhase::Completed))
        .filter(|lead| {
            let pref = &lead.preferences;
            pref.types.contains(&vehicle.vehicle_type)
                || pref
                    .brands
                    .iter()
                    .map(|b| b.trim().to_lowercase())
                    .any(|b| !b.is_empty() && brand.contains(&b))
        })
        .filter(|lead| lead.preferences.max_price.is_none_or(|max| vehicle.price <= max))
        .collect()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::*;
    use crate::common::clock::FixedClock;
    use crate::db::{InMemoryLeadStore, InMemoryVehicleStore, LeadStore};
    use crate::models::crm::NewLead;
    use crate::models::inventory::VehicleType;
    use crate::services::state::fixtures;

    struct BrokenLeadStore;

    #[async_trait]
    impl LeadStore for BrokenLeadStore {
        async fn list(&self) -> Result<Vec<Lead>, AppError> {
            Ok(Vec::new())
        }
        async fn create(&self, _lead: &NewLead) -> Result<Lead, AppError> {
            Err(AppError::InternalServerError(anyhow::anyhow!("offline")))
        }
        async fn update(&self, _lead: &Lead) -> Result<Lead, AppError> {
            Err(AppError::InternalServerError(anyhow::anyhow!("offline")))
        }
        async fn delete(&self, _id: Uuid) -> Result<(), AppError> {
            Err(AppError::InternalServerError(anyhow::anyhow!("offline")))
        }
    }

    struct BrokenVehicleStore;

    #[async_trait]
    impl VehicleStore for BrokenVehicleStore {
        async fn list(&self) -> Result<Vec<Vehicle>, AppError> {
            Ok(Vec::new())
        }
        async fn create(&self, _vehicle: &NewVehicle) -> Result<Vehicle, AppError> {
            Err(AppError::InternalServerError(anyhow::anyhow!("offline")))
        }
        async fn update(&self, _vehicle: &Vehicle) -> Result<Vehicle, AppError> {
            Err(AppError::InternalServerError(anyhow::anyhow!("offline")))
        }
        async fn delete(&self, _id: Uuid) -> Result<(), AppError> {
            Err(AppError::InternalServerError(anyhow::anyhow!("offline")))
        }
        async fn sell(&self, _id: Uuid, _sale: &SaleDetails) -> Result<(), AppError> {
            Err(AppError::InternalServerError(anyhow::anyhow!("offline")))
        }
    }

    fn sale_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 15, 30, 0).unwrap()
    }

    fn sale_to(buyer: Option<Uuid>, name: &str) -> SaleDetails {
        SaleDetails {
            sale_price: Decimal::from(45_000),
            sale_date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            buyer_lead_id: buyer,
            buyer_name: name.to_string(),
            is_follow_up_sale: false,
        }
    }

    fn service(vehicles: Arc<dyn VehicleStore>, leads: Arc<dyn LeadStore>) -> InventoryService {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(sale_time()));
        InventoryService::new(vehicles, LeadService::new(leads, clock.clone()), clock)
    }

    async fn state_with(leads: Vec<Lead>, vehicles: Vec<Vehicle>) -> CrmState {
        let state = CrmState::new();
        state.replace_all(leads, vehicles).await;
        state
    }

    #[tokio::test]
    async fn sale_completes_the_linked_lead() {
        let lead = fixtures::lead("Marcos", LeadPhase::Visit, sale_time() - chrono::Duration::days(20));
        let car = fixtures::vehicle(VehicleType::Sedan, 50_000);
        let state = state_with(vec![lead.clone()], vec![car.clone()]).await;
        let svc = service(
            Arc::new(InMemoryVehicleStore::with_vehicles([car.clone()])),
            Arc::new(InMemoryLeadStore::with_leads([lead.clone()])),
        );

        let outcome = svc.sell_vehicle(&state, car.id, sale_to(Some(lead.id), "Marcos")).await.unwrap();

        assert_eq!(outcome.vehicle.status, VehicleStatus::Sold);
        assert_eq!(outcome.vehicle.sale_details.as_ref().map(|s| s.sale_price), Some(Decimal::from(45_000)));

        let LeadLink::Completed { lead: closed } = outcome.lead_link else {
            panic!("lead deveria ter sido concluído");
        };
        assert_eq!(closed.phase, LeadPhase::Completed);
        assert_eq!(closed.funnel_history.entered_at(LeadPhase::Completed), Some(sale_time()));
        assert_eq!(state.find_lead(lead.id).await.map(|l| l.phase), Some(LeadPhase::Completed));
        assert!(state.find_vehicle(car.id).await.is_some_and(|v| v.is_sold()));
    }

    #[tokio::test]
    async fn dangling_buyer_id_does_not_block_the_sale() {
        let car = fixtures::vehicle(VehicleType::Hatch, 40_000);
        let state = state_with(Vec::new(), vec![car.clone()]).await;
        let svc = service(
            Arc::new(InMemoryVehicleStore::with_vehicles([car.clone()])),
            Arc::new(InMemoryLeadStore::new()),
        );
        let ghost = Uuid::new_v4();

        let outcome = svc.sell_vehicle(&state, car.id, sale_to(Some(ghost), "Fulano")).await.unwrap();

        assert_eq!(outcome.lead_link, LeadLink::Missing { lead_id: ghost });
        assert!(outcome.vehicle.is_sold());
        assert_eq!(outcome.vehicle.buyer_lead_id(), Some(ghost));
    }

    #[tokio::test]
    async fn failed_lead_update_keeps_vehicle_sold() {
        let lead = fixtures::lead("Marcos", LeadPhase::FollowUp, sale_time());
        let car = fixtures::vehicle(VehicleType::Suv, 80_000);
        let state = state_with(vec![lead.clone()], vec![car.clone()]).await;
        let svc = service(Arc::new(InMemoryVehicleStore::with_vehicles([car.clone()])), Arc::new(BrokenLeadStore));

        let outcome = svc.sell_vehicle(&state, car.id, sale_to(Some(lead.id), "Marcos")).await.unwrap();

        assert_eq!(outcome.lead_link, LeadLink::Failed { lead_id: lead.id });
        let local = state.find_vehicle(car.id).await.unwrap();
        assert_eq!(local.status, VehicleStatus::Sold);
        assert!(local.sale_details.is_some());
        assert_eq!(state.find_lead(lead.id).await, Some(lead));
    }

    #[tokio::test]
    async fn failed_vehicle_store_leaves_local_state_alone() {
        let car = fixtures::vehicle(VehicleType::Suv, 80_000);
        let state = state_with(Vec::new(), vec![car.clone()]).await;
        let svc = service(Arc::new(BrokenVehicleStore), Arc::new(InMemoryLeadStore::new()));

        let err = svc.sell_vehicle(&state, car.id, sale_to(None, "Fulano")).await.unwrap_err();

        assert!(matches!(err, AppError::PersistenceFailed { entity: "veículo", .. }));
        assert_eq!(state.find_vehicle(car.id).await, Some(car));
    }

    #[tokio::test]
    async fn sold_vehicle_cannot_be_sold_again() {
        let mut car = fixtures::vehicle(VehicleType::Van, 70_000);
        car.status = VehicleStatus::Sold;
        car.sale_details = Some(sale_to(None, "Primeiro"));
        let state = state_with(Vec::new(), vec![car.clone()]).await;
        let svc = service(
            Arc::new(InMemoryVehicleStore::with_vehicles([car.clone()])),
            Arc::new(InMemoryLeadStore::new()),
        );

        let err = svc.sell_vehicle(&state, car.id, sale_to(None, "Segundo")).await.unwrap_err();
        assert!(matches!(err, AppError::VehicleAlreadySold(_)));
    }

    #[tokio::test]
    async fn buyer_is_resolved_by_exact_name() {
        let lead = fixtures::lead("Joana Lima", LeadPhase::Simulation, sale_time());
        let car = fixtures::vehicle(VehicleType::Hatch, 40_000);
        let state = state_with(vec![lead.clone()], vec![car.clone()]).await;
        let svc = service(
            Arc::new(InMemoryVehicleStore::with_vehicles([car.clone()])),
            Arc::new(InMemoryLeadStore::with_leads([lead.clone()])),
        );

        let outcome = svc.sell_vehicle(&state, car.id, sale_to(None, "Joana Lima")).await.unwrap();

        assert_eq!(outcome.vehicle.buyer_lead_id(), Some(lead.id));
        assert!(matches!(outcome.lead_link, LeadLink::Completed { .. }));
        assert_eq!(resolve_buyer(&[lead], sale_to(None, "joana lima")).buyer_lead_id, None);
    }

    #[tokio::test]
    async fn editing_cannot_change_status() {
        let car = fixtures::vehicle(VehicleType::Sedan, 50_000);
        let state = state_with(Vec::new(), vec![car.clone()]).await;
        let svc = service(
            Arc::new(InMemoryVehicleStore::with_vehicles([car.clone()])),
            Arc::new(InMemoryLeadStore::new()),
        );
        let fields = NewVehicle {
            brand: car.brand.clone(),
            model: car.model.clone(),
            year: car.year,
            model_year: car.model_year,
            plate: Some("ABC1D23".into()),
            price: Decimal::from(48_000),
            vehicle_type: car.vehicle_type,
            transmission: car.transmission,
            engine: car.engine,
            mileage: car.mileage,
            color: car.color.clone(),
            is_single_owner: true,
            is_service_history_complete: true,
            is_ipva_paid: true,
            has_warranty: true,
            optionals: vec!["Teto solar".into()],
            image_url: String::new(),
        };

        let err = svc
            .update_vehicle(&state, car.id, fields.clone(), Some(VehicleStatus::Sold))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::VehicleStatusLocked(_)));

        let saved = svc.update_vehicle(&state, car.id, fields, None).await.unwrap();
        assert_eq!(saved.price, Decimal::from(48_000));
        assert_eq!(saved.status, VehicleStatus::Available);
        assert_eq!(state.find_vehicle(car.id).await, Some(saved));
    }

    #[test]
    fn interested_leads_match_type_or_brand_under_max_price() {
        let car = fixtures::vehicle(VehicleType::Sedan, 50_000);

        let mut by_type = fixtures::lead("Ana", LeadPhase::New, sale_time());
        by_type.preferences.types = [VehicleType::Sedan].into_iter().collect();

        let mut by_brand = fixtures::lead("Bruno", LeadPhase::Contacted, sale_time());
        by_brand.preferences.types = [VehicleType::Suv].into_iter().collect();
        by_brand.preferences.brands = ["toyo".to_string()].into_iter().collect();

        let mut too_cheap = fixtures::lead("Carla", LeadPhase::New, sale_time());
        too_cheap.preferences.types = [VehicleType::Sedan].into_iter().collect();
        too_cheap.preferences.max_price = Some(Decimal::from(30_000));

        let mut closed = fixtures::lead("Davi", LeadPhase::Completed, sale_time());
        closed.preferences.types = [VehicleType::Sedan].into_iter().collect();

        let mut blank_brand = fixtures::lead("Eva", LeadPhase::New, sale_time());
        blank_brand.preferences.types = [VehicleType::Suv].into_iter().collect();
        blank_brand.preferences.brands = ["  ".to_string()].into_iter().collect();

        let leads = vec![by_type, by_brand, too_cheap, closed, blank_brand];
        let names: Vec<&str> = interested_leads(&car, &leads).iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Bruno"]);
    }
}
