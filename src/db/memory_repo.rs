// src/db/memory_repo.rs

// Stores em memória: usados com CRM_STORE=memory (demonstração sem Postgres)
// e como colaborador nos testes dos motores.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{LeadStore, VehicleStore},
    models::crm::{Lead, NewLead},
    models::inventory::{NewVehicle, SaleDetails, Vehicle, VehicleStatus},
};

#[derive(Default)]
pub struct InMemoryLeadStore {
    leads: RwLock<HashMap<Uuid, Lead>>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_leads(leads: impl IntoIterator<Item = Lead>) -> Self {
        Self {
            leads: RwLock::new(leads.into_iter().map(|lead| (lead.id, lead)).collect()),
        }
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn list(&self) -> Result<Vec<Lead>, AppError> {
        let mut leads: Vec<Lead> = self.leads.read().await.values().cloned().collect();
        leads.sort_by(|a, b| b.last_update.cmp(&a.last_update));
        Ok(leads)
    }

    async fn create(&self, lead: &NewLead) -> Result<Lead, AppError> {
        let now = Utc::now();
        let created = Lead {
            id: Uuid::new_v4(),
            name: lead.name.clone(),
            phone: lead.phone.clone(),
            email: lead.email.clone(),
            phase: lead.phase,
            temperature: lead.temperature,
            source: lead.source.clone(),
            notes: lead.notes.clone(),
            preferences: lead.preferences.clone(),
            presented_vehicles: lead.presented_vehicles.clone(),
            created_at: now,
            last_update: now,
            funnel_history: lead.funnel_history.clone(),
        };

        self.leads.write().await.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, lead: &Lead) -> Result<Lead, AppError> {
        let mut leads = self.leads.write().await;
        let stored = leads.get_mut(&lead.id).ok_or(AppError::LeadNotFound(lead.id))?;

        // created_at é imutável; last_update é do servidor
        *stored = Lead {
            created_at: stored.created_at,
            last_update: Utc::now(),
            ..lead.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.leads
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(AppError::LeadNotFound(id))
    }
}

#[derive(Default)]
pub struct InMemoryVehicleStore {
    vehicles: RwLock<HashMap<Uuid, Vehicle>>,
}

impl InMemoryVehicleStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_vehicles(vehicles: impl IntoIterator<Item = Vehicle>) -> Self {
        Self {
            vehicles: RwLock::new(vehicles.into_iter().map(|v| (v.id, v)).collect()),
        }
    }
}

#[async_trait]
impl VehicleStore for InMemoryVehicleStore {
    async fn list(&self) -> Result<Vec<Vehicle>, AppError> {
        let mut vehicles: Vec<Vehicle> = self.vehicles.read().await.values().cloned().collect();
        vehicles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(vehicles)
    }

    async fn create(&self, vehicle: &NewVehicle) -> Result<Vehicle, AppError> {
        let created = Vehicle {
            id: Uuid::new_v4(),
            brand: vehicle.brand.clone(),
            model: vehicle.model.clone(),
            year: vehicle.year,
            model_year: vehicle.model_year.or(Some(vehicle.year)),
            plate: vehicle.plate.clone(),
            price: vehicle.price,
            vehicle_type: vehicle.vehicle_type,
            transmission: vehicle.transmission,
            engine: vehicle.engine,
            mileage: vehicle.mileage,
            color: vehicle.color.clone(),
            is_single_owner: vehicle.is_single_owner,
            is_service_history_complete: vehicle.is_service_history_complete,
            is_ipva_paid: vehicle.is_ipva_paid,
            has_warranty: vehicle.has_warranty,
            optionals: vehicle.optionals.clone(),
            image_url: vehicle.image_url.clone(),
            status: VehicleStatus::Available,
            sale_details: None,
            created_at: Utc::now(),
        };

        self.vehicles.write().await.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, vehicle: &Vehicle) -> Result<Vehicle, AppError> {
        let mut vehicles = self.vehicles.write().await;
        let stored = vehicles.get_mut(&vehicle.id).ok_or(AppError::VehicleNotFound(vehicle.id))?;
        *stored = Vehicle { created_at: stored.created_at, ..vehicle.clone() };
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.vehicles
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(AppError::VehicleNotFound(id))
    }

    async fn sell(&self, id: Uuid, sale: &SaleDetails) -> Result<(), AppError> {
        let mut vehicles = self.vehicles.write().await;
        let stored = vehicles.get_mut(&id).ok_or(AppError::VehicleNotFound(id))?;
        stored.status = VehicleStatus::Sold;
        stored.sale_details = Some(sale.clone());
        Ok(())
    }
}
