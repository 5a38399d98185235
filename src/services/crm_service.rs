// src/services/crm_service.rs

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    common::{clock::Clock, error::AppError},
    db::LeadStore,
    models::crm::{FunnelHistory, Lead, NewLead},
    models::funnel::{FunnelMenu, LeadPhase},
    models::inventory::Vehicle,
    services::history::next_history,
    services::state::{CrmState, LeadMutation},
};

// Coluna do kanban: uma fase e os leads nela
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumn {
    pub phase: LeadPhase,
    pub leads: Vec<Lead>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelBoard {
    pub menu: FunnelMenu,
    pub columns: Vec<BoardColumn>,
}

#[derive(Clone)]
pub struct LeadService {
    store: Arc<dyn LeadStore>,
    clock: Arc<dyn Clock>,
}

impl LeadService {
    pub fn new(store: Arc<dyn LeadStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    // =========================================================================
    //  1. TRANSIÇÃO (update otimista + reconciliação)
    // =========================================================================

    /// Aplica o candidato (registro completo, não patch) ao lead `candidate.id`.
    ///
    /// Uma chamada ao store. Estado local muda duas vezes: otimista e depois
    /// confirmado (sucesso) ou revertido (falha). Na falha, o estado local
    /// volta a ser exatamente o de antes da chamada.
    pub async fn update_lead(&self, state: &CrmState, candidate: Lead) -> Result<Lead, AppError> {
        // (a) Versão atual na memória
        let current = state
            .find_lead(candidate.id)
            .await
            .ok_or(AppError::LeadNotFound(candidate.id))?;

        // (b) Histórico novo
        let funnel_history = next_history(&current, candidate.phase, self.clock.now());
        let to_save = Lead { funnel_history, ..candidate };

        // (c) Otimista: a tela já enxerga a mudança
        state.apply(&LeadMutation::pending(to_save.clone())).await;

        // (d) Persiste
        match self.store.update(&to_save).await {
            // (e) Confirma com o registro do servidor (last_update etc.)
            Ok(saved) => {
                state.apply(&LeadMutation::confirmed(saved.clone())).await;
                tracing::info!(lead_id = %saved.id, phase = %saved.phase, "lead atualizado");
                Ok(saved)
            }
            // (f) Reverte e avisa quem chamou
            Err(e) => {
                state.apply(&LeadMutation::reverted(current)).await;
                tracing::error!(lead_id = %to_save.id, "🔥 Falha ao atualizar lead, revertido: {}", e);
                Err(AppError::persistence("lead", &e))
            }
        }
    }

    /// Caminho de persistência sem o passo otimista. Usado por quem já
    /// cuida da própria lista local (venda de veículo).
    pub async fn persist(&self, lead: &Lead) -> Result<Lead, AppError> {
        self.store
            .update(lead)
            .await
            .map_err(|e| AppError::persistence("lead", &e))
    }

    /// Soltar o card em outra coluna do kanban.
    pub async fn move_lead(&self, state: &CrmState, id: Uuid, phase: LeadPhase) -> Result<Lead, AppError> {
        let current = state.find_lead(id).await.ok_or(AppError::LeadNotFound(id))?;
        if current.phase == phase {
            return Ok(current);
        }
        self.update_lead(state, Lead { phase, ..current }).await
    }

    // =========================================================================
    //  2. CRIAÇÃO / EXCLUSÃO
    // =========================================================================

    pub async fn create_lead(&self, state: &CrmState, mut draft: NewLead) -> Result<Lead, AppError> {
        let now = self.clock.now();

        // Todo lead nasce com Novo Lead; se o formulário escolheu outra
        // fase do menu, ela também é carimbada.
        let mut history = FunnelHistory::started_at(now);
        if draft.phase != LeadPhase::New {
            history.record(draft.phase, now);
        }
        draft.funnel_history = history;

        let created = self
            .store
            .create(&draft)
            .await
            .map_err(|e| AppError::persistence("lead", &e))?;

        state.prepend_lead(created.clone()).await;
        tracing::info!(lead_id = %created.id, "✅ Lead criado");
        Ok(created)
    }

    /// Veículos vendidos para esse lead ficam com `buyerLeadId` pendurado.
    pub async fn delete_lead(&self, state: &CrmState, id: Uuid) -> Result<(), AppError> {
        if state.find_lead(id).await.is_none() {
            return Err(AppError::LeadNotFound(id));
        }

        self.store
            .delete(id)
            .await
            .map_err(|e| AppError::persistence("lead", &e))?;

        state.remove_lead(id).await;
        tracing::info!(lead_id = %id, "Lead removido");
        Ok(())
    }

    pub async fn reload(&self) -> Result<Vec<Lead>, AppError> {
        self.store.list().await
    }

    // =========================================================================
    //  3. LEITURAS PARA A TELA
    // =========================================================================

    pub async fn board(&self, state: &CrmState, menu: FunnelMenu) -> FunnelBoard {
        build_board(&state.leads().await, menu)
    }
}

// --- Funções puras ---

pub fn build_board(leads: &[Lead], menu: FunnelMenu) -> FunnelBoard {
    let columns = menu
        .display_phases()
        .into_iter()
        .map(|phase| BoardColumn {
            phase,
            leads: leads.iter().filter(|lead| lead.phase == phase).cloned().collect(),
        })
        .collect();

    FunnelBoard { menu, columns }
}

/// Estoque disponível compatível com as preferências do lead.
pub fn matching_vehicles<'a>(lead: &Lead, vehicles: &'a [Vehicle]) -> Vec<&'a Vehicle> {
    let pref = &lead.preferences;
    vehicles
        .iter()
        .filter(|v| v.is_available())
        .filter(|v| pref.accepts_any_type() || pref.types.contains(&v.vehicle_type))
        .filter(|v| pref.fits_price(v.price))
        .collect()
}

/// Veículos cuja venda aponta para o lead.
pub fn purchased_vehicles<'a>(lead_id: Uuid, vehicles: &'a [Vehicle]) -> Vec<&'a Vehicle> {
    vehicles.iter().filter(|v| v.buyer_lead_id() == Some(lead_id)).collect()
}
