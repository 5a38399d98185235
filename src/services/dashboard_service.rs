// src/services/dashboard_service.rs

use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate};
use rust_decimal::Decimal;

use crate::{
    common::clock::Clock,
    models::crm::Lead,
    models::dashboard::{DashboardSnapshot, FunnelStage, LeadStats, StockMetrics, TrendPoint, WindowMode, WindowSelector},
    models::funnel::LeadPhase,
    models::inventory::{Vehicle, VehicleType},
    services::state::CrmState,
    services::time_window::{self, ResolvedWindow},
};

// Fases que contam como "qualificado" nos cards do topo
const QUALIFYING_PHASES: [LeadPhase; 3] = [LeadPhase::Simulation, LeadPhase::Visit, LeadPhase::FollowUp];

// Mesmo conjunto, na ordem em que o gráfico do funil confere
const FUNNEL_QUALIFYING_PHASES: [LeadPhase; 3] = [LeadPhase::FollowUp, LeadPhase::Simulation, LeadPhase::Visit];

#[derive(Clone)]
pub struct DashboardService {
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
}

impl DashboardService {
    pub fn new(clock: Arc<dyn Clock>, offset: FixedOffset) -> Self {
        Self { clock, offset }
    }

    pub fn resolve(&self, selector: &WindowSelector) -> ResolvedWindow {
        time_window::resolve(selector, self.clock.now(), self.offset)
    }

    /// Recalcula tudo a partir das coleções inteiras. Sem cache: repetir é
    /// sempre seguro.
    pub async fn snapshot(&self, state: &CrmState, selector: &WindowSelector) -> DashboardSnapshot {
        let window = self.resolve(selector);
        let leads = state.leads().await;
        let vehicles = state.vehicles().await;

        let snapshot = compute_snapshot(&leads, &vehicles, &window);
        tracing::debug!(
            mode = ?window.mode(),
            received = snapshot.stats.received,
            sales = snapshot.stats.sales_made,
            "snapshot do dashboard calculado"
        );
        snapshot
    }
}

// =========================================================================
//  FUNÇÕES PURAS
// =========================================================================

pub fn compute_snapshot(leads: &[Lead], vehicles: &[Vehicle], window: &ResolvedWindow) -> DashboardSnapshot {
    DashboardSnapshot {
        window: window.summary(),
        stats: lead_stats(leads, vehicles, window),
        funnel: funnel_stages(leads),
        stock: stock_metrics(vehicles),
        trend: trend_series(leads, window),
        growth_percentage: growth_for_window(leads, window),
    }
}

pub fn lead_stats(leads: &[Lead], vehicles: &[Vehicle], window: &ResolvedWindow) -> LeadStats {
    let received: Vec<&Lead> = leads.iter().filter(|lead| window.contains(lead.created_at)).collect();

    let disqualified = received.iter().filter(|lead| lead.is_disqualified()).count();
    let qualified = received
        .iter()
        .filter(|lead| !lead.is_disqualified() && lead.funnel_history.contains_any(&QUALIFYING_PHASES))
        .count();

    // Venda sem saleDetails ainda é venda
    let sales_made = vehicles
        .iter()
        .filter(|v| v.is_sold())
        .filter(|v| v.sale_details.as_ref().is_none_or(|sale| window.contains_date(sale.sale_date)))
        .count();

    LeadStats { received: received.len(), disqualified, qualified, sales_made }
}

/// Funil sempre sobre a coleção inteira, ignorando o período.
pub fn funnel_stages(leads: &[Lead]) -> Vec<FunnelStage> {
    let qualified = leads
        .iter()
        .filter(|lead| !lead.is_disqualified() && lead.funnel_history.contains_any(&FUNNEL_QUALIFYING_PHASES))
        .count();
    let completed = leads
        .iter()
        .filter(|lead| lead.funnel_history.contains(LeadPhase::Completed) || lead.phase == LeadPhase::Completed)
        .count();
    let disqualified = leads
        .iter()
        .filter(|lead| lead.is_disqualified() || lead.funnel_history.contains(LeadPhase::Disqualified))
        .count();

    vec![
        FunnelStage { name: "Novos Leads", phase: LeadPhase::New, value: leads.len() },
        FunnelStage { name: "Leads Qualificados", phase: LeadPhase::FollowUp, value: qualified },
        FunnelStage { name: "Vendas Feitas", phase: LeadPhase::Completed, value: completed },
        FunnelStage { name: "Leads Desqualificados", phase: LeadPhase::Disqualified, value: disqualified },
    ]
}

pub fn stock_metrics(vehicles: &[Vehicle]) -> StockMetrics {
    let available: Vec<&Vehicle> = vehicles.iter().filter(|v| v.is_available()).collect();

    let total_value: Decimal = available.iter().map(|v| v.price).sum();
    let average_ticket = if available.is_empty() {
        Decimal::ZERO
    } else {
        total_value / Decimal::from(available.len())
    };

    StockMetrics {
        available_count: available.len(),
        total_value,
        average_ticket,
        top_category: top_category(&available),
    }
}

// Contagem por tipo na ordem de aparição; empate fica com o primeiro
fn top_category(vehicles: &[&Vehicle]) -> Option<VehicleType> {
    let mut counts: Vec<(VehicleType, usize)> = Vec::new();
    for vehicle in vehicles {
        match counts.iter_mut().find(|(t, _)| *t == vehicle.vehicle_type) {
            Some((_, count)) => *count += 1,
            None => counts.push((vehicle.vehicle_type, 1)),
        }
    }

    let mut best: Option<(VehicleType, usize)> = None;
    for (vehicle_type, count) in counts {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((vehicle_type, count));
        }
    }
    best.map(|(vehicle_type, _)| vehicle_type)
}

/// Só leads dentro do período; baldes mensais cobrem meses inteiros, o
/// filtro é que corta as pontas.
pub fn trend_series(leads: &[Lead], window: &ResolvedWindow) -> Vec<TrendPoint> {
    let created: Vec<NaiveDate> = leads
        .iter()
        .filter(|lead| window.contains(lead.created_at))
        .map(|lead| window.local_date(lead.created_at))
        .collect();

    window
        .plan()
        .buckets()
        .into_iter()
        .map(|bucket| TrendPoint {
            count: created.iter().filter(|date| bucket.contains(**date)).count(),
            label: bucket.label,
        })
        .collect()
}

/// Mês atual x anterior em "all"/"this-month"; nos outros modos,
/// mês anterior x retrasado.
pub fn growth_for_window(leads: &[Lead], window: &ResolvedWindow) -> i64 {
    let lag = match window.mode() {
        WindowMode::All | WindowMode::ThisMonth => 0,
        _ => 1,
    };
    let current_month = time_window::shift_month(window.today(), -lag);
    let previous_month = time_window::shift_month(window.today(), -lag - 1);

    let count_in = |month: NaiveDate| {
        leads
            .iter()
            .filter(|lead| time_window::same_month(window.local_date(lead.created_at), month))
            .count()
    };

    growth_percentage(count_in(current_month), count_in(previous_month))
}

/// `round((atual - anterior) / anterior * 100)`, meio arredonda para cima.
/// Anterior zero: 100 se houve algo, senão 0.
pub fn growth_percentage(current: usize, previous: usize) -> i64 {
    if previous == 0 {
        return if current > 0 { 100 } else { 0 };
    }
    let (current, previous) = (current as i64, previous as i64);
    // floor(x + 0.5) em aritmética inteira
    (200 * (current - previous) + previous).div_euclid(2 * previous)
}
