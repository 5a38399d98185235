// src/services/history.rs

use chrono::{DateTime, Utc};

use crate::models::crm::{FunnelHistory, Lead};
use crate::models::funnel::LeadPhase;

/// Calcula o `funnelHistory` que deve ser gravado junto com o candidato.
///
/// A base é sempre o histórico persistido (`current`), nunca o que veio no
/// candidato:
/// 1. Mesma fase: edição de campos, histórico intacto.
/// 2. Fase nova: carimba `now` na chave da fase (reentrada sobrescreve).
/// 3. Desqualificado: sobra só `{Novo Lead, Desqualificado}`; o Novo Lead
///    mantém o carimbo original, ou `now` se não existir.
pub fn next_history(current: &Lead, candidate_phase: LeadPhase, now: DateTime<Utc>) -> FunnelHistory {
    if candidate_phase == current.phase {
        return current.funnel_history.clone();
    }

    if candidate_phase == LeadPhase::Disqualified {
        let created = current.funnel_history.entered_at(LeadPhase::New).unwrap_or(now);
        return [(LeadPhase::New, created), (LeadPhase::Disqualified, now)]
            .into_iter()
            .collect();
    }

    let mut history = current.funnel_history.clone();
    history.record(candidate_phase, now);
    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::state::fixtures;
    use chrono::{Duration, TimeZone};

    fn t(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, day, 10, 0, 0).unwrap()
    }

    #[test]
    fn same_phase_keeps_history_untouched() {
        let lead = fixtures::lead("Ana", LeadPhase::New, t(1));
        let history = next_history(&lead, LeadPhase::New, t(3));
        assert_eq!(history, lead.funnel_history);
    }

    #[test]
    fn new_phase_is_stamped_and_contains_the_phase() {
        let lead = fixtures::lead("Ana", LeadPhase::New, t(1));
        let history = next_history(&lead, LeadPhase::Simulation, t(2));

        assert_eq!(history.entered_at(LeadPhase::New), Some(t(1)));
        assert_eq!(history.entered_at(LeadPhase::Simulation), Some(t(2)));
        assert_eq!(history.phase_count(), 2);
    }

    #[test]
    fn reentering_a_phase_overwrites_its_timestamp() {
        let mut lead = fixtures::lead("Ana", LeadPhase::Visit, t(1));
        lead.funnel_history.record(LeadPhase::Visit, t(2));
        lead.funnel_history.record(LeadPhase::FollowUp, t(3));
        lead.phase = LeadPhase::FollowUp;

        let history = next_history(&lead, LeadPhase::Visit, t(9));

        assert_eq!(history.entered_at(LeadPhase::Visit), Some(t(9)));
        assert_eq!(history.phase_count(), 3);
    }

    #[test]
    fn disqualification_collapses_to_new_and_disqualified() {
        // Criado em T0, Simulação em T1, Desqualificado em T2
        let t0 = t(1);
        let t1 = t0 + Duration::days(2);
        let t2 = t0 + Duration::days(5);

        let mut lead = fixtures::lead("Ana", LeadPhase::New, t0);
        lead.funnel_history = next_history(&lead, LeadPhase::Simulation, t1);
        lead.phase = LeadPhase::Simulation;

        let history = next_history(&lead, LeadPhase::Disqualified, t2);

        let expected: FunnelHistory = [(LeadPhase::New, t0), (LeadPhase::Disqualified, t2)].into_iter().collect();
        assert_eq!(history, expected);
    }

    #[test]
    fn disqualification_without_new_entry_uses_transition_time() {
        let mut lead = fixtures::lead("Ana", LeadPhase::Visit, t(1));
        lead.funnel_history = [(LeadPhase::Visit, t(2))].into_iter().collect();

        let history = next_history(&lead, LeadPhase::Disqualified, t(4));

        assert_eq!(history.entered_at(LeadPhase::New), Some(t(4)));
        assert_eq!(history.entered_at(LeadPhase::Disqualified), Some(t(4)));
        assert_eq!(history.phase_count(), 2);
    }

    #[test]
    fn pure_function_same_inputs_same_output() {
        let lead = fixtures::lead("Ana", LeadPhase::Contacted, t(1));
        assert_eq!(
            next_history(&lead, LeadPhase::Visit, t(5)),
            next_history(&lead, LeadPhase::Visit, t(5))
        );
    }
}
