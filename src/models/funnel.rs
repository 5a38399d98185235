// src/models/funnel.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// --- ENUMS ---

// As fases do funil. O valor serializado é o rótulo usado pela loja,
// e também é a chave do `funnelHistory` no JSONB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LeadPhase {
    // Funil de Vendas (Leads Ativos)
    #[serde(rename = "Novo Lead")]
    New,
    #[serde(rename = "Em atendimento")]
    Contacted,
    #[serde(rename = "Simulação")]
    Simulation,
    #[serde(rename = "Marcou Visita")]
    Visit,
    #[serde(rename = "Follow-up")]
    FollowUp,

    // Funil de Pós-Venda (Vendas Fechadas)
    #[serde(rename = "Pagamento")]
    WaitingPayment,
    #[serde(rename = "Documentação")]
    Documentation,
    #[serde(rename = "Entrega")]
    Delivery,
    #[serde(rename = "Concluído")]
    Completed,

    // Estados Finais
    #[serde(rename = "Perdido")]
    Lost,
    #[serde(rename = "Desqualificado")]
    Disqualified,
}

pub const ACTIVE_PHASES: [LeadPhase; 5] = [
    LeadPhase::New,
    LeadPhase::Contacted,
    LeadPhase::Simulation,
    LeadPhase::Visit,
    LeadPhase::FollowUp,
];

pub const POST_SALE_PHASES: [LeadPhase; 4] = [
    LeadPhase::WaitingPayment,
    LeadPhase::Documentation,
    LeadPhase::Delivery,
    LeadPhase::Completed,
];

impl LeadPhase {
    pub const ALL: [LeadPhase; 11] = [
        LeadPhase::New,
        LeadPhase::Contacted,
        LeadPhase::Simulation,
        LeadPhase::Visit,
        LeadPhase::FollowUp,
        LeadPhase::WaitingPayment,
        LeadPhase::Documentation,
        LeadPhase::Delivery,
        LeadPhase::Completed,
        LeadPhase::Lost,
        LeadPhase::Disqualified,
    ];

    /// Rótulo gravado no banco (coluna TEXT) e usado no JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            LeadPhase::New => "Novo Lead",
            LeadPhase::Contacted => "Em atendimento",
            LeadPhase::Simulation => "Simulação",
            LeadPhase::Visit => "Marcou Visita",
            LeadPhase::FollowUp => "Follow-up",
            LeadPhase::WaitingPayment => "Pagamento",
            LeadPhase::Documentation => "Documentação",
            LeadPhase::Delivery => "Entrega",
            LeadPhase::Completed => "Concluído",
            LeadPhase::Lost => "Perdido",
            LeadPhase::Disqualified => "Desqualificado",
        }
    }
}

impl fmt::Display for LeadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeadPhase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| format!("fase de lead desconhecida: '{}'", s))
    }
}

// --- MENUS DO KANBAN ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FunnelMenu {
    Active,      // "active"
    SalesClosed, // "sales-closed"
}

impl FunnelMenu {
    pub fn phases(self) -> &'static [LeadPhase] {
        match self {
            FunnelMenu::Active => &ACTIVE_PHASES,
            FunnelMenu::SalesClosed => &POST_SALE_PHASES,
        }
    }

    /// Colunas exibidas: as fases do menu + Desqualificado sempre no final,
    /// já que ele é alcançável de qualquer fase ativa.
    pub fn display_phases(self) -> Vec<LeadPhase> {
        let mut phases = self.phases().to_vec();
        phases.push(LeadPhase::Disqualified);
        phases
    }
}

impl FromStr for FunnelMenu {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(FunnelMenu::Active),
            "sales-closed" => Ok(FunnelMenu::SalesClosed),
            other => Err(format!("menu desconhecido: '{}'", other)),
        }
    }
}

// --- TEMPERATURA ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeadTemperature {
    #[serde(rename = "Quente")]
    Hot,
    #[serde(rename = "Morna")]
    Warm,
    #[serde(rename = "Fria")]
    Cold,
}

impl LeadTemperature {
    pub fn as_str(self) -> &'static str {
        match self {
            LeadTemperature::Hot => "Quente",
            LeadTemperature::Warm => "Morna",
            LeadTemperature::Cold => "Fria",
        }
    }
}

impl FromStr for LeadTemperature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Quente" => Ok(LeadTemperature::Hot),
            "Morna" => Ok(LeadTemperature::Warm),
            "Fria" => Ok(LeadTemperature::Cold),
            other => Err(format!("temperatura desconhecida: '{}'", other)),
        }
    }
}

// --- ORIGEM ---

// Campo livre na tela: as origens conhecidas viram variantes, o resto é
// guardado como veio para não ser sobrescrito na próxima edição.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LeadSource {
    MetaAds,
    GoogleAds,
    WhatsApp,
    Referral,
    Site,
    // Sem origem
    Other,
    Custom(String),
}

impl LeadSource {
    pub fn as_str(&self) -> &str {
        match self {
            LeadSource::MetaAds => "Meta Ads",
            LeadSource::GoogleAds => "Google Ads",
            LeadSource::WhatsApp => "WhatsApp",
            LeadSource::Referral => "Indicação",
            LeadSource::Site => "Site",
            LeadSource::Other => "Outro",
            LeadSource::Custom(text) => text,
        }
    }

    /// Leitura tolerante: nunca falha.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim() {
            "Meta Ads" => LeadSource::MetaAds,
            "Google Ads" => LeadSource::GoogleAds,
            "WhatsApp" => LeadSource::WhatsApp,
            "Indicação" => LeadSource::Referral,
            "Site" => LeadSource::Site,
            "" | "Outro" => LeadSource::Other,
            other => LeadSource::Custom(other.to_string()),
        }
    }
}

impl From<String> for LeadSource {
    fn from(raw: String) -> Self {
        LeadSource::parse_lenient(&raw)
    }
}

impl From<LeadSource> for String {
    fn from(source: LeadSource) -> Self {
        source.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_list_appends_disqualified_to_both_menus() {
        assert_eq!(
            FunnelMenu::Active.display_phases(),
            vec![
                LeadPhase::New,
                LeadPhase::Contacted,
                LeadPhase::Simulation,
                LeadPhase::Visit,
                LeadPhase::FollowUp,
                LeadPhase::Disqualified,
            ]
        );
        assert_eq!(
            FunnelMenu::SalesClosed.display_phases().last(),
            Some(&LeadPhase::Disqualified)
        );
        assert_eq!(FunnelMenu::SalesClosed.display_phases().len(), 5);
    }

    #[test]
    fn phase_labels_match_serde_and_parse_back() {
        for phase in LeadPhase::ALL {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(json, format!("\"{}\"", phase.as_str()));
            assert_eq!(phase.as_str().parse::<LeadPhase>().unwrap(), phase);
        }
        assert!("Fase Inventada".parse::<LeadPhase>().is_err());
    }

    #[test]
    fn blank_source_is_other() {
        assert_eq!(LeadSource::parse_lenient(""), LeadSource::Other);
        assert_eq!(LeadSource::parse_lenient("Indicação"), LeadSource::Referral);
    }

    #[test]
    fn free_text_source_is_kept_verbatim() {
        let source = LeadSource::parse_lenient("Feirão de sábado");
        assert_eq!(source, LeadSource::Custom("Feirão de sábado".into()));
        assert_eq!(source.as_str(), "Feirão de sábado");

        let json = serde_json::to_string(&source).unwrap();
        assert_eq!(json, "\"Feirão de sábado\"");
        assert_eq!(serde_json::from_str::<LeadSource>(&json).unwrap(), source);
        assert_eq!(serde_json::to_string(&LeadSource::Referral).unwrap(), "\"Indicação\"");
    }
}
