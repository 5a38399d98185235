use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::middleware::i18n::Locale;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Lead {0} não encontrado")]
    LeadNotFound(Uuid),

    #[error("Veículo {0} não encontrado")]
    VehicleNotFound(Uuid),

    #[error("Veículo {0} já foi vendido")]
    VehicleAlreadySold(Uuid),

    // Status e dados da venda só mudam pelo fluxo de venda
    #[error("Status do veículo {0} não pode ser alterado por edição")]
    VehicleStatusLocked(Uuid),

    // Falha do store convertida na fronteira dos motores; recuperável
    #[error("Falha ao persistir {entity}: {reason}")]
    PersistenceFailed { entity: &'static str, reason: String },

    // Linha do banco com vocabulário que não conhecemos
    #[error("Registro corrompido: {0}")]
    CorruptRecord(String),

    #[error("Parâmetro inválido: {0}")]
    InvalidParameter(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // `anyhow::Error` captura o contexto de qualquer outro erro inesperado.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn persistence(entity: &'static str, cause: &AppError) -> Self {
        AppError::PersistenceFailed { entity, reason: cause.to_string() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            AppError::LeadNotFound(_) | AppError::VehicleNotFound(_) => StatusCode::NOT_FOUND,
            AppError::VehicleAlreadySold(_) | AppError::VehicleStatusLocked(_) => StatusCode::CONFLICT,
            AppError::PersistenceFailed { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::CorruptRecord(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Mensagem para o usuário final, no idioma pedido ("pt" por padrão).
    fn user_message(&self, lang: &str) -> String {
        let en = lang == "en";
        match self {
            AppError::ValidationError(_) => pick(en, "Um ou mais campos são inválidos.", "One or more fields are invalid."),
            AppError::LeadNotFound(_) => pick(en, "Lead não encontrado.", "Lead not found."),
            AppError::VehicleNotFound(_) => pick(en, "Veículo não encontrado.", "Vehicle not found."),
            AppError::VehicleAlreadySold(_) => pick(en, "Este veículo já foi vendido.", "This vehicle has already been sold."),
            AppError::VehicleStatusLocked(_) => pick(
                en,
                "O status do veículo só muda pelo registro de venda.",
                "Vehicle status can only change through a sale.",
            ),
            AppError::PersistenceFailed { entity, .. } => match (*entity, en) {
                ("lead", false) => "Erro ao atualizar lead. Recarregue a página.".to_string(),
                ("lead", true) => "Could not save the lead. Please reload the page.".to_string(),
                (_, false) => "Erro ao salvar veículo. Tente novamente.".to_string(),
                (_, true) => "Could not save the vehicle. Please try again.".to_string(),
            },
            AppError::InvalidParameter(detail) => {
                if en { format!("Invalid parameter: {}", detail) } else { format!("Parâmetro inválido: {}", detail) }
            }
            AppError::CorruptRecord(_) | AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                pick(en, "Ocorreu um erro inesperado.", "An unexpected error occurred.")
            }
        }
    }

    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let status = self.status_code();
        if status.is_server_error() {
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| e.message.as_ref().map_or_else(|| e.code.to_string(), |m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(details)
            }
            _ => None,
        };

        ApiError { status, message: self.user_message(&locale.0), details }
    }
}

fn pick(en: bool, pt: &str, english: &str) -> String {
    if en { english.to_string() } else { pt.to_string() }
}

// O erro já traduzido, pronto para virar resposta HTTP
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<std::collections::HashMap<String, Vec<String>>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => Json(json!({ "error": self.message, "details": details })),
            None => Json(json!({ "error": self.message })),
        };
        (self.status, body).into_response()
    }
}

// Para handlers que não pedem o Locale: resposta em português.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_failure_is_recoverable_and_localized() {
        let err = AppError::PersistenceFailed { entity: "lead", reason: "timeout".into() };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let pt = err.to_api_error(&Locale("pt".into()));
        assert_eq!(pt.message, "Erro ao atualizar lead. Recarregue a página.");

        let en = err.to_api_error(&Locale("en".into()));
        assert_eq!(en.message, "Could not save the lead. Please reload the page.");
    }

    #[test]
    fn not_found_and_conflict_codes() {
        assert_eq!(AppError::LeadNotFound(Uuid::nil()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::VehicleAlreadySold(Uuid::nil()).status_code(), StatusCode::CONFLICT);
    }
}
