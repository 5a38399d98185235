// src/handlers/dashboard.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::dashboard::{WindowMode, WindowSelector},
};

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub filter: Option<String>,
    // Texto cru do date picker; data inválida conta como ausente
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DashboardQuery {
    fn selector(&self) -> Result<WindowSelector, AppError> {
        let mode = match self.filter.as_deref() {
            None | Some("") => WindowMode::default(),
            Some(raw) => raw.parse().map_err(AppError::InvalidParameter)?,
        };

        Ok(WindowSelector {
            mode,
            custom_start: lenient_date(self.start.as_deref()),
            custom_end: lenient_date(self.end.as_deref()),
        })
    }
}

fn lenient_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
}

// GET /api/dashboard?filter=custom&start=2025-01-01&end=2025-03-31
pub async fn get_snapshot(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let selector = query.selector().map_err(|app_err| app_err.to_api_error(&locale))?;

    let snapshot = app_state.dashboard_service.snapshot(&app_state.crm, &selector).await;

    Ok((StatusCode::OK, Json(snapshot)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_filter_defaults_to_this_month() {
        let selector = DashboardQuery::default().selector().unwrap();
        assert_eq!(selector.mode, WindowMode::ThisMonth);
    }

    #[test]
    fn malformed_dates_become_absent_bounds() {
        let query = DashboardQuery {
            filter: Some("custom".into()),
            start: Some("2025-02-30".into()),
            end: Some("2025-03-31".into()),
        };
        let selector = query.selector().unwrap();

        assert_eq!(selector.mode, WindowMode::Custom);
        assert_eq!(selector.custom_start, None);
        assert_eq!(selector.custom_end, NaiveDate::from_ymd_opt(2025, 3, 31));
    }

    #[test]
    fn unknown_filter_is_a_bad_parameter() {
        let query = DashboardQuery { filter: Some("quarter".into()), ..Default::default() };
        assert!(matches!(query.selector(), Err(AppError::InvalidParameter(_))));
    }
}
