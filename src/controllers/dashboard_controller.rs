//! Dashboard de ingresos
//!
//! Dos modos: rango explícito (default: últimos 12 meses) y modo período
//! con comparación contra el período anterior completo. El rango
//! explícito manda cuando llegan ambos.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use futures::try_join;
use serde_json::{json, Value};

use crate::dto::dashboard_dto::{
    DashboardQuery, DashboardSummary, RangeReport, ReportRange, TopItems,
};
use crate::repositories::dashboard_repository::DashboardRepository;
use crate::repositories::user_repository::UserRepository;
use crate::services::dashboard::{
    clamp_top_limit, compute_series, current_period_range, default_range, previous_period_range,
    PeriodUnit,
};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::validation::parse_flexible_date;

pub struct DashboardController {
    dashboard: DashboardRepository,
    users: UserRepository,
}

impl DashboardController {
    pub fn new(state: AppState) -> Self {
        Self {
            dashboard: DashboardRepository::new(state.pool.clone()),
            users: UserRepository::new(state.pool),
        }
    }

    pub async fn get(&self, query: DashboardQuery) -> Result<Value, AppError> {
        let today = Utc::now().date_naive();
        let limit = clamp_top_limit(query.limit);

        // Fechas inválidas caen al default; solo from > to es error
        let parsed_from = query
            .from
            .as_deref()
            .or(query.start_date.as_deref())
            .and_then(parse_flexible_date)
            .map(|d| d.date_naive());
        let parsed_to = query
            .to
            .as_deref()
            .or(query.end_date.as_deref())
            .and_then(parse_flexible_date)
            .map(|d| d.date_naive());

        let explicit_range = parsed_from.is_some() || parsed_to.is_some();

        if let (Some(period), false) = (query.period.as_deref(), explicit_range) {
            let unit = PeriodUnit::parse(period).ok_or_else(|| {
                AppError::Validation("period must be month|quarter|semester|year".to_string())
            })?;

            let compare = query
                .compare
                .as_deref()
                .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no"))
                .unwrap_or(true);

            let previous_range = previous_period_range(unit, today);
            let current_range = current_period_range(unit, today);

            let previous = self.report(previous_range.from, previous_range.to, limit).await?;
            let current = if compare {
                Some(self.report(current_range.from, current_range.to, limit).await?)
            } else {
                None
            };

            return Ok(json!({
                "ok": true,
                "mode": "period",
                "period": unit.as_str(),
                "previous": previous,
                "current": current,
            }));
        }

        let defaults = default_range(today);
        let from = parsed_from.unwrap_or(defaults.from);
        let to = parsed_to.unwrap_or(defaults.to);

        if from > to {
            return Err(AppError::Validation(
                "Invalid range: from must be <= to".to_string(),
            ));
        }

        let report = self.report(from, to, limit).await?;
        let mut body = serde_json::to_value(&report)
            .map_err(|e| AppError::Internal(format!("Error serializando reporte: {}", e)))?;
        body["ok"] = json!(true);

        Ok(body)
    }

    async fn report(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        limit: i64,
    ) -> Result<RangeReport, AppError> {
        let from_dt = Utc.from_utc_datetime(&from.and_hms_opt(0, 0, 0).unwrap());
        let to_dt = Utc.from_utc_datetime(&to.and_hms_opt(0, 0, 0).unwrap());
        let to_exclusive = to_dt + Duration::days(1);

        let (rows, total_users, products, services) = try_join!(
            self.dashboard.order_financials(from_dt, to_exclusive),
            self.users.count_registered_between(from_dt, to_exclusive),
            self.dashboard.top_products(from_dt, to_exclusive, limit),
            self.dashboard.top_services(from_dt, to_exclusive, limit),
        )?;

        let (summary, series) = compute_series(from, to, &rows);

        Ok(RangeReport {
            range: ReportRange {
                from: from_dt,
                to: to_dt,
            },
            summary: DashboardSummary {
                total_revenue: summary.total_revenue,
                total_sales: summary.total_sales,
                total_users,
            },
            series,
            top_items: TopItems { products, services },
        })
    }
}
