use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::dashboard::Series;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    // Alias aceptados por compatibilidad
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub period: Option<String>,
    pub compare: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_revenue: Decimal,
    pub total_sales: i64,
    pub total_users: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopItem {
    pub id: Uuid,
    pub name: Option<String>,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopItems {
    pub products: Vec<TopItem>,
    pub services: Vec<TopItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Reporte completo de un rango de fechas
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeReport {
    pub range: ReportRange,
    pub summary: DashboardSummary,
    pub series: Series,
    pub top_items: TopItems,
}
