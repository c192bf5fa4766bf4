//! Agregación del dashboard de ingresos
//!
//! Los pedidos liquidados (pagado >= total) del rango se agrupan por mes
//! calendario; trimestres y semestres se derivan SIEMPRE de la serie
//! mensual para que las sumas nunca diverjan. El modo período compara el
//! período actual corrido contra el período completo anterior.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Total y pagado de un pedido del rango consultado
#[derive(Debug, Clone, Copy)]
pub struct OrderFinancials {
    pub started_at: DateTime<Utc>,
    pub total: Decimal,
    pub paid: Decimal,
}

impl OrderFinancials {
    pub fn is_settled(&self) -> bool {
        self.paid >= self.total
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodBucket {
    pub period: String,
    pub revenue: Decimal,
    pub sales: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub monthly: Vec<PeriodBucket>,
    pub quarterly: Vec<PeriodBucket>,
    pub semiannual: Vec<PeriodBucket>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeSummary {
    pub total_revenue: Decimal,
    pub total_sales: i64,
}

fn month_key(year: i32, month: u32) -> String {
    format!("{}-{:02}", year, month)
}

fn quarter_key(year: i32, month: u32) -> String {
    format!("{}-Q{}", year, (month - 1) / 3 + 1)
}

fn semester_key(year: i32, month: u32) -> String {
    format!("{}-S{}", year, if month <= 6 { 1 } else { 2 })
}

/// Claves de mes entre dos fechas, inclusivas
fn month_keys_between(from: NaiveDate, to: NaiveDate) -> Vec<(i32, u32)> {
    let mut keys = Vec::new();
    let (mut year, mut month) = (from.year(), from.month());
    let end = (to.year(), to.month());

    while (year, month) <= end {
        keys.push((year, month));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    keys
}

/// Serie mensual con relleno de ceros + re-agrupación trimestral y semestral
pub fn compute_series(from: NaiveDate, to: NaiveDate, rows: &[OrderFinancials]) -> (RangeSummary, Series) {
    let mut by_month: BTreeMap<(i32, u32), (Decimal, i64)> = BTreeMap::new();
    let mut total_revenue = Decimal::ZERO;
    let mut total_sales = 0i64;

    for row in rows.iter().filter(|r| r.is_settled()) {
        let date = row.started_at.date_naive();
        let entry = by_month.entry((date.year(), date.month())).or_default();
        entry.0 += row.total;
        entry.1 += 1;
        total_revenue += row.total;
        total_sales += 1;
    }

    let monthly: Vec<PeriodBucket> = month_keys_between(from, to)
        .into_iter()
        .map(|(year, month)| {
            let (revenue, sales) = by_month.get(&(year, month)).copied().unwrap_or_default();
            PeriodBucket {
                period: month_key(year, month),
                revenue,
                sales,
            }
        })
        .collect();

    let quarterly = regroup(&monthly, quarter_key);
    let semiannual = regroup(&monthly, semester_key);

    (
        RangeSummary {
            total_revenue,
            total_sales,
        },
        Series {
            monthly,
            quarterly,
            semiannual,
        },
    )
}

/// Reagrupar la serie mensual con otra clave de período
fn regroup(monthly: &[PeriodBucket], key: impl Fn(i32, u32) -> String) -> Vec<PeriodBucket> {
    let mut grouped: BTreeMap<String, (Decimal, i64)> = BTreeMap::new();

    for bucket in monthly {
        let (year, month) = split_month_key(&bucket.period);
        let entry = grouped.entry(key(year, month)).or_default();
        entry.0 += bucket.revenue;
        entry.1 += bucket.sales;
    }

    grouped
        .into_iter()
        .map(|(period, (revenue, sales))| PeriodBucket {
            period,
            revenue,
            sales,
        })
        .collect()
}

fn split_month_key(key: &str) -> (i32, u32) {
    let mut parts = key.splitn(2, '-');
    let year = parts.next().and_then(|y| y.parse().ok()).unwrap_or(0);
    let month = parts.next().and_then(|m| m.parse().ok()).unwrap_or(1);
    (year, month)
}

/// Unidad de período para el modo comparativo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodUnit {
    Month,
    Quarter,
    Semester,
    Year,
}

impl PeriodUnit {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "month" => Some(PeriodUnit::Month),
            "quarter" => Some(PeriodUnit::Quarter),
            "semester" => Some(PeriodUnit::Semester),
            "year" => Some(PeriodUnit::Year),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodUnit::Month => "month",
            PeriodUnit::Quarter => "quarter",
            PeriodUnit::Semester => "semester",
            PeriodUnit::Year => "year",
        }
    }
}

/// Rango inclusivo de días
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

fn period_start(unit: PeriodUnit, date: NaiveDate) -> NaiveDate {
    match unit {
        PeriodUnit::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap(),
        PeriodUnit::Quarter => {
            let start_month = (date.month() - 1) / 3 * 3 + 1;
            NaiveDate::from_ymd_opt(date.year(), start_month, 1).unwrap()
        }
        PeriodUnit::Semester => {
            let start_month = if date.month() <= 6 { 1 } else { 7 };
            NaiveDate::from_ymd_opt(date.year(), start_month, 1).unwrap()
        }
        PeriodUnit::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap(),
    }
}

/// Período actual corrido: del inicio del período hasta hoy
pub fn current_period_range(unit: PeriodUnit, today: NaiveDate) -> DateRange {
    DateRange {
        from: period_start(unit, today),
        to: today,
    }
}

/// Período anterior completo: termina el día antes de que empiece el actual
pub fn previous_period_range(unit: PeriodUnit, today: NaiveDate) -> DateRange {
    let current_start = period_start(unit, today);
    let previous_end = current_start - Duration::days(1);
    DateRange {
        from: period_start(unit, previous_end),
        to: previous_end,
    }
}

/// Rango por defecto del modo explícito: últimos 12 meses hasta hoy
pub fn default_range(today: NaiveDate) -> DateRange {
    let months_back = 11;
    let total = today.year() * 12 + today.month() as i32 - 1 - months_back;
    let (year, month) = (total.div_euclid(12), (total.rem_euclid(12) + 1) as u32);
    DateRange {
        from: NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
        to: today,
    }
}

/// Límite de top-N del dashboard: default 10, acotado a [1, 50]
pub fn clamp_top_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(10).clamp(1, 50)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(year: i32, month: u32, day: u32, total: i64, paid: i64) -> OrderFinancials {
        OrderFinancials {
            started_at: Utc.with_ymd_and_hms(year, month, day, 10, 0, 0).unwrap(),
            total: Decimal::from(total),
            paid: Decimal::from(paid),
        }
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_settled_order_in_january() {
        let rows = vec![row(2026, 1, 15, 150, 150)];
        let (summary, series) = compute_series(date(2026, 1, 1), date(2026, 12, 31), &rows);

        assert_eq!(summary.total_sales, 1);
        assert_eq!(summary.total_revenue, Decimal::from(150));
        assert_eq!(series.monthly.len(), 12);
        assert_eq!(series.monthly[0].period, "2026-01");
        assert_eq!(series.monthly[0].revenue, Decimal::from(150));
        assert_eq!(series.monthly[0].sales, 1);
        assert!(series.monthly[1..].iter().all(|b| b.sales == 0));
    }

    #[test]
    fn test_unsettled_orders_are_excluded() {
        let rows = vec![row(2026, 1, 15, 300, 100)];
        let (summary, series) = compute_series(date(2026, 1, 1), date(2026, 3, 31), &rows);

        assert_eq!(summary.total_sales, 0);
        assert_eq!(summary.total_revenue, Decimal::ZERO);
        assert!(series.monthly.iter().all(|b| b.revenue == Decimal::ZERO));
    }

    #[test]
    fn test_rebucketing_matches_monthly_sums() {
        let rows = vec![
            row(2026, 1, 5, 100, 100),
            row(2026, 2, 5, 200, 250),
            row(2026, 4, 5, 300, 300),
            row(2026, 7, 5, 400, 400),
            row(2026, 11, 5, 500, 500),
        ];
        let (_, series) = compute_series(date(2026, 1, 1), date(2026, 12, 31), &rows);

        let monthly_total: Decimal = series.monthly.iter().map(|b| b.revenue).sum();
        let quarterly_total: Decimal = series.quarterly.iter().map(|b| b.revenue).sum();
        let semiannual_total: Decimal = series.semiannual.iter().map(|b| b.revenue).sum();
        assert_eq!(monthly_total, quarterly_total);
        assert_eq!(monthly_total, semiannual_total);

        let monthly_sales: i64 = series.monthly.iter().map(|b| b.sales).sum();
        let quarterly_sales: i64 = series.quarterly.iter().map(|b| b.sales).sum();
        assert_eq!(monthly_sales, quarterly_sales);

        assert_eq!(series.quarterly.len(), 4);
        assert_eq!(series.quarterly[0].period, "2026-Q1");
        assert_eq!(series.quarterly[0].revenue, Decimal::from(300));
        assert_eq!(series.semiannual.len(), 2);
        assert_eq!(series.semiannual[0].period, "2026-S1");
        assert_eq!(series.semiannual[0].revenue, Decimal::from(600));
        assert_eq!(series.semiannual[1].revenue, Decimal::from(900));
    }

    #[test]
    fn test_month_period_ranges() {
        let today = date(2026, 8, 7);
        assert_eq!(
            current_period_range(PeriodUnit::Month, today),
            DateRange { from: date(2026, 8, 1), to: date(2026, 8, 7) }
        );
        assert_eq!(
            previous_period_range(PeriodUnit::Month, today),
            DateRange { from: date(2026, 7, 1), to: date(2026, 7, 31) }
        );
    }

    #[test]
    fn test_quarter_and_semester_ranges() {
        let today = date(2026, 8, 7);
        assert_eq!(
            current_period_range(PeriodUnit::Quarter, today),
            DateRange { from: date(2026, 7, 1), to: date(2026, 8, 7) }
        );
        assert_eq!(
            previous_period_range(PeriodUnit::Quarter, today),
            DateRange { from: date(2026, 4, 1), to: date(2026, 6, 30) }
        );
        assert_eq!(
            previous_period_range(PeriodUnit::Semester, today),
            DateRange { from: date(2026, 1, 1), to: date(2026, 6, 30) }
        );
    }

    #[test]
    fn test_year_period_crosses_january() {
        let today = date(2026, 1, 10);
        assert_eq!(
            previous_period_range(PeriodUnit::Year, today),
            DateRange { from: date(2025, 1, 1), to: date(2025, 12, 31) }
        );
        assert_eq!(
            previous_period_range(PeriodUnit::Month, today),
            DateRange { from: date(2025, 12, 1), to: date(2025, 12, 31) }
        );
    }

    #[test]
    fn test_default_range_trailing_twelve_months() {
        let range = default_range(date(2026, 8, 7));
        assert_eq!(range.from, date(2025, 9, 1));
        assert_eq!(range.to, date(2026, 8, 7));
    }

    #[test]
    fn test_clamp_top_limit() {
        assert_eq!(clamp_top_limit(None), 10);
        assert_eq!(clamp_top_limit(Some(0)), 1);
        assert_eq!(clamp_top_limit(Some(200)), 50);
        assert_eq!(clamp_top_limit(Some(25)), 25);
    }
}
