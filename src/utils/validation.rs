//! Helpers de validación y parseo de fechas
//!
//! Los query params de fechas se parsean de forma tolerante: un valor
//! inválido cae al default del endpoint en lugar de fallar, salvo donde
//! el contrato exige validación explícita (from > to, fecha de visita).

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// Validar formato de email (regla simple, igual a la del registro de invitados)
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Parsear un valor de fecha flexible: RFC3339, fecha-hora ISO o fecha sola.
/// Devuelve None si no se reconoce (el caller decide el default).
pub fn parse_flexible_date(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }

    None
}

/// Combinar fecha y hora de visita. Si viene hora separada se combina con la
/// fecha; si no, se intenta leer la fecha como fecha-hora completa.
pub fn parse_visit_datetime(date: &str, time: Option<&str>) -> Option<DateTime<Utc>> {
    match time {
        Some(t) if !t.trim().is_empty() => {
            let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
            let time = NaiveTime::parse_from_str(t.trim(), "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(t.trim(), "%H:%M:%S"))
                .ok()?;
            Some(Utc.from_utc_datetime(&date.and_time(time)))
        }
        _ => parse_flexible_date(date),
    }
}

/// Normalizar una fecha al inicio del día
pub fn start_of_day(dt: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&dt.date_naive().and_hms_opt(0, 0, 0).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("cliente@test.com"));
        assert!(!is_valid_email("cliente@test"));
        assert!(!is_valid_email("sin arroba"));
    }

    #[test]
    fn test_parse_flexible_date() {
        assert_eq!(
            parse_flexible_date("2026-02-10T10:00:00.000Z").unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 10, 10, 0, 0).unwrap()
        );
        assert_eq!(
            parse_flexible_date("2026-02-10").unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 10, 0, 0, 0).unwrap()
        );
        assert!(parse_flexible_date("no-es-fecha").is_none());
    }

    #[test]
    fn test_parse_visit_datetime_combines_date_and_time() {
        assert_eq!(
            parse_visit_datetime("2026-02-10", Some("11:00")).unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 10, 11, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_visit_datetime_accepts_full_timestamp() {
        assert_eq!(
            parse_visit_datetime("2026-02-10T13:00:00.000Z", None).unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 10, 13, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_start_of_day() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 5, 17, 45, 12).unwrap();
        assert_eq!(start_of_day(dt), Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap());
    }
}
