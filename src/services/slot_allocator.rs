//! Asignación de horarios de visita
//!
//! Regla: al agendar una visita a una hora, se bloquean automáticamente
//! las horas vecinas. Una visita ocupa un bloque de 3 horas desde su
//! inicio, así que un candidato choca cuando |existente - candidato| < 3h.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use crate::models::visit::{Visit, VisitStatus};

/// Ancho de la ventana de exclusión alrededor de cada visita
pub fn exclusion_window() -> Duration {
    Duration::hours(3)
}

/// Slots ofrecidos dentro del día laboral
pub const DAY_SLOTS: [&str; 13] = [
    "08:00", "09:00", "10:00", "11:00", "12:00", "13:00", "14:00", "15:00", "16:00", "17:00",
    "18:00", "19:00", "20:00",
];

/// ¿El inicio existente bloquea al candidato?
pub fn conflicts_with(existing: DateTime<Utc>, candidate: DateTime<Utc>) -> bool {
    let diff = (existing - candidate).abs();
    diff < exclusion_window()
}

/// Conflicto encontrado contra una visita ya agendada
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotConflict {
    pub visit_id: Uuid,
    pub visit_date: DateTime<Utc>,
}

/// Buscar la primera visita no cancelada que bloquee al candidato
pub fn find_conflict(visits: &[Visit], candidate: DateTime<Utc>) -> Option<SlotConflict> {
    visits
        .iter()
        .filter(|v| !v.status.is_cancelled())
        .find(|v| conflicts_with(v.visit_date, candidate))
        .map(|v| SlotConflict {
            visit_id: v.id,
            visit_date: v.visit_date,
        })
}

/// Filtrar los slots del día que no chocan con ninguna visita no cancelada.
/// `visits` debe venir ya acotado al día consultado.
pub fn filter_available_slots(date: NaiveDate, visits: &[Visit]) -> Vec<String> {
    let active: Vec<DateTime<Utc>> = visits
        .iter()
        .filter(|v| !v.status.is_cancelled())
        .map(|v| v.visit_date)
        .collect();

    DAY_SLOTS
        .iter()
        .filter_map(|slot| {
            let time = NaiveTime::parse_from_str(slot, "%H:%M").ok()?;
            let slot_date = Utc.from_utc_datetime(&date.and_time(time));
            if active.iter().any(|v| conflicts_with(*v, slot_date)) {
                None
            } else {
                Some((*slot).to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn visit_at(dt: DateTime<Utc>, status: VisitStatus) -> Visit {
        Visit {
            id: Uuid::new_v4(),
            user_id: None,
            guest_name: Some("Invitado".to_string()),
            guest_email: Some("guest@test.com".to_string()),
            guest_phone: Some("3000000000".to_string()),
            visit_date: dt,
            visit_time: None,
            address: "Calle 1".to_string(),
            status,
            service_ids: Vec::new(),
            description: None,
            created_at: Utc::now(),
        }
    }

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 10, h, 0, 0).unwrap()
    }

    #[test]
    fn test_blocks_next_two_hours_both_sides() {
        let existing = at(10);
        assert!(conflicts_with(existing, at(10)));
        assert!(conflicts_with(existing, at(11)));
        assert!(conflicts_with(existing, at(12)));
        assert!(!conflicts_with(existing, at(13)));
        assert!(conflicts_with(existing, at(8)));
        assert!(!conflicts_with(existing, at(7)));
    }

    #[test]
    fn test_exact_window_edge_is_free() {
        // |existente - candidato| == 3h no bloquea (la ventana es abierta)
        let existing = at(10);
        assert!(!conflicts_with(existing, at(13)));
        assert!(!conflicts_with(existing, at(7)));
    }

    #[test]
    fn test_find_conflict_skips_cancelled() {
        let visits = vec![visit_at(at(10), VisitStatus::Cancelada)];
        assert!(find_conflict(&visits, at(11)).is_none());

        let visits = vec![visit_at(at(10), VisitStatus::Pendiente)];
        let conflict = find_conflict(&visits, at(11)).unwrap();
        assert_eq!(conflict.visit_date, at(10));
    }

    #[test]
    fn test_available_slots_around_one_visit() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        let visits = vec![visit_at(at(10), VisitStatus::Confirmada)];

        let available = filter_available_slots(date, &visits);

        // 08:00-12:00 bloqueados (±3h de las 10:00), el resto libre
        assert!(!available.contains(&"08:00".to_string()));
        assert!(!available.contains(&"09:00".to_string()));
        assert!(!available.contains(&"10:00".to_string()));
        assert!(!available.contains(&"11:00".to_string()));
        assert!(!available.contains(&"12:00".to_string()));
        assert!(available.contains(&"13:00".to_string()));
        assert!(available.contains(&"20:00".to_string()));
        assert_eq!(available.len(), 8);
    }

    #[test]
    fn test_pairwise_distance_holds_after_sequential_bookings() {
        // Simula la secuencia de reservas del flujo real: cada candidato se
        // acepta solo si no choca; al final toda pareja respeta las 3 horas.
        let date_candidates = [at(10), at(11), at(12), at(13), at(16), at(17)];
        let mut booked: Vec<Visit> = Vec::new();

        for candidate in date_candidates {
            if find_conflict(&booked, candidate).is_none() {
                booked.push(visit_at(candidate, VisitStatus::Pendiente));
            }
        }

        let starts: Vec<DateTime<Utc>> = booked.iter().map(|v| v.visit_date).collect();
        assert_eq!(starts, vec![at(10), at(13), at(16)]);

        for (i, a) in starts.iter().enumerate() {
            for b in starts.iter().skip(i + 1) {
                assert!((*a - *b).abs() >= exclusion_window());
            }
        }
    }
}
