//! Máquina de estados del pedido
//!
//! El estado se deriva del pagado contra el total con umbrales fijos:
//! 100% completa el pedido, 30% arranca producción, cualquier abono deja
//! el pedido en abono parcial. `production_started_at` se fija una sola
//! vez al cruzar el 30% y no se toca después.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::order::OrderStatus;
use crate::services::order_totals::Totals;

/// Fracción del total que habilita producción
pub fn production_threshold(total: Decimal) -> Decimal {
    total * Decimal::new(3, 1)
}

/// Derivar el estado a partir de total y pagado.
///
/// Un pedido con total 0 queda `Completado` de inmediato (0 >= 0); se
/// conserva el comportamiento observado del sistema original.
pub fn derive_status(total: Decimal, paid: Decimal) -> OrderStatus {
    if paid >= total {
        OrderStatus::Completado
    } else if paid >= production_threshold(total) {
        OrderStatus::EnProceso
    } else if paid > Decimal::ZERO {
        OrderStatus::AbonoParcial
    } else {
        OrderStatus::Pendiente
    }
}

/// Resultado de recalcular el estado tras un cambio de pagos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: OrderStatus,
    pub production_started_at: Option<DateTime<Utc>>,
}

/// Recalcular estado y sello de inicio de producción. El sello existente
/// nunca se limpia ni se reemplaza.
pub fn recompute(
    totals: &Totals,
    current_production_started_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> StatusUpdate {
    let status = derive_status(totals.total, totals.paid);

    let production_started_at = match status {
        OrderStatus::EnProceso | OrderStatus::Completado => {
            Some(current_production_started_at.unwrap_or(now))
        }
        _ => current_production_started_at,
    };

    StatusUpdate {
        status,
        production_started_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn totals(total: i64, paid: i64) -> Totals {
        Totals {
            total: Decimal::from(total),
            paid: Decimal::from(paid),
            restante: Decimal::from(total - paid),
        }
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(derive_status(Decimal::from(100), Decimal::ZERO), OrderStatus::Pendiente);
        assert_eq!(derive_status(Decimal::from(100), Decimal::from(29)), OrderStatus::AbonoParcial);
        assert_eq!(derive_status(Decimal::from(100), Decimal::from(30)), OrderStatus::EnProceso);
        assert_eq!(derive_status(Decimal::from(100), Decimal::from(99)), OrderStatus::EnProceso);
        assert_eq!(derive_status(Decimal::from(100), Decimal::from(100)), OrderStatus::Completado);
        assert_eq!(derive_status(Decimal::from(100), Decimal::from(150)), OrderStatus::Completado);
    }

    #[test]
    fn test_zero_total_is_completed() {
        assert_eq!(derive_status(Decimal::ZERO, Decimal::ZERO), OrderStatus::Completado);
    }

    #[test]
    fn test_status_is_monotonic_in_paid() {
        fn rank(s: OrderStatus) -> u8 {
            match s {
                OrderStatus::Pendiente => 0,
                OrderStatus::AbonoParcial => 1,
                OrderStatus::EnProceso => 2,
                OrderStatus::Completado => 3,
                OrderStatus::Cancelado => unreachable!(),
            }
        }

        let total = Decimal::from(1000);
        let mut last = 0;
        for paid in 0..=1200 {
            let r = rank(derive_status(total, Decimal::from(paid)));
            assert!(r >= last, "status regressed at paid={}", paid);
            last = r;
        }
    }

    #[test]
    fn test_production_start_set_once() {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2026, 1, 20, 9, 0, 0).unwrap();

        // Cruza el 30%: se sella con la hora actual
        let first = recompute(&totals(100, 30), None, t0);
        assert_eq!(first.status, OrderStatus::EnProceso);
        assert_eq!(first.production_started_at, Some(t0));

        // Más pagos después: el sello no cambia
        let second = recompute(&totals(100, 100), first.production_started_at, t1);
        assert_eq!(second.status, OrderStatus::Completado);
        assert_eq!(second.production_started_at, Some(t0));
    }

    #[test]
    fn test_production_start_survives_payment_removal() {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap();
        let sealed = recompute(&totals(100, 40), None, t0);

        // Si un pago se elimina y el pagado cae bajo el umbral, el estado
        // baja pero el sello de producción permanece.
        let t1 = Utc.with_ymd_and_hms(2026, 1, 11, 9, 0, 0).unwrap();
        let after = recompute(&totals(100, 10), sealed.production_started_at, t1);
        assert_eq!(after.status, OrderStatus::AbonoParcial);
        assert_eq!(after.production_started_at, Some(t0));
    }
}
