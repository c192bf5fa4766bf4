use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::visit::{Visit, VisitStatus};
use crate::services::slot_allocator;
use crate::utils::errors::AppError;

pub struct NewVisit {
    pub user_id: Option<Uuid>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub visit_date: DateTime<Utc>,
    pub visit_time: Option<String>,
    pub address: String,
    pub status: VisitStatus,
    pub service_ids: Vec<Uuid>,
    pub description: Option<String>,
}

pub struct VisitRepository {
    pool: PgPool,
}

impl VisitRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Crear la visita verificando el solape dentro de la misma transacción.
    /// La consulta de candidatos y el insert van juntos para cerrar la
    /// ventana entre chequeo y escritura; la regla de distancia vive en
    /// `slot_allocator`.
    pub async fn create_checked(&self, new_visit: NewVisit) -> Result<Visit, AppError> {
        let mut tx = self.pool.begin().await?;

        let window = slot_allocator::exclusion_window();
        let lower = new_visit.visit_date - window;
        let upper = new_visit.visit_date + window;

        let nearby = sqlx::query_as::<_, Visit>(
            r#"
            SELECT * FROM visits
            WHERE visit_date > $1 AND visit_date < $2
              AND status NOT IN ('cancelada', 'cancelado')
            ORDER BY visit_date
            "#,
        )
        .bind(lower)
        .bind(upper)
        .fetch_all(&mut *tx)
        .await?;

        if let Some(conflict) = slot_allocator::find_conflict(&nearby, new_visit.visit_date) {
            return Err(AppError::SlotConflict {
                conflict_visit_id: conflict.visit_id,
                conflict_visit_date: conflict.visit_date,
            });
        }

        let visit = sqlx::query_as::<_, Visit>(
            r#"
            INSERT INTO visits (id, user_id, guest_name, guest_email, guest_phone,
                                visit_date, visit_time, address, status, service_ids, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_visit.user_id)
        .bind(new_visit.guest_name)
        .bind(new_visit.guest_email)
        .bind(new_visit.guest_phone)
        .bind(new_visit.visit_date)
        .bind(new_visit.visit_time)
        .bind(new_visit.address)
        .bind(new_visit.status)
        .bind(new_visit.service_ids)
        .bind(new_visit.description)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(visit)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Visit>, AppError> {
        let visit = sqlx::query_as::<_, Visit>("SELECT * FROM visits WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(visit)
    }

    pub async fn list_all(&self) -> Result<Vec<Visit>, AppError> {
        let visits =
            sqlx::query_as::<_, Visit>("SELECT * FROM visits ORDER BY visit_date DESC")
                .fetch_all(&self.pool)
                .await?;

        Ok(visits)
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Visit>, AppError> {
        let visits = sqlx::query_as::<_, Visit>(
            "SELECT * FROM visits WHERE user_id = $1 ORDER BY visit_date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(visits)
    }

    /// Visitas del día consultado (para el listado de slots libres)
    pub async fn list_for_day(&self, date: NaiveDate) -> Result<Vec<Visit>, AppError> {
        let day_start = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap());
        let day_end = day_start + Duration::days(1);

        let visits = sqlx::query_as::<_, Visit>(
            r#"
            SELECT * FROM visits
            WHERE visit_date >= $1 AND visit_date < $2
            ORDER BY visit_date
            "#,
        )
        .bind(day_start)
        .bind(day_end)
        .fetch_all(&self.pool)
        .await?;

        Ok(visits)
    }

    pub async fn update(
        &self,
        id: Uuid,
        status: Option<VisitStatus>,
        address: Option<String>,
        description: Option<String>,
    ) -> Result<Option<Visit>, AppError> {
        let current = match self.find_by_id(id).await? {
            Some(v) => v,
            None => return Ok(None),
        };

        let visit = sqlx::query_as::<_, Visit>(
            r#"
            UPDATE visits
            SET status = $2, address = $3, description = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status.unwrap_or(current.status))
        .bind(address.unwrap_or(current.address))
        .bind(description.or(current.description))
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(visit))
    }
}
