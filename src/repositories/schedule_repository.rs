use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::ScheduleRepository;
use crate::models::schedule::{Schedule, ScheduleStatus};
use crate::utils::errors::AppResult;

pub struct PgScheduleRepository {
    pool: PgPool,
}

impl PgScheduleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleRepository for PgScheduleRepository {
    async fn create(&self, schedule: &Schedule) -> AppResult<Schedule> {
        let result = sqlx::query_as::<_, Schedule>(
            r#"
            INSERT INTO schedules (
                id, route_id, vehicle_id, service_date, departure_time, arrival_time,
                total_seats, available_seats, fare, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(schedule.id)
        .bind(schedule.route_id)
        .bind(&schedule.vehicle_id)
        .bind(schedule.service_date)
        .bind(schedule.departure_time)
        .bind(schedule.arrival_time)
        .bind(schedule.total_seats)
        .bind(schedule.available_seats)
        .bind(schedule.fare)
        .bind(schedule.status)
        .bind(schedule.created_at)
        .bind(schedule.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Schedule>> {
        let result = sqlx::query_as::<_, Schedule>("SELECT * FROM schedules WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(result)
    }

    async fn list_by_route(&self, route_id: Uuid) -> AppResult<Vec<Schedule>> {
        let result = sqlx::query_as::<_, Schedule>(
            "SELECT * FROM schedules WHERE route_id = $1 ORDER BY departure_time",
        )
        .bind(route_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(result)
    }

    async fn update_status(&self, id: Uuid, status: ScheduleStatus) -> AppResult<Option<Schedule>> {
        let result = sqlx::query_as::<_, Schedule>(
            r#"
            UPDATE schedules
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }
}
