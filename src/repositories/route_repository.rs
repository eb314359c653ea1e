use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{map_unique_violation, RouteRepository};
use crate::models::route::{FareSegment, Route, RouteStatus, Stop};
use crate::utils::errors::AppResult;

/// Fila de la tabla routes; paradas y tramos van en columnas JSONB
#[derive(Debug, FromRow)]
struct RouteRow {
    id: Uuid,
    name: String,
    route_number: String,
    stops: Json<Vec<Stop>>,
    fare_segments: Json<Vec<FareSegment>>,
    fare: Decimal,
    status: RouteStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RouteRow> for Route {
    fn from(row: RouteRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            route_number: row.route_number,
            stops: row.stops.0,
            fare_segments: row.fare_segments.0,
            fare: row.fare,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgRouteRepository {
    pool: PgPool,
}

impl PgRouteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RouteRepository for PgRouteRepository {
    async fn create(&self, route: &Route) -> AppResult<Route> {
        let row = sqlx::query_as::<_, RouteRow>(
            r#"
            INSERT INTO routes (
                id, name, route_number, stops, fare_segments, fare, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(route.id)
        .bind(&route.name)
        .bind(&route.route_number)
        .bind(Json(&route.stops))
        .bind(Json(&route.fare_segments))
        .bind(route.fare)
        .bind(route.status)
        .bind(route.created_at)
        .bind(route.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, format!("Route number '{}' already exists", route.route_number))
        })?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Route>> {
        let row = sqlx::query_as::<_, RouteRow>("SELECT * FROM routes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Route::from))
    }

    async fn route_number_exists(&self, route_number: &str) -> AppResult<bool> {
        let result: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM routes WHERE route_number = $1)")
                .bind(route_number)
                .fetch_one(&self.pool)
                .await?;

        Ok(result.0)
    }

    async fn list(&self, status: Option<RouteStatus>) -> AppResult<Vec<Route>> {
        let rows = sqlx::query_as::<_, RouteRow>(
            r#"
            SELECT * FROM routes
            WHERE ($1::route_status IS NULL OR status = $1)
            ORDER BY route_number
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Route::from).collect())
    }

    async fn update_status(&self, id: Uuid, status: RouteStatus) -> AppResult<Option<Route>> {
        let row = sqlx::query_as::<_, RouteRow>(
            r#"
            UPDATE routes
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Route::from))
    }
}
