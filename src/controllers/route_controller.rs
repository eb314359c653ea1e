use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::dto::route_dto::{CreateRouteRequest, FareQuery, FareQuoteResponse, RouteResponse};
use crate::dto::ApiResponse;
use crate::models::route::{FareSegment, Route, RouteStatus, Stop};
use crate::models::schedule::Schedule;
use crate::repositories::{RouteRepository, ScheduleRepository};
use crate::services::fare_calculator::{missing_adjacent_segments, quote_route};
use crate::services::route_cache_service::RouteCacheService;
use crate::state::AppState;
use crate::utils::errors::{conflict_error, not_found_error, validation_error, AppError, AppResult};

pub struct RouteController {
    routes: Arc<dyn RouteRepository>,
    schedules: Arc<dyn ScheduleRepository>,
    cache: RouteCacheService,
}

impl RouteController {
    pub fn new(state: &AppState) -> Self {
        Self {
            routes: state.routes.clone(),
            schedules: state.schedules.clone(),
            cache: state.route_cache.clone(),
        }
    }

    pub async fn create(&self, request: CreateRouteRequest) -> AppResult<ApiResponse<RouteResponse>> {
        request.validate()?;

        let stops: Vec<Stop> = request.stops.into_iter().map(Stop::from).collect();
        let fare_segments: Vec<FareSegment> = request.fare_segments.into_iter().map(FareSegment::from).collect();
        validate_route_layout(&stops, &fare_segments)?;

        let route_number = request.route_number.trim().to_string();
        if self.routes.route_number_exists(&route_number).await? {
            return Err(conflict_error("Route", "route_number", &route_number));
        }

        let route = Route::new(
            request.name.trim().to_string(),
            route_number,
            stops,
            fare_segments,
            request.fare,
        );

        // Los pares sin tramo no bloquean el alta, pero caen a tarifa plana
        let missing = missing_adjacent_segments(&route.stops, &route.fare_segments);
        if !missing.is_empty() {
            warn!(
                "⚠️ Ruta {} sin tramo para {} pares adyacentes: {:?}",
                route.route_number,
                missing.len(),
                missing
            );
        }

        let route = self.routes.create(&route).await?;
        info!("🚌 Ruta {} creada con {} paradas", route.route_number, route.stops.len());

        Ok(ApiResponse::success_with_message(
            RouteResponse::from(route),
            "Ruta creada exitosamente".to_string(),
        ))
    }

    pub async fn list(&self, status: Option<RouteStatus>) -> AppResult<Vec<RouteResponse>> {
        let routes = self.routes.list(status).await?;
        Ok(routes.into_iter().map(RouteResponse::from).collect())
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<RouteResponse> {
        self.load(id).await.map(RouteResponse::from)
    }

    pub async fn update_status(&self, id: Uuid, status: RouteStatus) -> AppResult<ApiResponse<RouteResponse>> {
        let route = self
            .routes
            .update_status(id, status)
            .await?
            .ok_or_else(|| not_found_error("Route", &id.to_string()))?;

        self.cache.invalidate(id).await;
        info!("🔄 Ruta {} ahora está {}", route.route_number, status.as_str());

        Ok(ApiResponse::success_with_message(
            RouteResponse::from(route),
            "Estado de la ruta actualizado".to_string(),
        ))
    }

    /// Cotiza un viaje entre dos paradas; con `schedule_id` aplica la tarifa
    /// plana propia de esa salida.
    pub async fn quote(&self, id: Uuid, query: FareQuery) -> AppResult<FareQuoteResponse> {
        let route = self.load(id).await?;

        let schedule_fare = match query.schedule_id {
            Some(schedule_id) => {
                let schedule = self.schedule_of_route(&route, schedule_id).await?;
                schedule.fare
            }
            None => None,
        };

        let boarding = query.from.trim().to_string();
        let alighting = query.to.trim().to_string();
        let quote = quote_route(&route, schedule_fare, &boarding, &alighting);

        Ok(FareQuoteResponse::new(route.id, query.schedule_id, boarding, alighting, quote))
    }

    pub async fn list_schedules(&self, id: Uuid) -> AppResult<Vec<Schedule>> {
        let route = self.load(id).await?;
        self.schedules.list_by_route(route.id).await
    }

    async fn load(&self, id: Uuid) -> AppResult<Route> {
        self.cache
            .get(id)
            .await?
            .ok_or_else(|| not_found_error("Route", &id.to_string()))
    }

    async fn schedule_of_route(&self, route: &Route, schedule_id: Uuid) -> AppResult<Schedule> {
        let schedule = self
            .schedules
            .find_by_id(schedule_id)
            .await?
            .ok_or_else(|| not_found_error("Schedule", &schedule_id.to_string()))?;

        if schedule.route_id != route.id {
            return Err(AppError::BadRequest(format!(
                "Schedule {} does not belong to route {}",
                schedule_id, route.route_number
            )));
        }
        Ok(schedule)
    }
}

/// Reglas de la ruta que cruzan campos: al menos dos paradas con nombres
/// únicos y tramos que solo referencian paradas de la ruta.
fn validate_route_layout(stops: &[Stop], fare_segments: &[FareSegment]) -> AppResult<()> {
    if stops.len() < 2 {
        return Err(validation_error("stops", "A route needs at least two stops"));
    }

    let mut names = HashSet::new();
    for stop in stops {
        if stop.name.is_empty() {
            return Err(validation_error("stops", "Stop names cannot be empty"));
        }
        if !names.insert(stop.name.as_str()) {
            return Err(validation_error("stops", &format!("Duplicate stop name '{}'", stop.name)));
        }
    }

    for segment in fare_segments {
        for endpoint in [&segment.from, &segment.to] {
            if !names.contains(endpoint.as_str()) {
                return Err(validation_error(
                    "fare_segments",
                    &format!("Segment endpoint '{}' is not a stop of this route", endpoint),
                ));
            }
        }
        if segment.from == segment.to {
            return Err(validation_error(
                "fare_segments",
                &format!("Segment '{}' -> '{}' has no length", segment.from, segment.to),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn stop(name: &str) -> Stop {
        Stop {
            name: name.to_string(),
            address: None,
            latitude: None,
            longitude: None,
            arrival_time: None,
            departure_time: None,
            order: None,
        }
    }

    fn segment(from: &str, to: &str) -> FareSegment {
        FareSegment {
            from: from.to_string(),
            to: to.to_string(),
            amount: Decimal::from(10),
        }
    }

    #[test]
    fn test_layout_accepts_valid_route() {
        let stops = vec![stop("A"), stop("B"), stop("C")];
        assert!(validate_route_layout(&stops, &[segment("A", "B"), segment("A", "C")]).is_ok());
    }

    #[test]
    fn test_layout_rejects_single_stop() {
        assert!(matches!(
            validate_route_layout(&[stop("A")], &[]),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_layout_rejects_duplicate_names() {
        let stops = vec![stop("A"), stop("B"), stop("A")];
        assert!(validate_route_layout(&stops, &[]).is_err());
    }

    #[test]
    fn test_layout_rejects_foreign_segment_endpoint() {
        let stops = vec![stop("A"), stop("B")];
        assert!(validate_route_layout(&stops, &[segment("A", "Zomba")]).is_err());
        assert!(validate_route_layout(&stops, &[segment("B", "B")]).is_err());
    }
}
