use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::route::{FareSegment, Route, RouteStatus, Stop};
use crate::services::fare_calculator::{missing_adjacent_segments, FareBasis, FareQuote};
use crate::utils::validation::{
    validate_amount, validate_coordinates, validate_not_empty, validate_time_of_day,
};

// Request para crear una ruta con sus paradas y tramos
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRouteRequest {
    #[validate(length(min = 2, max = 120), custom = "validate_not_empty")]
    pub name: String,

    #[validate(length(min = 1, max = 20), custom = "validate_not_empty")]
    pub route_number: String,

    #[validate]
    pub stops: Vec<StopInput>,

    #[serde(default)]
    #[validate]
    pub fare_segments: Vec<FareSegmentInput>,

    /// Tarifa plana de respaldo
    #[serde(default)]
    #[validate(custom = "validate_amount")]
    pub fare: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_stop_coordinates"))]
pub struct StopInput {
    #[validate(length(min = 1, max = 100), custom = "validate_not_empty")]
    pub name: String,

    #[validate(length(max = 255))]
    pub address: Option<String>,

    pub latitude: Option<f64>,

    pub longitude: Option<f64>,

    #[validate(custom = "validate_time_of_day")]
    pub arrival_time: Option<String>,

    #[validate(custom = "validate_time_of_day")]
    pub departure_time: Option<String>,

    pub order: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FareSegmentInput {
    #[validate(length(min = 1, max = 100), custom = "validate_not_empty")]
    pub from: String,

    #[validate(length(min = 1, max = 100), custom = "validate_not_empty")]
    pub to: String,

    #[validate(custom = "validate_amount")]
    pub amount: Decimal,
}

fn validate_stop_coordinates(stop: &StopInput) -> Result<(), ValidationError> {
    match (stop.latitude, stop.longitude) {
        (Some(lat), Some(lng)) => validate_coordinates(lat, lng),
        (None, None) => Ok(()),
        _ => Err(ValidationError::new("coordinates_incomplete")),
    }
}

impl From<StopInput> for Stop {
    fn from(input: StopInput) -> Self {
        Self {
            name: input.name.trim().to_string(),
            address: input.address,
            latitude: input.latitude,
            longitude: input.longitude,
            arrival_time: input.arrival_time,
            departure_time: input.departure_time,
            order: input.order,
        }
    }
}

impl From<FareSegmentInput> for FareSegment {
    fn from(input: FareSegmentInput) -> Self {
        Self {
            from: input.from.trim().to_string(),
            to: input.to.trim().to_string(),
            amount: input.amount,
        }
    }
}

// Request para cambiar el estado de una ruta
#[derive(Debug, Deserialize)]
pub struct UpdateRouteStatusRequest {
    pub status: RouteStatus,
}

/// Filtros del listado de rutas
#[derive(Debug, Deserialize)]
pub struct RouteFilters {
    pub status: Option<RouteStatus>,
}

/// Parámetros de consulta de tarifa
#[derive(Debug, Deserialize)]
pub struct FareQuery {
    pub from: String,
    pub to: String,
    pub schedule_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UnpricedPair {
    pub from: String,
    pub to: String,
}

// Response de ruta con paradas en orden de recorrido
#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub id: Uuid,
    pub name: String,
    pub route_number: String,
    pub status: RouteStatus,
    pub fare: Decimal,
    pub stops: Vec<Stop>,
    pub fare_segments: Vec<FareSegment>,
    /// Pares adyacentes sin tramo; su precio cae a la tarifa plana
    pub unpriced_pairs: Vec<UnpricedPair>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Route> for RouteResponse {
    fn from(route: Route) -> Self {
        let stops = route.ordered_stops().into_iter().cloned().collect();
        let unpriced_pairs = missing_adjacent_segments(&route.stops, &route.fare_segments)
            .into_iter()
            .map(|(from, to)| UnpricedPair { from, to })
            .collect();

        Self {
            id: route.id,
            name: route.name,
            route_number: route.route_number,
            status: route.status,
            fare: route.fare,
            stops,
            fare_segments: route.fare_segments,
            unpriced_pairs,
            created_at: route.created_at,
            updated_at: route.updated_at,
        }
    }
}

// Response de consulta de tarifa
#[derive(Debug, Serialize)]
pub struct FareQuoteResponse {
    pub route_id: Uuid,
    pub schedule_id: Option<Uuid>,
    pub boarding_stop: String,
    pub alighting_stop: String,
    pub amount: Decimal,
    pub chargeable: bool,
    /// La tarifa no sale de la tabla de tramos
    pub degraded: bool,
    pub basis: FareBasis,
    pub explanation: String,
}

impl FareQuoteResponse {
    pub fn new(
        route_id: Uuid,
        schedule_id: Option<Uuid>,
        boarding_stop: String,
        alighting_stop: String,
        quote: FareQuote,
    ) -> Self {
        Self {
            route_id,
            schedule_id,
            boarding_stop,
            alighting_stop,
            amount: quote.amount,
            chargeable: quote.is_chargeable(),
            degraded: quote.basis.is_degraded(),
            explanation: quote.basis.describe(),
            basis: quote.basis,
        }
    }
}
