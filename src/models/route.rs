//! Modelo de Route
//!
//! Una ruta de autobús con sus paradas ordenadas y su tabla de tramos
//! tarifarios. Paradas y tramos viajan embebidos en la ruta (columnas JSONB).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

/// Estado de la ruta - mapea al ENUM route_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "route_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RouteStatus {
    Active,
    Inactive,
    Maintenance,
}

impl RouteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteStatus::Active => "active",
            RouteStatus::Inactive => "inactive",
            RouteStatus::Maintenance => "maintenance",
        }
    }
}

/// Parada con nombre dentro de una ruta
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stop {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub arrival_time: Option<String>,
    #[serde(default)]
    pub departure_time: Option<String>,
    /// Posición explícita; si alguna parada no la trae se usa el índice
    #[serde(default)]
    pub order: Option<i32>,
}

/// Tramo tarifario dirigido `from -> to`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FareSegment {
    pub from: String,
    pub to: String,
    pub amount: Decimal,
}

/// Route principal - mapea a la tabla routes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Route {
    pub id: Uuid,
    pub name: String,
    pub route_number: String,
    pub stops: Vec<Stop>,
    pub fare_segments: Vec<FareSegment>,
    pub fare: Decimal,
    pub status: RouteStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Route {
    pub fn new(
        name: String,
        route_number: String,
        stops: Vec<Stop>,
        fare_segments: Vec<FareSegment>,
        fare: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            route_number,
            stops,
            fare_segments,
            fare,
            status: RouteStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Paradas en orden físico de recorrido (origen -> destino)
    pub fn ordered_stops(&self) -> Vec<&Stop> {
        travel_order(&self.stops)
    }

    pub fn is_active(&self) -> bool {
        self.status == RouteStatus::Active
    }
}

/// Resuelve el orden de recorrido de una lista de paradas.
///
/// Si todas las paradas traen `order` se ordenan por ese campo (orden estable
/// ante empates); en cualquier otro caso manda la posición en el array.
pub fn travel_order(stops: &[Stop]) -> Vec<&Stop> {
    let mut ordered: Vec<&Stop> = stops.iter().collect();
    if !stops.is_empty() && stops.iter().all(|s| s.order.is_some()) {
        ordered.sort_by_key(|s| s.order);
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(name: &str, order: Option<i32>) -> Stop {
        Stop {
            name: name.to_string(),
            address: None,
            latitude: None,
            longitude: None,
            arrival_time: None,
            departure_time: None,
            order,
        }
    }

    fn names<'a>(stops: &[&'a Stop]) -> Vec<&'a str> {
        stops.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_travel_order_uses_index_by_default() {
        let stops = vec![stop("Lilongwe", None), stop("Dedza", None), stop("Blantyre", None)];
        assert_eq!(names(&travel_order(&stops)), vec!["Lilongwe", "Dedza", "Blantyre"]);
    }

    #[test]
    fn test_travel_order_uses_explicit_order_when_complete() {
        let stops = vec![stop("Blantyre", Some(3)), stop("Lilongwe", Some(1)), stop("Dedza", Some(2))];
        assert_eq!(names(&travel_order(&stops)), vec!["Lilongwe", "Dedza", "Blantyre"]);
    }

    #[test]
    fn test_travel_order_ignores_partial_order() {
        let stops = vec![stop("Blantyre", Some(3)), stop("Lilongwe", None), stop("Dedza", Some(2))];
        assert_eq!(names(&travel_order(&stops)), vec!["Blantyre", "Lilongwe", "Dedza"]);
    }

    #[test]
    fn test_route_status_serde() {
        let json = serde_json::to_string(&RouteStatus::Maintenance).unwrap();
        assert_eq!(json, "\"maintenance\"");
        assert_eq!(RouteStatus::Maintenance.as_str(), "maintenance");
    }
}
