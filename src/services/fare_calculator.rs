//! Cálculo de tarifas por tramos
//!
//! Dada una parada de subida y otra de bajada, calcula el importe a cobrar
//! sobre la lista ordenada de paradas de la ruta y su tabla de tramos.
//!
//! Política (en este orden):
//!
//! 1. Parada desconocida, trayecto de longitud cero o sentido inverso:
//!    tarifa 0, nunca error.
//! 2. Tramo directo `(subida, bajada)` definido: su importe.
//! 3. Todos los pares adyacentes del trayecto tienen tramo: la suma.
//! 4. Faltan tramos: tarifa plana (la de la salida si existe, si no la de
//!    la ruta). Sin tarifa plana positiva la tarifa queda en 0.
//!
//! Toda rama degradada se registra con `warn!` pero no se reporta como
//! error al llamador.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::route::{travel_order, FareSegment, Route, Stop};

/// Rama de la política que produjo la tarifa
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FareBasis {
    /// Tramo definido exactamente para el par pedido
    DirectSegment,
    /// Suma de tramos adyacentes a lo largo del recorrido
    AdjacentSegments { segments: usize },
    /// Faltan tramos adyacentes; se cobra la tarifa plana
    FlatFare { missing_segments: usize },
    /// Faltan tramos y no hay tarifa plana positiva
    Unpriced { missing_segments: usize },
    UnknownStop { stop: String },
    ZeroLength,
    ReverseDirection,
}

impl FareBasis {
    pub fn is_degraded(&self) -> bool {
        !matches!(self, FareBasis::DirectSegment | FareBasis::AdjacentSegments { .. })
    }

    pub fn describe(&self) -> String {
        match self {
            FareBasis::DirectSegment => "direct fare segment".to_string(),
            FareBasis::AdjacentSegments { segments } => {
                format!("sum of {} adjacent fare segments", segments)
            }
            FareBasis::FlatFare { missing_segments } => {
                format!("flat fare ({} fare segments missing)", missing_segments)
            }
            FareBasis::Unpriced { missing_segments } => {
                format!("no fare available ({} fare segments missing)", missing_segments)
            }
            FareBasis::UnknownStop { stop } => format!("stop '{}' is not on this route", stop),
            FareBasis::ZeroLength => "boarding and alighting stops are the same".to_string(),
            FareBasis::ReverseDirection => {
                "alighting stop comes before boarding stop".to_string()
            }
        }
    }
}

/// Resultado del cálculo
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FareQuote {
    pub amount: Decimal,
    pub basis: FareBasis,
}

impl FareQuote {
    fn zero(basis: FareBasis) -> Self {
        Self {
            amount: Decimal::ZERO,
            basis,
        }
    }

    /// Una tarifa solo se puede cobrar si es positiva
    pub fn is_chargeable(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

/// Tabla de tramos indexada por `from` y luego `to`. Ante duplicados gana
/// el primero en el orden de la tabla.
struct SegmentTable<'a> {
    by_origin: HashMap<&'a str, HashMap<&'a str, Decimal>>,
}

impl<'a> SegmentTable<'a> {
    fn new(segments: &'a [FareSegment]) -> Self {
        let mut by_origin: HashMap<&'a str, HashMap<&'a str, Decimal>> = HashMap::new();
        for segment in segments {
            by_origin
                .entry(segment.from.as_str())
                .or_default()
                .entry(segment.to.as_str())
                .or_insert(segment.amount);
        }
        Self { by_origin }
    }

    fn get(&self, from: &str, to: &str) -> Option<Decimal> {
        self.by_origin.get(from)?.get(to).copied()
    }
}

/// Calcula la tarifa de un trayecto. Función pura, nunca falla.
pub fn calculate_fare(
    stops: &[Stop],
    fare_segments: &[FareSegment],
    flat_fare: Option<Decimal>,
    boarding_stop: &str,
    alighting_stop: &str,
) -> FareQuote {
    let ordered = travel_order(stops);
    let position = |name: &str| ordered.iter().position(|s| s.name == name);

    let (from_idx, to_idx) = match (position(boarding_stop), position(alighting_stop)) {
        (Some(from), Some(to)) => (from, to),
        (None, _) => {
            return degraded(FareQuote::zero(FareBasis::UnknownStop {
                stop: boarding_stop.to_string(),
            }), boarding_stop, alighting_stop)
        }
        (_, None) => {
            return degraded(FareQuote::zero(FareBasis::UnknownStop {
                stop: alighting_stop.to_string(),
            }), boarding_stop, alighting_stop)
        }
    };

    if from_idx == to_idx {
        return degraded(FareQuote::zero(FareBasis::ZeroLength), boarding_stop, alighting_stop);
    }
    if from_idx > to_idx {
        return degraded(
            FareQuote::zero(FareBasis::ReverseDirection),
            boarding_stop,
            alighting_stop,
        );
    }

    let table = SegmentTable::new(fare_segments);

    if let Some(amount) = table.get(boarding_stop, alighting_stop) {
        debug!("💰 Tramo directo {} -> {}: {}", boarding_stop, alighting_stop, amount);
        return FareQuote {
            amount,
            basis: FareBasis::DirectSegment,
        };
    }

    let mut total = Decimal::ZERO;
    let mut missing_segments = 0;
    for pair in ordered[from_idx..=to_idx].windows(2) {
        match table.get(&pair[0].name, &pair[1].name) {
            Some(amount) => total += amount,
            None => missing_segments += 1,
        }
    }

    if missing_segments == 0 {
        let segments = to_idx - from_idx;
        debug!(
            "💰 Suma de {} tramos {} -> {}: {}",
            segments, boarding_stop, alighting_stop, total
        );
        return FareQuote {
            amount: total,
            basis: FareBasis::AdjacentSegments { segments },
        };
    }

    let quote = match flat_fare.filter(|fare| *fare > Decimal::ZERO) {
        Some(amount) => FareQuote {
            amount,
            basis: FareBasis::FlatFare { missing_segments },
        },
        None => FareQuote::zero(FareBasis::Unpriced { missing_segments }),
    };
    degraded(quote, boarding_stop, alighting_stop)
}

/// Calcula la tarifa sobre una ruta, con la tarifa plana de la salida
/// (si la hay) por delante de la de la ruta.
pub fn quote_route(
    route: &Route,
    schedule_fare: Option<Decimal>,
    boarding_stop: &str,
    alighting_stop: &str,
) -> FareQuote {
    let flat_fare = schedule_fare
        .filter(|fare| *fare > Decimal::ZERO)
        .or(Some(route.fare));
    calculate_fare(
        &route.stops,
        &route.fare_segments,
        flat_fare,
        boarding_stop,
        alighting_stop,
    )
}

/// Pares adyacentes del recorrido sin tramo definido
pub fn missing_adjacent_segments(stops: &[Stop], fare_segments: &[FareSegment]) -> Vec<(String, String)> {
    let table = SegmentTable::new(fare_segments);
    travel_order(stops)
        .windows(2)
        .filter(|pair| table.get(&pair[0].name, &pair[1].name).is_none())
        .map(|pair| (pair[0].name.clone(), pair[1].name.clone()))
        .collect()
}

fn degraded(quote: FareQuote, boarding_stop: &str, alighting_stop: &str) -> FareQuote {
    warn!(
        "⚠️ Tarifa degradada {} -> {}: {} (importe {})",
        boarding_stop,
        alighting_stop,
        quote.basis.describe(),
        quote.amount
    );
    quote
}
