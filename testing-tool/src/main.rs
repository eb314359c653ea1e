use anyhow::{anyhow, Result};
use colored::*;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use std::io::{self, Write};

/// Contexto de la sesión: lo último que se creó contra el servidor
#[derive(Debug, Default)]
struct Session {
    route_id: Option<String>,
    schedule_id: Option<String>,
    booking_number: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("{}", "🚌 Shiteni Transit Testing Tool".bright_blue().bold());
    println!("{}", "=====================================".bright_blue());
    println!();

    let base_url = prompt("URL del servidor [http://localhost:3000]: ")?;
    let base_url = if base_url.is_empty() {
        "http://localhost:3000".to_string()
    } else {
        base_url.trim_end_matches('/').to_string()
    };

    let client = Client::new();
    let mut session = Session::default();

    loop {
        println!();
        println!("{}", "📋 MENÚ PRINCIPAL".bright_green().bold());
        println!("{}", "==================".bright_green());
        println!("1. 💓 Health check");
        println!("2. 🛣️  Crear ruta y salida de prueba");
        println!("3. 💰 Cotizar tarifa");
        println!("4. 🎫 Crear reserva");
        println!("5. 🔄 Aplicar acción a la reserva");
        println!("6. 🏁 Flujo completo");
        println!("7. 🚪 Salir");
        let choice = prompt("Selecciona una opción (1-7): ")?;

        let result = match choice.as_str() {
            "1" => health(&client, &base_url).await,
            "2" => create_fixture(&client, &base_url, &mut session).await,
            "3" => quote(&client, &base_url, &session).await,
            "4" => book(&client, &base_url, &mut session).await,
            "5" => {
                let action = prompt("Acción (confirm-payment / complete / cancel): ")?;
                booking_action(&client, &base_url, &session, &action).await
            }
            "6" => full_flow(&client, &base_url, &mut session).await,
            "7" => {
                println!("{}", "👋 ¡Hasta luego!".bright_green());
                break;
            }
            _ => {
                println!("{}", "❌ Opción inválida. Intenta de nuevo.".bright_red());
                Ok(())
            }
        };

        if let Err(e) = result {
            println!("{}", format!("❌ {}", e).bright_red());
        }
    }

    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label.bright_yellow());
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

async fn call(client: &Client, method: Method, url: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
    println!("{}", format!("📤 {} {}", method, url).bright_blue());

    let mut request = client.request(method, url);
    if let Some(body) = &body {
        println!("{}", serde_json::to_string_pretty(body)?);
        request = request.json(body);
    }

    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;
    let value: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));

    let label = format!("📥 {}", status);
    if status.is_success() {
        println!("{}", label.bright_green().bold());
    } else {
        println!("{}", label.bright_red().bold());
    }
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok((status, value))
}

fn expect_status(actual: StatusCode, expected: StatusCode) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(anyhow!("se esperaba {} y llegó {}", expected, actual))
    }
}

fn data_field(body: &Value, field: &str) -> Result<String> {
    body["data"][field]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow!("la respuesta no trae data.{}", field))
}

async fn health(client: &Client, base_url: &str) -> Result<()> {
    let (status, _) = call(client, Method::GET, &format!("{}/health", base_url), None).await?;
    expect_status(status, StatusCode::OK)
}

async fn create_fixture(client: &Client, base_url: &str, session: &mut Session) -> Result<()> {
    let suffix = unique_suffix();
    let route = json!({
        "name": "Lilongwe - Blantyre",
        "route_number": format!("SMOKE-{}", suffix),
        "stops": [
            { "name": "Lilongwe", "departure_time": "06:00" },
            { "name": "Dedza", "arrival_time": "07:10", "departure_time": "07:15" },
            { "name": "Ntcheu", "arrival_time": "08:30", "departure_time": "08:35" },
            { "name": "Blantyre", "arrival_time": "11:00" }
        ],
        "fare_segments": [
            { "from": "Lilongwe", "to": "Dedza", "amount": "3500" },
            { "from": "Dedza", "to": "Ntcheu", "amount": "2500" },
            { "from": "Ntcheu", "to": "Blantyre", "amount": "6000" }
        ],
        "fare": "15000"
    });
    let (status, body) = call(client, Method::POST, &format!("{}/api/routes", base_url), Some(route)).await?;
    expect_status(status, StatusCode::CREATED)?;
    let route_id = data_field(&body, "id")?;

    let schedule = json!({
        "route_id": route_id,
        "vehicle_id": "MW-SMOKE-01",
        "service_date": "2026-12-01",
        "departure_time": "2026-12-01T06:00:00Z",
        "arrival_time": "2026-12-01T11:00:00Z",
        "total_seats": 2
    });
    let (status, body) = call(client, Method::POST, &format!("{}/api/schedules", base_url), Some(schedule)).await?;
    expect_status(status, StatusCode::CREATED)?;

    session.schedule_id = Some(data_field(&body, "id")?);
    session.route_id = Some(route_id);
    println!("{}", "✅ Ruta y salida creadas".bright_green().bold());
    Ok(())
}

async fn quote(client: &Client, base_url: &str, session: &Session) -> Result<()> {
    let route_id = session
        .route_id
        .as_deref()
        .ok_or_else(|| anyhow!("primero crea una ruta (opción 2)"))?;
    let from = prompt("Parada de subida: ")?;
    let to = prompt("Parada de bajada: ")?;

    let url = format!("{}/api/routes/{}/fare", base_url, route_id);
    let response = client.get(&url).query(&[("from", from), ("to", to)]).send().await?;
    let status = response.status();
    let body: Value = response.json().await?;
    println!("{}", format!("📥 {}", status).bright_green().bold());
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

async fn book(client: &Client, base_url: &str, session: &mut Session) -> Result<()> {
    let schedule_id = session
        .schedule_id
        .clone()
        .ok_or_else(|| anyhow!("primero crea una salida (opción 2)"))?;
    let from = prompt("Parada de subida [Lilongwe]: ")?;
    let to = prompt("Parada de bajada [Blantyre]: ")?;
    let method = prompt("Método de pago (cash / mobile_money / card / bank_transfer) [mobile_money]: ")?;

    let booking = booking_body(
        &schedule_id,
        if from.is_empty() { "Lilongwe" } else { &from },
        if to.is_empty() { "Blantyre" } else { &to },
        if method.is_empty() { "mobile_money" } else { &method },
    );
    let (status, body) = call(client, Method::POST, &format!("{}/api/bookings", base_url), Some(booking)).await?;
    if status == StatusCode::CREATED {
        session.booking_number = Some(data_field(&body, "booking_number")?);
    }
    Ok(())
}

async fn booking_action(client: &Client, base_url: &str, session: &Session, action: &str) -> Result<()> {
    let number = session
        .booking_number
        .as_deref()
        .ok_or_else(|| anyhow!("primero crea una reserva (opción 4)"))?;
    let url = format!("{}/api/bookings/{}/{}", base_url, number, action);
    call(client, Method::POST, &url, None).await?;
    Ok(())
}

/// Recorre el flujo de reserva y comprueba los códigos esperados
async fn full_flow(client: &Client, base_url: &str, session: &mut Session) -> Result<()> {
    health(client, base_url).await?;
    create_fixture(client, base_url, session).await?;
    let schedule_id = session
        .schedule_id
        .clone()
        .ok_or_else(|| anyhow!("salida no creada"))?;
    let bookings_url = format!("{}/api/bookings", base_url);

    let (status, body) = call(
        client,
        Method::POST,
        &bookings_url,
        Some(booking_body(&schedule_id, "Lilongwe", "Blantyre", "mobile_money")),
    )
    .await?;
    expect_status(status, StatusCode::CREATED)?;
    let number = data_field(&body, "booking_number")?;
    session.booking_number = Some(number.clone());

    let (status, _) = call(
        client,
        Method::POST,
        &bookings_url,
        Some(booking_body(&schedule_id, "Blantyre", "Lilongwe", "cash")),
    )
    .await?;
    expect_status(status, StatusCode::BAD_REQUEST)?;

    let (status, _) = call(
        client,
        Method::POST,
        &format!("{}/{}/confirm-payment", bookings_url, number),
        None,
    )
    .await?;
    expect_status(status, StatusCode::OK)?;

    let (status, _) = call(client, Method::POST, &format!("{}/{}/cancel", bookings_url, number), None).await?;
    expect_status(status, StatusCode::OK)?;

    let (status, body) = call(client, Method::GET, &format!("{}/api/schedules/{}", base_url, schedule_id), None).await?;
    expect_status(status, StatusCode::OK)?;
    if body["data"]["available_seats"] != json!(2) {
        return Err(anyhow!("el asiento no se liberó tras cancelar"));
    }

    println!("{}", "🏁 Flujo completo OK".bright_green().bold());
    Ok(())
}

fn booking_body(schedule_id: &str, from: &str, to: &str, method: &str) -> Value {
    json!({
        "schedule_id": schedule_id,
        "passenger_name": "Smoke Tester",
        "passenger_email": "smoke@example.com",
        "passenger_phone": "+265 991 000 111",
        "boarding_stop": from,
        "alighting_stop": to,
        "payment_method": method
    })
}

fn unique_suffix() -> String {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("{}", millis % 1_000_000)
}
