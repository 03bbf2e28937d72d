use colored::*;
use serde_json::{json, Value};
use std::io::{self, Write};
use std::time::Duration;

struct Credentials {
    base_url: String,
    email: String,
    password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("{}", "🚌 Fleet Dashboard Testing Tool".bright_blue().bold());
    println!("{}", "=====================================".bright_blue());
    println!();

    let credentials = get_credentials()?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()?;

    let token = authenticate(&client, &credentials).await?;

    loop {
        println!();
        println!("{}", "📋 MENÚ PRINCIPAL".bright_green().bold());
        println!("{}", "==================".bright_green());
        println!("1. 🗺️  Observar mapa en vivo");
        println!("2. 🚗 Listar jeeps y conductores");
        println!("3. 📊 Resumen de analítica");
        println!("4. 🚪 Cerrar sesión y salir");
        print!("{}", "Selecciona una opción (1-4): ".bright_yellow());
        io::stdout().flush()?;

        let mut choice = String::new();
        io::stdin().read_line(&mut choice)?;

        match choice.trim() {
            "1" => watch_live_view(&client, &credentials, &token).await?,
            "2" => list_vehicles(&client, &credentials, &token).await?,
            "3" => analytics_summary(&client, &credentials, &token).await?,
            "4" => {
                post(&client, &credentials, &token, "/api/auth/logout").await?;
                println!("{}", "👋 ¡Hasta luego!".bright_green());
                break;
            }
            _ => println!("{}", "❌ Opción inválida. Intenta de nuevo.".bright_red()),
        }
    }

    Ok(())
}

fn prompt(label: &str, default: Option<&str>) -> anyhow::Result<String> {
    match default {
        Some(default) => print!("{} [{}]: ", label.bright_yellow(), default),
        None => print!("{}: ", label.bright_yellow()),
    }
    io::stdout().flush()?;

    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    let value = value.trim();
    Ok(match (value.is_empty(), default) {
        (true, Some(default)) => default.to_string(),
        _ => value.to_string(),
    })
}

fn get_credentials() -> anyhow::Result<Credentials> {
    println!("{}", "🔐 CREDENCIALES DE ADMINISTRADOR".bright_cyan().bold());
    println!("{}", "================================".bright_cyan());

    Ok(Credentials {
        base_url: prompt("Servidor", Some("http://localhost:3000"))?,
        email: prompt("Email", Some("admin@fleet.local"))?,
        password: prompt("Password", None)?,
    })
}

async fn authenticate(client: &reqwest::Client, credentials: &Credentials) -> anyhow::Result<String> {
    println!();
    println!("{}", "🔐 AUTENTICANDO...".bright_cyan().bold());

    let response = client
        .post(format!("{}/api/auth/login", credentials.base_url))
        .json(&json!({ "email": credentials.email, "password": credentials.password }))
        .send()
        .await?;
    let status = response.status();
    let body: Value = response.json().await?;

    if !status.is_success() {
        println!("{} {}", "❌ Login rechazado:".bright_red(), body["message"]);
        anyhow::bail!("login failed with status {}", status);
    }

    let token = body["data"]["token"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("login response has no token"))?
        .to_string();
    println!("{} {}", "✅ Sesión iniciada para".bright_green(), body["data"]["admin"]["name"]);
    Ok(token)
}

async fn get(client: &reqwest::Client, credentials: &Credentials, token: &str, path: &str) -> anyhow::Result<Value> {
    let response = client
        .get(format!("{}{}", credentials.base_url, path))
        .bearer_auth(token)
        .send()
        .await?;
    Ok(response.json().await?)
}

async fn post(client: &reqwest::Client, credentials: &Credentials, token: &str, path: &str) -> anyhow::Result<Value> {
    let response = client
        .post(format!("{}{}", credentials.base_url, path))
        .bearer_auth(token)
        .send()
        .await?;
    Ok(response.json().await?)
}

async fn watch_live_view(client: &reqwest::Client, credentials: &Credentials, token: &str) -> anyhow::Result<()> {
    let mounted = post(client, credentials, token, "/api/maps/views").await?;
    let view_id = mounted["data"]["view_id"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("mount response has no view_id"))?
        .to_string();
    println!("{} {}", "🗺️  Vista montada:".bright_blue(), view_id);

    for _ in 0..10 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let snapshot = get(client, credentials, token, &format!("/api/maps/views/{}", view_id)).await?;
        println!(
            "   rev {} | {} vehículos en mapa",
            snapshot["data"]["revision"].to_string().bright_white(),
            snapshot["data"]["vehicles"].to_string().bright_green()
        );
    }

    client
        .delete(format!("{}/api/maps/views/{}", credentials.base_url, view_id))
        .bearer_auth(token)
        .send()
        .await?;
    println!("{}", "✅ Vista desmontada".bright_green());
    Ok(())
}

async fn list_vehicles(client: &reqwest::Client, credentials: &Credentials, token: &str) -> anyhow::Result<()> {
    let body = get(client, credentials, token, "/api/drivers").await?;
    let vehicles = body["data"].as_array().cloned().unwrap_or_default();

    println!("{}", "🚗 JEEPS".bright_cyan().bold());
    for vehicle in vehicles {
        println!(
            "   {} | {} | {} asientos | {} | {}",
            vehicle["mjeep_code"].as_str().unwrap_or("?").bright_white(),
            vehicle["plate_number"].as_str().unwrap_or("?"),
            vehicle["seats"],
            vehicle["status"].as_str().unwrap_or("?"),
            vehicle["driver_name"].as_str().unwrap_or("?")
        );
    }
    Ok(())
}

async fn analytics_summary(client: &reqwest::Client, credentials: &Credentials, token: &str) -> anyhow::Result<()> {
    println!("{}", "📊 ANALÍTICA".bright_cyan().bold());
    for (label, path) in [
        ("Flota", "/api/data-analytics/fleet-status"),
        ("Viajes semanales", "/api/data-analytics/weekly-trips"),
        ("Estado de viajes", "/api/data-analytics/trip-status"),
        ("Top recogidas", "/api/data-analytics/top-pickup-places"),
        ("Calificaciones", "/api/ratings"),
    ] {
        let body = get(client, credentials, token, path).await?;
        let state = body["state"].as_str().unwrap_or("error");
        let rendered = if state == "ready" {
            state.bright_green()
        } else {
            state.bright_yellow()
        };
        println!("   {:<18} {}", label, rendered);
    }
    Ok(())
}
