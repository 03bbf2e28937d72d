use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use fleet_dashboard::cache::{CacheConfig, RedisClient};
use fleet_dashboard::clients::{AuthProvider, MemoryAuthProvider, SupabaseAuthClient};
use fleet_dashboard::config::database::DatabaseConfig;
use fleet_dashboard::config::environment::{EnvironmentConfig, StoreBackend};
use fleet_dashboard::models::location::LngLat;
use fleet_dashboard::models::user::{Role, User};
use fleet_dashboard::models::vehicle::Vehicle;
use fleet_dashboard::repositories::{FleetStore, MemoryFleetStore, PgFleetStore};
use fleet_dashboard::services::realtime::listen_postgres;
use fleet_dashboard::services::{CachedGeocoder, MapboxGeocoder, RealtimeHub};
use fleet_dashboard::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🚌 Fleet Dashboard - Modern Jeepney Admin API");
    info!("=============================================");

    let config = EnvironmentConfig::from_env().context("Invalid configuration")?;
    let realtime = Arc::new(RealtimeHub::default());

    let demo_account = demo_admin_account();
    let store: Arc<dyn FleetStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set when STORE_BACKEND=postgres")?;
            let pool = match DatabaseConfig::new(url).create_pool().await {
                Ok(pool) => pool,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {}", e);
                    return Err(anyhow::anyhow!("Error de base de datos: {}", e));
                }
            };
            info!("✅ Base de datos conectada");

            let listener_pool = pool.clone();
            let hub = realtime.clone();
            tokio::spawn(async move {
                if let Err(e) = listen_postgres(listener_pool, hub).await {
                    error!("❌ Listener realtime detenido: {:#}", e);
                }
            });

            Arc::new(PgFleetStore::new(pool))
        }
        StoreBackend::Memory => {
            warn!("🧪 STORE_BACKEND=memory: datos de demostración en memoria");
            Arc::new(demo_store(&demo_account).with_realtime(realtime.clone()))
        }
    };

    // Redis es opcional: sin él la geocodificación va sin cache
    let cache = match &config.redis_url {
        Some(url) => match RedisClient::new(CacheConfig::new(url)).await {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("⚠️ Redis no disponible, geocodificación sin cache: {}", e);
                None
            }
        },
        None => None,
    };

    let auth_provider: Arc<dyn AuthProvider> = match (&config.supabase_url, &config.supabase_anon_key) {
        (Some(url), Some(key)) => Arc::new(SupabaseAuthClient::new(url, key)?),
        _ => {
            warn!("🧪 SUPABASE_URL/SUPABASE_ANON_KEY ausentes: proveedor de auth en memoria");
            Arc::new(MemoryAuthProvider::new().with_account(
                demo_account.auth_user_id,
                &demo_account.email,
                &demo_account.password,
            )?)
        }
    };

    if config.mapbox_token.is_none() {
        warn!("⚠️ MAPBOX_TOKEN no definido: los nombres de lugar no se resolverán");
    }
    let geocoder = CachedGeocoder::new(
        MapboxGeocoder::new(config.mapbox_token.as_deref().unwrap_or_default())?,
        cache,
    );

    let addr: SocketAddr = config
        .server_url()
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server_url()))?;

    let state = AppState::new(config, store, auth_provider, Arc::new(geocoder), realtime);
    let background = state.spawn_background_tasks();
    let live_views = state.live_views.clone();
    let app = create_router(state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints públicos:");
    info!("   GET  /health");
    info!("   POST /api/auth/login");
    info!("   POST /api/admin-creation");
    info!("   GET  /api/maps/config");
    info!("🔐 Endpoints con sesión:");
    info!("   POST /api/auth/logout | GET /api/auth/session | GET /api/routes");
    info!("   POST /api/maps/views | GET|DELETE /api/maps/views/:id");
    info!("   GET|POST /api/drivers | PUT|DELETE /api/drivers/:code");
    info!("   GET|PUT /api/account | PUT /api/account/password");
    info!("   GET  /api/data-analytics/* | /api/heatmap | /api/pickup-dropoff | /api/ratings");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    live_views.shutdown().await;
    for task in background {
        task.abort();
    }

    if let Err(e) = served {
        error!("❌ Servidor terminó con error: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

struct DemoAccount {
    auth_user_id: Uuid,
    email: String,
    password: String,
}

fn demo_admin_account() -> DemoAccount {
    DemoAccount {
        auth_user_id: Uuid::new_v4(),
        email: std::env::var("DEMO_ADMIN_EMAIL").unwrap_or_else(|_| "admin@fleet.local".to_string()),
        password: std::env::var("DEMO_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string()),
    }
}

/// Store de demostración: un administrador, dos conductores y sus jeeps en Naga
fn demo_store(account: &DemoAccount) -> MemoryFleetStore {
    let user = |user_id: i64, name: &str, email: &str, role: Role, auth_user_id: Option<Uuid>| User {
        user_id,
        auth_user_id,
        name: name.to_string(),
        username: name.to_lowercase(),
        email: email.to_string(),
        role,
    };
    let jeep = |mjeep_id: i64, driver: i64, name: &str, lng: f64, lat: f64| Vehicle {
        mjeep_id,
        mjeep_code: format!("MJ-{:02}", mjeep_id),
        plate_number: format!("NAG {:03}", mjeep_id),
        seats: 22,
        status: true,
        driver_id: Some(driver),
        driver_name: Some(name.to_string()),
        position: Some(LngLat::new(lng, lat)),
    };

    info!("👤 Administrador demo: {}", account.email);
    MemoryFleetStore::new()
        .with_user(user(1, "Admin", &account.email, Role::Admin, Some(account.auth_user_id)))
        .with_user(user(2, "Juan", "juan@fleet.local", Role::Driver, None))
        .with_user(user(3, "Pedro", "pedro@fleet.local", Role::Driver, None))
        .with_vehicle(jeep(1, 2, "Juan", 123.1948, 13.6218))
        .with_vehicle(jeep(2, 3, "Pedro", 123.2010, 13.6170))
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
