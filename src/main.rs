use anyhow::Result;
use std::{sync::Arc, time::Duration};
use tracing::{error, info, warn};

use streamtube::{
    api::{HttpMusicApi, MusicApi},
    cache::CacheManager,
    config::Config,
    player::{track_id_from_path, MusicPlayer, PlayerSettings, SimulatedAudio, TracingView},
    router::{HttpFetcher, ServiceWorker},
    storage::JsonFileStore,
};

/// Ancho de viewport del driver sin interfaz
const HEADLESS_VIEWPORT_WIDTH: u32 = 1280;

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("streamtube=debug".parse()?)
                .add_directive("reqwest=info".parse()?),
        )
        .init();

    info!("🎵 Iniciando StreamTube v{}", env!("CARGO_PKG_VERSION"));

    // Cargar configuración
    let config = Config::load()?;
    info!("⚙️ {}", config.summary());

    let api = Arc::new(HttpMusicApi::from_config(&config)?);

    // Manejar health check si es necesario
    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check(api.as_ref()).await;
    }

    // Inicializar almacenamiento persistente
    let store = Arc::new(JsonFileStore::new(config.data_dir.join("cache")).await?);

    // Inicializar caché
    let cache = Arc::new(CacheManager::from_config(store.clone(), &config));
    let removed = cache.cleanup_expired().await;
    if removed > 0 {
        info!("🧹 {} entradas expiradas eliminadas al iniciar", removed);
    }

    // Router de peticiones: instalar y activar la versión actual
    let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(config.request_timeout))?);
    let worker = ServiceWorker::from_config(store, fetcher, &config)?;

    match worker.install().await {
        Ok(count) => info!("✅ {} assets disponibles offline", count),
        Err(e) => warn!("⚠️ Instalación de '{}' fallida: {}", worker.cache_name(), e),
    }
    let purged = worker.activate().await;
    info!("🗂️ Router activo ('{}', {} stores antiguos eliminados)", worker.cache_name(), purged);

    // Reproductor
    let player = MusicPlayer::new(
        api,
        cache.clone(),
        Arc::new(SimulatedAudio::new()),
        Arc::new(TracingView::new(HEADLESS_VIEWPORT_WIDTH)),
        PlayerSettings::from(&config),
    );

    let path = std::env::args().skip(1).find(|arg| track_id_from_path(arg).is_some());
    player.restore(path.as_deref()).await;

    match player.current_track() {
        Some(track) => info!("🎶 Track actual: {} - {}", track.title, track.artist),
        None => info!("📭 Sin track cargado"),
    }

    // Manejar shutdown graceful
    info!("🚀 StreamTube iniciado, Ctrl+C para salir");
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Error al registrar Ctrl+C: {:?}", e);
    }
    info!("⚠️ Señal de shutdown recibida, cerrando...");

    let metrics = cache.metrics();
    info!(
        "📊 Caché: {} hits, {} misses ({:.1}% hit rate)",
        metrics.hits,
        metrics.misses,
        metrics.hit_rate() * 100.0
    );

    Ok(())
}

async fn health_check(api: &dyn MusicApi) -> Result<()> {
    // Verificar que la API responde
    match api.liked_songs().await {
        Ok(_) => {
            println!("OK");
            Ok(())
        }
        Err(e) => anyhow::bail!("API no disponible: {}", e),
    }
}
