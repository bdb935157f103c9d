//! CLI command runner: wires adapters into use cases per subcommand.

use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr, eyre};
use tokio::net::TcpListener;
use tracing::info;

use super::http::{AppState, create_router};
use crate::application::services::{ProxyUrl, ResolutionOrchestrator};
use crate::application::{LoadAvatarUseCase, ResolveAvatarUseCase};
use crate::domain::entities::Username;
use crate::domain::ports::{ClockPort, KeyValueStorePort};
use crate::infrastructure::cache::{MemoryAvatarCache, PersistentAvatarCache};
use crate::infrastructure::config::{AppConfig, CacheCommand, Command};
use crate::infrastructure::{
    FileKeyValueStore, HttpImageProxy, HttpProfileApi, SystemClock, UpstreamFetcher,
    default_registry,
};

/// Runs one subcommand to completion.
///
/// # Errors
/// Returns error if an adapter cannot be built or the command itself fails.
pub async fn run(command: Command, config: AppConfig) -> Result<()> {
    match command {
        Command::Serve { .. } => serve(&config).await,
        Command::Lookup { username } => lookup(&config, &username).await,
        Command::Avatar { username, .. } => avatar(&config, &username).await,
        Command::Preload { file } => preload(&config, &file).await,
        Command::Cache { action } => cache(&config, action).await,
    }
}

fn build_orchestrator(
    config: &AppConfig,
    clock: Arc<dyn ClockPort>,
) -> Result<ResolutionOrchestrator> {
    let fetcher = Arc::new(UpstreamFetcher::new().wrap_err("Failed to build upstream client")?);
    let registry = default_registry(&fetcher, &config.resolution);
    info!(
        tiers = registry.len(),
        probes = registry.probe_count(),
        budget_ms = config.resolution.global_budget_ms,
        "Probe registry ready"
    );
    Ok(ResolutionOrchestrator::new(
        registry,
        config.resolution.global_budget(),
        clock,
    ))
}

async fn serve(config: &AppConfig) -> Result<()> {
    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock);
    let cache = Arc::new(MemoryAvatarCache::new(
        config.cache.capacity,
        config.cache.ttl(),
        Arc::clone(&clock),
    ));
    let orchestrator = Arc::new(build_orchestrator(config, clock)?);
    let resolve = ResolveAvatarUseCase::new(
        cache.clone(),
        orchestrator,
        ProxyUrl::new(config.server.proxy_path.clone()),
    );
    let images = if config.proxy.allow_private_hosts {
        HttpImageProxy::with_private_hosts(config.proxy.timeout())
    } else {
        HttpImageProxy::new(config.proxy.timeout())
    };
    let images = Arc::new(images.wrap_err("Failed to build image proxy")?);

    spawn_purge(Arc::clone(&cache), config.cache.ttl());

    let router = create_router(
        AppState::new(resolve, images, cache),
        &config.server.proxy_path,
    );
    let listener = TcpListener::bind(config.server.listen)
        .await
        .wrap_err_with(|| format!("Failed to bind {}", config.server.listen))?;

    info!(listen = %config.server.listen, proxy_path = %config.server.proxy_path, "Server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Periodically drops expired entries so idle usernames do not pin memory.
fn spawn_purge(cache: Arc<MemoryAvatarCache>, ttl: Duration) {
    let period = (ttl / 4).max(Duration::from_secs(60));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = cache.purge_expired().await;
            if removed > 0 {
                info!(removed, "Purged expired cache entries");
            }
        }
    });
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}

async fn lookup(config: &AppConfig, raw: &str) -> Result<()> {
    let username = Username::parse(raw)?;
    let avatar = build_orchestrator(config, Arc::new(SystemClock))?
        .resolve(&username)
        .await
        .map_err(|e| eyre!("{e}\n{}", e.hint()))?;

    info!(username = %username, source = avatar.source(), "Resolved");
    println!("{}", avatar.url());
    Ok(())
}

async fn client(config: &AppConfig) -> Result<(LoadAvatarUseCase, PersistentAvatarCache)> {
    let store: Arc<dyn KeyValueStorePort> = Arc::new(open_store(config).await?);
    let persisted =
        PersistentAvatarCache::with_ttl(store, Arc::new(SystemClock), config.cache.ttl());

    let api = HttpProfileApi::new(config.client.base_url.clone())
        .wrap_err("Failed to build entry point client")?;
    let proxy = ProxyUrl::absolute(&config.client.base_url, &config.server.proxy_path);

    let use_case = LoadAvatarUseCase::new(Arc::new(persisted.clone()), Arc::new(api), proxy)
        .with_preload_delay(config.client.preload_delay());
    Ok((use_case, persisted))
}

async fn open_store(config: &AppConfig) -> Result<FileKeyValueStore> {
    let quota = config.client.quota_bytes;
    let store = match &config.client.storage_dir {
        Some(dir) => FileKeyValueStore::new(dir.clone(), quota).await,
        None => FileKeyValueStore::default_location(quota).await,
    };
    store.wrap_err("Failed to open avatar store")
}

async fn avatar(config: &AppConfig, raw: &str) -> Result<()> {
    let (use_case, _) = client(config).await?;
    let avatar = use_case.load(raw).await;

    info!(source = %avatar.source, "Avatar loaded");
    println!("{}", avatar.url);
    Ok(())
}

async fn preload(config: &AppConfig, file: &std::path::Path) -> Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .wrap_err_with(|| format!("Failed to read {}", file.display()))?;
    let usernames: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let (use_case, _) = client(config).await?;
    let summary = use_case
        .preload(&usernames, |done, total| {
            info!(done, total, "Preload progress");
        })
        .await;

    println!("{summary}");
    Ok(())
}

async fn cache(config: &AppConfig, action: CacheCommand) -> Result<()> {
    let (_, persisted) = client(config).await?;

    match action {
        CacheCommand::Stats => {
            if !persisted.is_available().await {
                return Err(eyre!("Avatar store is not writable"));
            }
            println!("{}", persisted.stats().await?);
        }
        CacheCommand::Clear => {
            let removed = persisted.clear_all().await?;
            println!("Removed {removed} entries");
        }
        CacheCommand::Prune { older_than_secs } => {
            let removed = persisted
                .clear_older_than(Duration::from_secs(older_than_secs))
                .await?;
            println!("Removed {removed} entries older than {older_than_secs}s");
        }
    }
    Ok(())
}
