use parley::application::{LocalPreview, ManualExchangeCall, ManualPeer, SameProcessCall};
use parley::config::Config;
use parley::domain::negotiation::media::MediaSource;
use parley::domain::negotiation::observer::NegotiationObserver;
use parley::domain::negotiation::value_object::EndpointRole;
use parley::infrastructure::media::SyntheticCamera;
use parley::interface::TracingObserver;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log.level)?)
        .init();

    info!("Starting Parley negotiation demo");
    info!("Configuration loaded: {:?}", config);

    demo_local_preview(&config).await?;
    demo_same_process_call(&config).await?;
    demo_manual_exchange(&config).await?;

    info!("All demo flows complete");
    Ok(())
}

/// Acquire the synthetic camera and show the live handle
async fn demo_local_preview(config: &Config) -> anyhow::Result<()> {
    info!("=== Local Preview Demo ===");

    let media: Arc<dyn MediaSource> = Arc::new(SyntheticCamera::new());
    let preview = LocalPreview::new(media);
    let handle = preview.run(config.constraints()).await?;

    info!("preview tracks: {}", handle.track_labels().join(", "));
    info!("=== Local Preview Demo Complete ===");
    Ok(())
}

/// Hold both sides of a call in one coordinator and drive it to connected
async fn demo_same_process_call(config: &Config) -> anyhow::Result<()> {
    info!("=== Same-Process Call Demo ===");

    let observer: Arc<dyn NegotiationObserver> = Arc::new(TracingObserver::new());
    let media: Arc<dyn MediaSource> = Arc::new(SyntheticCamera::new());
    let call = SameProcessCall::new(
        observer,
        media,
        config.constraints(),
        config.ice.stun_servers.clone(),
    );

    let session_id = call.call().await?;

    let session = call.coordinator().session(session_id).await?;
    info!(
        "local connectivity: {}, remote connectivity: {}",
        session.endpoint(EndpointRole::Local).connectivity_state(),
        session.endpoint(EndpointRole::Remote).connectivity_state(),
    );
    if let Some(setup) = session.setup_time() {
        info!("setup time: {} ms", setup.num_milliseconds());
    }

    call.hang_up(session_id).await?;
    info!("=== Same-Process Call Demo Complete ===");
    Ok(())
}

/// Negotiate between two coordinators by ferrying armored text
async fn demo_manual_exchange(config: &Config) -> anyhow::Result<()> {
    info!("=== Manual Exchange Demo ===");

    let observer: Arc<dyn NegotiationObserver> = Arc::new(TracingObserver::new());
    let media: Arc<dyn MediaSource> = Arc::new(SyntheticCamera::new());

    let caller = ManualPeer::new(
        observer.clone(),
        media.clone(),
        config.constraints(),
        config.ice.stun_servers.clone(),
    )
    .await;
    let callee = ManualPeer::new(
        observer,
        media,
        config.constraints(),
        config.ice.stun_servers.clone(),
    )
    .await;

    let exchange = ManualExchangeCall::new(caller, callee);
    let session_id = exchange.run().await?;

    let caller_session = exchange.caller().coordinator().session(session_id).await?;
    let callee_session = exchange.callee().coordinator().session(session_id).await?;
    info!(
        "caller side connectivity: {}, callee side connectivity: {}",
        caller_session
            .endpoint(EndpointRole::Local)
            .connectivity_state(),
        callee_session
            .endpoint(EndpointRole::Remote)
            .connectivity_state(),
    );

    exchange.caller().hang_up(session_id).await?;
    exchange.callee().hang_up(session_id).await?;
    info!("=== Manual Exchange Demo Complete ===");
    Ok(())
}
