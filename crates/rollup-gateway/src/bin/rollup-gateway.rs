use anyhow::Result;
use clap::Parser;
use rollup_gateway::GatewayConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{
    EnvFilter,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = GatewayConfig::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                .with_default_directive(config.log_level.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let gateway = config.build().await?;
    let cancellation_token = CancellationToken::new();

    let mut server_future = Box::pin(gateway.run(cancellation_token.clone()));

    tokio::select! {
        result = &mut server_future => {
            handle_server_result(result);
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received ctrl-c, initiating graceful shutdown");
            cancellation_token.cancel();
            handle_server_result(server_future.await);
        }
    }

    Ok(())
}

fn handle_server_result(result: rollup_gateway::Result<()>) {
    match result {
        Ok(()) => tracing::info!("gateway shutdown gracefully"),
        Err(err) => tracing::error!("gateway encountered an error: {err}"),
    }
}
