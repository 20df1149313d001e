use lesion_scan::{app::ServerBuilder, config::Configuration, error::AppError};
use tracing::info;

fn init_logging(configuration: &Configuration) {
    tracing_subscriber::fmt()
        .with_max_level(configuration.log_level())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config_path = std::env::args().nth(1);
    let configuration = Configuration::load(config_path.as_deref())?;
    init_logging(&configuration);
    info!(
        "Starting lesion-scan with the {:?} classifier backend",
        configuration.model.backend
    );

    let server = ServerBuilder::new()
        .with_configuration(configuration)
        .build()
        .await?;
    server.run().await
}
