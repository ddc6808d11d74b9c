use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use shortener::config::{
    Args, StaticConfig, ensure_auth_secret, get_config, install_config, validate_config,
};
use shortener::runtime::run_server;
use shortener::system::init_logging;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    if args.generate_config {
        println!("{}", StaticConfig::generate_sample_config());
        return Ok(());
    }

    // 优先级：命令行参数 > ENV > config.toml > 默认值
    let mut config = StaticConfig::load_from(args.config.as_deref());
    args.apply_to(&mut config)
        .context("Invalid command-line arguments")?;

    // Held for the whole process so buffered log lines are flushed on exit
    let _log_guard = init_logging(&config.logging).context("Failed to initialize logging")?;

    ensure_auth_secret(&mut config);
    validate_config(&config).context("Invalid configuration")?;
    install_config(config);

    let config = get_config();
    info!(
        "Starting shortener v{} (storage: {})",
        env!("CARGO_PKG_VERSION"),
        config.backend_kind().name()
    );

    run_server(&config).await
}
