use anyhow::Context;

use blabla_core::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::load().context("failed to load configuration")?;
    blabla_core::logging::init("blabla", &cfg.log_level)?;

    blabla_telegram::router::run_polling(&cfg).await
}
