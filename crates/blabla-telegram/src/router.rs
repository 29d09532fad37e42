use std::sync::Arc;

use blabla_core::{
    api::BotApi,
    config::Config,
    cursor::FileCursorStore,
    errors::{ConnectionError, Error},
    poll::PollLoop,
    transport::Transport,
};
use blabla_http::ReqwestConnector;

use crate::CommandTable;

/// Wires the HTTP adapter, the watermark file and the command table into a
/// poll loop.
pub fn build_poll_loop(cfg: &Config) -> PollLoop {
    let transport = Transport::new(
        &cfg.api_base_url,
        &cfg.bot_token,
        Arc::new(ReqwestConnector::new()),
    );
    let api = BotApi::new(transport, cfg.bot_name.clone())
        .with_decode_options(cfg.decode)
        .with_poll_grace(cfg.poll_grace);

    PollLoop::new(
        api,
        Box::new(FileCursorStore::new(cfg.cursor_file.clone())),
        Box::new(CommandTable::new()),
        cfg.poll.clone(),
    )
}

/// Runs the bot until `/stop`, Ctrl-C or a fatal error.
pub async fn run_polling(cfg: &Config) -> anyhow::Result<()> {
    let mut poll = build_poll_loop(cfg);

    let abort = poll.abort_handle();
    let interrupt = abort.clone();
    let signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, aborting session");
            interrupt.abort();
        }
    });

    tracing::info!(cursor = %cfg.cursor_file.display(), "blablabot started");
    let result = poll.run().await;
    signal.abort();

    match result {
        Ok(()) => {
            tracing::info!(watermark = poll.watermark(), "blablabot stopped");
            Ok(())
        }
        Err(Error::Connection(ConnectionError::Aborted)) if abort.is_aborted() => {
            tracing::info!(watermark = poll.watermark(), "blablabot interrupted");
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context("poll loop failed")),
    }
}
