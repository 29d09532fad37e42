//! The long-poll loop: fetch, advance the watermark, dispatch, recover.

use std::time::Duration;

use crate::api::BotApi;
use crate::cursor::CursorStore;
use crate::router::{CommandRouter, Outcome};
use crate::transport::AbortHandle;
use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollConfig {
    /// Server-side long-poll timeout in seconds.
    pub timeout_secs: u64,
    /// Fixed pause before a fresh session after a recoverable failure.
    pub reconnect_delay: Duration,
    /// Persist the watermark after every non-empty batch.
    pub checkpoint_each_batch: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            reconnect_delay: Duration::from_secs(1),
            checkpoint_each_batch: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Polling,
    Dispatching,
    Recovering,
    Terminated,
}

/// Why a session ended.
#[derive(Debug)]
enum SessionEnd {
    Stop,
    Abort,
    Reset(Error),
    Fatal(Error),
}

enum Next {
    Restart,
    Done,
}

pub struct PollLoop {
    api: BotApi,
    store: Box<dyn CursorStore>,
    router: Box<dyn CommandRouter>,
    config: PollConfig,
    watermark: i64,
    state: LoopState,
}

impl PollLoop {
    pub fn new(
        api: BotApi,
        store: Box<dyn CursorStore>,
        router: Box<dyn CommandRouter>,
        config: PollConfig,
    ) -> Self {
        Self {
            api,
            store,
            router,
            config,
            watermark: 0,
            state: LoopState::Idle,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Next offset to request; every update below it has been handed out.
    pub fn watermark(&self) -> i64 {
        self.watermark
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.api.abort_handle()
    }

    /// Runs until a `Stop` outcome (`Ok`) or a fatal error (`Err`).
    ///
    /// The watermark is loaded once; recovery keeps the in-memory value.
    pub async fn run(&mut self) -> Result<()> {
        self.watermark = match self.store.load() {
            Ok(watermark) => watermark,
            Err(e) => {
                self.state = LoopState::Terminated;
                return Err(e);
            }
        };
        tracing::info!(watermark = self.watermark, "poll loop starting");

        loop {
            let end = match self.poll_session().await {
                Ok(end) => end,
                Err(e) if e.is_recoverable() => SessionEnd::Reset(e),
                Err(e) => SessionEnd::Fatal(e),
            };
            match self.finish_session(end).await? {
                Next::Done => return Ok(()),
                Next::Restart => {
                    self.state = LoopState::Recovering;
                    tokio::time::sleep(self.config.reconnect_delay).await;
                }
            }
        }
    }

    async fn poll_session(&mut self) -> Result<SessionEnd> {
        self.api.init_session().await?;
        self.api.check_bot_info().await?;

        loop {
            self.state = LoopState::Polling;
            let batch = self
                .api
                .fetch_updates(Some(self.watermark), Some(self.config.timeout_secs))
                .await?;
            if batch.is_empty() {
                continue;
            }

            self.state = LoopState::Dispatching;
            for update in batch.updates {
                self.watermark = self.watermark.max(update.update_id.next());
                let Some(message) = update.message.as_ref() else {
                    tracing::debug!(update_id = update.update_id.0, "update without message ignored");
                    continue;
                };
                match self.router.route(message, &mut self.api).await? {
                    Outcome::Continue => {}
                    Outcome::Stop => return Ok(SessionEnd::Stop),
                    Outcome::Abort => return Ok(SessionEnd::Abort),
                    Outcome::Fatal(e) => return Ok(SessionEnd::Fatal(e)),
                }
            }
            // Undecodable entries are acknowledged too, or the server would
            // keep handing them back at the same offset.
            if let Some(last) = batch.last_update_id {
                self.watermark = self.watermark.max(last.next());
            }

            if self.config.checkpoint_each_batch {
                self.store.save(self.watermark)?;
            }
        }
    }

    /// Persist first, then release the session and decide whether to go on.
    async fn finish_session(&mut self, end: SessionEnd) -> Result<Next> {
        let persisted = self.store.save(self.watermark);

        let next = match end {
            SessionEnd::Stop => {
                tracing::info!(watermark = self.watermark, "stop requested");
                self.api.close_session().await;
                Next::Done
            }
            SessionEnd::Reset(e) => {
                tracing::warn!(error = %e, "connection reset, reconnecting");
                self.api.close_session().await;
                Next::Restart
            }
            SessionEnd::Abort => {
                tracing::warn!("abort requested, restarting session");
                self.api.abort_session();
                Next::Restart
            }
            SessionEnd::Fatal(e) => {
                tracing::error!(error = %e, watermark = self.watermark, "poll loop failed");
                self.api.close_session().await;
                self.state = LoopState::Terminated;
                if let Err(store_error) = persisted {
                    tracing::error!(error = %store_error, "watermark not persisted");
                }
                return Err(e);
            }
        };

        if let Err(e) = persisted {
            self.state = LoopState::Terminated;
            return Err(e);
        }
        if let Next::Done = next {
            self.state = LoopState::Terminated;
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::errors::ConnectionError;
    use crate::ports::HttpMethod;
    use crate::testing::{bot_user, text_update, MemoryCursor, RecordingRouter, ScriptedConnector};
    use crate::transport::Transport;
    use serde_json::json;

    fn poll_loop(
        connector: &ScriptedConnector,
        cursor: &MemoryCursor,
        router: &RecordingRouter,
    ) -> PollLoop {
        let transport = Transport::new("http://local", "T", Arc::new(connector.clone()));
        let api = BotApi::new(transport, "blablabot");
        PollLoop::new(
            api,
            Box::new(cursor.clone()),
            Box::new(router.clone()),
            PollConfig {
                reconnect_delay: Duration::ZERO,
                ..PollConfig::default()
            },
        )
    }

    fn script_exhausted(err: &Error) -> bool {
        matches!(err, Error::External(reason) if reason == "script exhausted")
    }

    #[tokio::test]
    async fn dispatches_in_order_and_advances_watermark() {
        let connector = ScriptedConnector::new();
        connector.ok(bot_user("blablabot"));
        connector.ok(json!([text_update(5, 1, "hello"), text_update(6, 2, "world")]));
        let cursor = MemoryCursor::default();
        let router = RecordingRouter::default();
        let mut poll = poll_loop(&connector, &cursor, &router);

        let err = poll.run().await.unwrap_err();
        assert!(script_exhausted(&err));

        assert_eq!(router.seen(), vec![1, 2]);
        assert_eq!(poll.watermark(), 7);
        assert_eq!(cursor.saves(), vec![7, 7]);
        assert_eq!(
            connector.paths(),
            vec![
                "botT/getMe",
                "botT/getUpdates?offset=0&timeout=30",
                "botT/getUpdates?offset=7&timeout=30",
            ]
        );
        assert_eq!(poll.state(), LoopState::Terminated);
    }

    #[tokio::test]
    async fn non_200_poll_leaves_watermark_and_router_untouched() {
        let connector = ScriptedConnector::new();
        connector.ok(bot_user("blablabot"));
        connector.respond(502, "Bad Gateway", "");
        let cursor = MemoryCursor::starting_at(3);
        let router = RecordingRouter::default();
        let mut poll = poll_loop(&connector, &cursor, &router);

        let err = poll.run().await.unwrap_err();
        assert!(matches!(err, Error::Transport { status: 502, .. }));
        assert!(router.seen().is_empty());
        assert_eq!(poll.watermark(), 3);
        assert_eq!(cursor.saves(), vec![3]);
        assert_eq!(connector.shutdowns(), 1);
    }

    #[tokio::test]
    async fn reset_persists_and_reconnects_with_same_offset() {
        let connector = ScriptedConnector::new();
        connector.ok(bot_user("blablabot"));
        connector.ok(json!([text_update(10, 1, "first")]));
        connector.reset("peer closed");
        connector.ok(bot_user("blablabot"));
        connector.ok(json!([text_update(11, 2, "stop")]));
        let cursor = MemoryCursor::default();
        let router = RecordingRouter::default();
        let mut poll = poll_loop(&connector, &cursor, &router);

        poll.run().await.unwrap();

        assert_eq!(router.seen(), vec![1, 2]);
        assert_eq!(cursor.saves(), vec![11, 11, 12]);
        assert_eq!(connector.connects(), 2);
        assert_eq!(connector.shutdowns(), 2);
        let paths = connector.paths();
        assert_eq!(paths[2], "botT/getUpdates?offset=11&timeout=30");
        assert_eq!(paths[4], "botT/getUpdates?offset=11&timeout=30");
        assert_eq!(poll.state(), LoopState::Terminated);
    }

    #[tokio::test]
    async fn abort_outcome_force_closes_and_restarts() {
        let connector = ScriptedConnector::new();
        connector.ok(bot_user("blablabot"));
        connector.ok(json!([text_update(1, 1, "abort"), text_update(2, 2, "never")]));
        connector.ok(bot_user("blablabot"));
        connector.ok(json!([text_update(2, 2, "stop")]));
        let cursor = MemoryCursor::default();
        let router = RecordingRouter::default();
        let mut poll = poll_loop(&connector, &cursor, &router);

        poll.run().await.unwrap();

        // The update after the abort is fetched again by the next session.
        assert_eq!(router.seen(), vec![1, 2]);
        assert_eq!(cursor.saves(), vec![2, 3]);
        assert_eq!(connector.connects(), 2);
        assert_eq!(connector.shutdowns(), 1);
        assert_eq!(connector.paths()[3], "botT/getUpdates?offset=2&timeout=30");
    }

    #[tokio::test]
    async fn stop_outcome_persists_and_returns_ok() {
        let connector = ScriptedConnector::new();
        connector.ok(bot_user("blablabot"));
        connector.ok(json!([text_update(40, 1, "stop")]));
        let cursor = MemoryCursor::starting_at(40);
        let router = RecordingRouter::default();
        let mut poll = poll_loop(&connector, &cursor, &router);

        poll.run().await.unwrap();

        assert_eq!(cursor.saves(), vec![41]);
        assert_eq!(connector.shutdowns(), 1);
        assert_eq!(connector.requests().len(), 2);
    }

    #[tokio::test]
    async fn fatal_outcome_persists_and_returns_error() {
        let connector = ScriptedConnector::new();
        connector.ok(bot_user("blablabot"));
        connector.ok(json!([text_update(8, 1, "fatal")]));
        let cursor = MemoryCursor::default();
        let router = RecordingRouter::default();
        let mut poll = poll_loop(&connector, &cursor, &router);

        let err = poll.run().await.unwrap_err();
        assert!(matches!(err, Error::External(ref reason) if reason == "router gave up"));
        assert_eq!(cursor.saves(), vec![9]);
        assert_eq!(connector.shutdowns(), 1);
    }

    #[tokio::test]
    async fn identity_mismatch_stops_before_polling() {
        let connector = ScriptedConnector::new();
        connector.ok(bot_user("other"));
        let cursor = MemoryCursor::default();
        let router = RecordingRouter::default();
        let mut poll = poll_loop(&connector, &cursor, &router);

        let err = poll.run().await.unwrap_err();
        assert!(matches!(err, Error::IdentityMismatch { .. }));
        assert_eq!(connector.paths(), vec!["botT/getMe"]);
    }

    #[tokio::test]
    async fn persist_failure_wins_over_stop() {
        let connector = ScriptedConnector::new();
        connector.ok(bot_user("blablabot"));
        connector.ok(json!([text_update(1, 1, "stop")]));
        let cursor = MemoryCursor::failing();
        let router = RecordingRouter::default();
        let mut poll = poll_loop(&connector, &cursor, &router);

        let err = poll.run().await.unwrap_err();
        assert!(matches!(err, Error::Store { .. }));
        assert_eq!(connector.shutdowns(), 1);
        assert_eq!(poll.state(), LoopState::Terminated);
    }

    #[tokio::test]
    async fn updates_without_message_advance_but_do_not_dispatch() {
        let connector = ScriptedConnector::new();
        connector.ok(bot_user("blablabot"));
        connector.ok(json!([
            {"update_id": 20, "callback_query": {"id": "q"}},
            text_update(4, 1, "late")
        ]));
        let cursor = MemoryCursor::starting_at(15);
        let router = RecordingRouter::default();
        let mut poll = poll_loop(&connector, &cursor, &router);

        let err = poll.run().await.unwrap_err();
        assert!(script_exhausted(&err));
        assert_eq!(router.seen(), vec![1]);
        assert_eq!(poll.watermark(), 21);
    }

    #[tokio::test]
    async fn undecodable_updates_still_advance_watermark() {
        let connector = ScriptedConnector::new();
        connector.ok(bot_user("blablabot"));
        connector.ok(json!([{"update_id": 6, "message": {"chat": 1}}]));
        connector.ok(json!([text_update(7, 1, "hello"), {"update_id": 9, "edited_message": 3}]));
        let cursor = MemoryCursor::default();
        let router = RecordingRouter::default();
        let mut poll = poll_loop(&connector, &cursor, &router);

        assert!(script_exhausted(&poll.run().await.unwrap_err()));
        assert_eq!(router.seen(), vec![1]);
        assert_eq!(poll.watermark(), 10);
        assert_eq!(cursor.saves(), vec![7, 10, 10]);
        assert_eq!(
            connector.paths(),
            vec![
                "botT/getMe",
                "botT/getUpdates?offset=0&timeout=30",
                "botT/getUpdates?offset=7&timeout=30",
                "botT/getUpdates?offset=10&timeout=30",
            ]
        );
    }

    #[tokio::test]
    async fn empty_batches_skip_checkpoint() {
        let connector = ScriptedConnector::new();
        connector.ok(bot_user("blablabot"));
        connector.ok(json!([]));
        connector.ok(json!([]));
        let cursor = MemoryCursor::starting_at(5);
        let router = RecordingRouter::default();
        let mut poll = poll_loop(&connector, &cursor, &router);

        assert!(script_exhausted(&poll.run().await.unwrap_err()));
        assert_eq!(cursor.saves(), vec![5]);
        assert_eq!(connector.requests().len(), 4);
    }

    #[tokio::test]
    async fn abort_handle_ends_pending_poll() {
        let connector = ScriptedConnector::new();
        connector.ok(bot_user("blablabot"));
        connector.hang();
        let cursor = MemoryCursor::starting_at(2);
        let router = RecordingRouter::default();
        let mut poll = poll_loop(&connector, &cursor, &router);

        let handle = poll.abort_handle();
        let aborter = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.abort();
        });

        let err = poll.run().await.unwrap_err();
        aborter.await.unwrap();
        assert!(matches!(err, Error::Connection(ConnectionError::Aborted)));
        assert_eq!(cursor.saves(), vec![2]);
        assert_eq!(connector.requests()[1].method, HttpMethod::Get);
    }
}
