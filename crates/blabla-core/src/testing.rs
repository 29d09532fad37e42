//! In-memory fakes for the ports, shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::api::BotApi;
use crate::cursor::CursorStore;
use crate::errors::ConnectionError;
use crate::model::Message;
use crate::ports::{ApiRequest, Connection, Connector, RawResponse};
use crate::router::{CommandRouter, Outcome};
use crate::{Error, Result};

enum Step {
    Respond(RawResponse),
    Reset(String),
    Hang,
}

#[derive(Default)]
struct Script {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<ApiRequest>>,
    connects: AtomicUsize,
    shutdowns: AtomicUsize,
}

/// Connector whose connections replay a queue of canned outcomes.
///
/// Once the queue is empty every request fails with a fatal `External` error,
/// so a runaway loop ends instead of spinning.
#[derive(Clone, Default)]
pub(crate) struct ScriptedConnector {
    script: Arc<Script>,
}

impl ScriptedConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(&self, step: Step) {
        self.script.steps.lock().unwrap().push_back(step);
    }

    pub(crate) fn respond(&self, status: u16, reason: &str, body: &str) {
        self.push(Step::Respond(RawResponse {
            status,
            reason: reason.to_string(),
            body: body.to_string(),
        }));
    }

    /// 200 with a well-formed `{"ok": true, "result": ...}` envelope.
    pub(crate) fn ok(&self, result: Value) {
        self.respond(200, "OK", &json!({"ok": true, "result": result}).to_string());
    }

    pub(crate) fn reset(&self, reason: &str) {
        self.push(Step::Reset(reason.to_string()));
    }

    pub(crate) fn hang(&self) {
        self.push(Step::Hang);
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.script.requests.lock().unwrap().clone()
    }

    pub(crate) fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }

    pub(crate) fn connects(&self) -> usize {
        self.script.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn shutdowns(&self) -> usize {
        self.script.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, _base_url: &str) -> Result<Box<dyn Connection>> {
        self.script.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedConnection {
            script: self.script.clone(),
        }))
    }
}

struct ScriptedConnection {
    script: Arc<Script>,
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn execute(&mut self, request: ApiRequest) -> Result<RawResponse> {
        self.script.requests.lock().unwrap().push(request);
        let step = self.script.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Respond(response)) => Ok(response),
            Some(Step::Reset(reason)) => Err(ConnectionError::Reset { reason }.into()),
            Some(Step::Hang) => std::future::pending().await,
            None => Err(Error::External("script exhausted".to_string())),
        }
    }

    async fn shutdown(&mut self) {
        self.script.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// Cursor store kept in memory; `fail_saves` makes every save fail.
#[derive(Clone, Default)]
pub(crate) struct MemoryCursor {
    value: Arc<Mutex<Option<i64>>>,
    saves: Arc<Mutex<Vec<i64>>>,
    fail_saves: bool,
}

impl MemoryCursor {
    pub(crate) fn starting_at(value: i64) -> Self {
        Self {
            value: Arc::new(Mutex::new(Some(value))),
            ..Self::default()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    pub(crate) fn saves(&self) -> Vec<i64> {
        self.saves.lock().unwrap().clone()
    }
}

impl CursorStore for MemoryCursor {
    fn load(&self) -> Result<i64> {
        Ok(self.value.lock().unwrap().unwrap_or(0))
    }

    fn save(&self, watermark: i64) -> Result<()> {
        if self.fail_saves {
            return Err(Error::store("memory", "disk full"));
        }
        *self.value.lock().unwrap() = Some(watermark);
        self.saves.lock().unwrap().push(watermark);
        Ok(())
    }
}

/// Records dispatched message ids; texts `stop`, `abort` and `fatal` pick the
/// matching outcome.
#[derive(Clone, Default)]
pub(crate) struct RecordingRouter {
    seen: Arc<Mutex<Vec<i32>>>,
}

impl RecordingRouter {
    pub(crate) fn seen(&self) -> Vec<i32> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRouter for RecordingRouter {
    async fn route(&mut self, message: &Message, _api: &mut BotApi) -> Result<Outcome> {
        self.seen.lock().unwrap().push(message.message_id.0);
        Ok(match message.text.as_deref() {
            Some("stop") => Outcome::Stop,
            Some("abort") => Outcome::Abort,
            Some("fatal") => Outcome::Fatal(Error::External("router gave up".to_string())),
            _ => Outcome::Continue,
        })
    }
}

pub(crate) fn bot_user(first_name: &str) -> Value {
    json!({"id": 1000, "is_bot": true, "first_name": first_name, "username": "blablabot"})
}

pub(crate) fn text_update(update_id: i64, message_id: i32, text: &str) -> Value {
    json!({
        "update_id": update_id,
        "message": {
            "message_id": message_id,
            "from": {"id": 42, "is_bot": false, "first_name": "Ann"},
            "chat": {"id": 42, "type": "private"},
            "date": 1_517_000_000,
            "text": text
        }
    })
}
