//! Scripted in-memory transport for session tests.

use crate::transport::{Connector, Transport, TransportError};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub enum Event {
    Frame(String),
    /// The server drops the connection.
    Closed,
}

impl Event {
    pub fn frame(value: Value) -> Self {
        Event::Frame(value.to_string())
    }
}

pub fn response(id: u64, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

pub fn log_message(kind: u32, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "window/logMessage",
        "params": { "type": kind, "message": message }
    })
}

#[derive(Default)]
struct Shared {
    /// One entry per future connect call; `Err` refuses that attempt.
    plan: VecDeque<Result<Vec<Event>, ()>>,
    sent: Vec<Vec<String>>,
    closed: Vec<bool>,
    connects: usize,
}

/// Hands out one scripted transport per successful connect. Once the plan is
/// exhausted every further connect is refused.
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    shared: Arc<Mutex<Shared>>,
}

impl ScriptedConnector {
    pub fn new(plan: Vec<Result<Vec<Event>, ()>>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                plan: plan.into(),
                ..Shared::default()
            })),
        }
    }

    pub fn connects(&self) -> usize {
        self.shared.lock().unwrap().connects
    }

    /// Frames the client sent on the n-th established connection.
    pub fn sent_on(&self, connection: usize) -> Vec<String> {
        self.shared.lock().unwrap().sent[connection].clone()
    }

    pub fn sent_values(&self, connection: usize) -> Vec<Value> {
        self.sent_on(connection)
            .iter()
            .map(|f| serde_json::from_str(f).unwrap())
            .collect()
    }

    pub fn closed(&self, connection: usize) -> bool {
        self.shared.lock().unwrap().closed[connection]
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Transport = ScriptedTransport;

    async fn connect(&self, _address: &str) -> Result<ScriptedTransport, TransportError> {
        let mut shared = self.shared.lock().unwrap();
        shared.connects += 1;
        match shared.plan.pop_front() {
            Some(Ok(events)) => {
                let index = shared.sent.len();
                shared.sent.push(Vec::new());
                shared.closed.push(false);
                Ok(ScriptedTransport {
                    index,
                    events: events.into(),
                    dropped: false,
                    shared: self.shared.clone(),
                })
            }
            Some(Err(())) | None => Err(TransportError::Refused),
        }
    }
}

pub struct ScriptedTransport {
    index: usize,
    events: VecDeque<Event>,
    dropped: bool,
    shared: Arc<Mutex<Shared>>,
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        if self.dropped {
            return Err(TransportError::Closed);
        }
        self.shared.lock().unwrap().sent[self.index].push(frame.to_string());
        Ok(())
    }

    async fn recv(&mut self) -> Result<String, TransportError> {
        match self.events.pop_front() {
            Some(Event::Frame(text)) => Ok(text),
            Some(Event::Closed) => {
                self.dropped = true;
                Err(TransportError::Closed)
            }
            // a silent server
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.shared.lock().unwrap().closed[self.index] = true;
        Ok(())
    }
}
