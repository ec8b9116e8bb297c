//! Outgoing message channel shared by the request loop and the traced
//! thread.

use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

use linetrace_runtime::debug::is_dynamic_source;

use crate::protocol::{Event, MessageType, OutputEventBody, Request, Response, Source};

use super::protocol_io::write_message;

#[derive(Clone)]
pub(super) struct Outbox {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    next_seq: Arc<AtomicU32>,
}

impl Outbox {
    pub(super) fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
            next_seq: Arc::new(AtomicU32::new(1)),
        }
    }

    fn next_seq(&self) -> u32 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    pub(super) fn send(&self, message: &Value) -> io::Result<()> {
        let serialized = serde_json::to_string(message)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        let mut writer = self.writer.lock();
        write_message(&mut **writer, &serialized)
    }

    /// Build and send an event immediately.
    pub(super) fn emit<T: Serialize>(&self, name: &str, body: Option<T>) -> io::Result<()> {
        let event = self.event(name, body);
        self.send(&event)
    }

    pub(super) fn output(
        &self,
        category: &str,
        output: String,
        source: Option<Source>,
        line: Option<u32>,
    ) -> io::Result<()> {
        let body = OutputEventBody {
            output,
            category: Some(category.to_string()),
            source,
            line,
        };
        self.emit("output", Some(body))
    }

    pub(super) fn ok_response<T>(&self, request: &Request<Value>, body: Option<T>) -> Value
    where
        T: Serialize,
    {
        let body = body
            .map(|payload| serde_json::to_value(payload))
            .transpose()
            .unwrap_or(None);
        let response = Response {
            seq: self.next_seq(),
            message_type: MessageType::Response,
            request_seq: request.seq,
            success: true,
            command: request.command.clone(),
            message: None,
            body,
        };
        serde_json::to_value(response).unwrap_or(Value::Null)
    }

    pub(super) fn error_response(&self, request: &Request<Value>, message: &str) -> Value {
        let response: Response<Value> = Response {
            seq: self.next_seq(),
            message_type: MessageType::Response,
            request_seq: request.seq,
            success: false,
            command: request.command.clone(),
            message: Some(message.to_string()),
            body: None,
        };
        serde_json::to_value(response).unwrap_or(Value::Null)
    }

    pub(super) fn event<T>(&self, name: &str, body: Option<T>) -> Value
    where
        T: Serialize,
    {
        let body = body
            .map(|payload| serde_json::to_value(payload))
            .transpose()
            .unwrap_or(None);
        let event = Event {
            seq: self.next_seq(),
            message_type: MessageType::Event,
            event: name.to_string(),
            body,
        };
        serde_json::to_value(event).unwrap_or(Value::Null)
    }
}

/// DAP source for a frame file. Dynamic code has no path.
pub(super) fn source_for(file: &str) -> Source {
    if is_dynamic_source(file) {
        return Source {
            name: Some(file.to_string()),
            path: None,
        };
    }
    let name = Path::new(file)
        .file_name()
        .map_or_else(|| file.to_string(), |name| name.to_string_lossy().into_owned());
    Source {
        name: Some(name),
        path: Some(file.to_string()),
    }
}
