#![allow(dead_code)]
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use wiki_batch_upload::api::{ApiTransport, Params};
use wiki_batch_upload::queue::FileQueue;
use wiki_batch_upload::ApiError;

/// One request seen by the scripted transport.
#[derive(Debug, Clone)]
pub enum Call {
    Form(Vec<(String, String)>),
    Upload {
        params: Vec<(String, String)>,
        file_name: String,
        bytes: Vec<u8>,
    },
}

impl Call {
    pub fn params(&self) -> &[(String, String)] {
        match self {
            Call::Form(p) => p,
            Call::Upload { params, .. } => params,
        }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_token_fetch(&self, kind: &str) -> bool {
        self.param("meta") == Some("tokens") && self.param("type") == Some(kind)
    }
}

/// In-memory stand-in for the wiki. Uploads succeed unless scripted
/// otherwise; every token fetch issues a new numbered token.
#[derive(Default)]
pub struct ScriptedTransport {
    pub calls: RefCell<Vec<Call>>,
    upload_replies: HashMap<String, Value>,
    upload_failures: HashSet<String>,
    failing_csrf_fetches: HashSet<usize>,
    csrf_fetches: Cell<usize>,
    login_reply: Option<Value>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_upload_reply(mut self, file_name: &str, reply: Value) -> Self {
        self.upload_replies.insert(file_name.to_string(), reply);
        self
    }

    pub fn with_upload_failure(mut self, file_name: &str) -> Self {
        self.upload_failures.insert(file_name.to_string());
        self
    }

    /// Make the n-th (1-based) csrf token fetch return an error envelope.
    pub fn with_failing_csrf_fetch(mut self, n: usize) -> Self {
        self.failing_csrf_fetches.insert(n);
        self
    }

    pub fn with_login_reply(mut self, reply: Value) -> Self {
        self.login_reply = Some(reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn uploads(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Upload { .. }))
            .collect()
    }

    pub fn uploaded_names(&self) -> Vec<String> {
        self.uploads()
            .iter()
            .filter_map(|c| c.param("filename").map(str::to_string))
            .collect()
    }

    pub fn token_fetches(&self, kind: &str) -> usize {
        self.calls().iter().filter(|c| c.is_token_fetch(kind)).count()
    }
}

fn owned(params: Params) -> Vec<(String, String)> {
    params.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

impl ApiTransport for ScriptedTransport {
    fn post_form(&self, params: Params) -> Result<Value, ApiError> {
        let call = Call::Form(owned(params));
        let reply = if call.is_token_fetch("login") {
            json!({"query": {"tokens": {"logintoken": "login-token+\\"}}})
        } else if call.is_token_fetch("csrf") {
            let n = self.csrf_fetches.get() + 1;
            self.csrf_fetches.set(n);
            if self.failing_csrf_fetches.contains(&n) {
                json!({"error": {"code": "assertuserfailed", "info": "You are no longer logged in."}})
            } else {
                json!({"query": {"tokens": {"csrftoken": format!("csrf-{}+\\", n)}}})
            }
        } else if call.param("action") == Some("login") {
            self.login_reply
                .clone()
                .unwrap_or_else(|| json!({"login": {"result": "Success", "lgusername": "UploadBot"}}))
        } else {
            json!({"error": {"code": "badvalue", "info": "Unrecognized action"}})
        };
        self.calls.borrow_mut().push(call);
        Ok(reply)
    }

    fn post_upload(&self, params: Params, file_name: &str, mut file: File) -> Result<Value, ApiError> {
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        self.calls.borrow_mut().push(Call::Upload {
            params: owned(params),
            file_name: file_name.to_string(),
            bytes,
        });
        if self.upload_failures.contains(file_name) {
            return Err(ApiError::Io(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )));
        }
        Ok(self
            .upload_replies
            .get(file_name)
            .cloned()
            .unwrap_or_else(|| json!({"upload": {"result": "Success", "filename": file_name}})))
    }
}

/// Staging and completed directories inside a temp dir.
pub fn staged_queue(root: &Path, files: &[(&str, &[u8])]) -> FileQueue {
    let queue = FileQueue::new(root.join("upload"), root.join("done"));
    queue.prepare(&mut io::sink()).expect("create queue dirs");
    for (name, contents) in files {
        std::fs::write(queue.upload_dir().join(name), contents).expect("stage file");
    }
    queue
}

pub fn dir_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a thread-local subscriber and return the log lines it wrote.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
    let buf = LogBuffer::default();
    let writer = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .with_max_level(tracing::Level::INFO)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
    (result, text.lines().map(str::to_string).collect())
}

pub fn lines_at(lines: &[String], level: &str) -> Vec<String> {
    lines
        .iter()
        .filter(|l| l.trim_start().starts_with(level))
        .cloned()
        .collect()
}
