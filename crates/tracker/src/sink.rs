//! Attachment sinks
//!
//! Rendered reports are handed to an [`AttachmentSink`], together with
//! short key/value parameters describing the run. The directory sink drops
//! each attachment into an output folder for a CI job to archive and keeps
//! parameters in `parameters.json`; the memory sink keeps both for
//! inspection in tests.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use perftrack_common::{sanitize_name, Result};

/// File the directory sink stores parameters in
pub const PARAMETERS_FILE: &str = "parameters.json";

/// Media type of an attachment body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Markdown,
    Csv,
    Text,
    Json,
    Html,
}

impl ContentType {
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::Markdown => "text/markdown",
            ContentType::Csv => "text/csv",
            ContentType::Text => "text/plain",
            ContentType::Json => "application/json",
            ContentType::Html => "text/html",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ContentType::Markdown => "md",
            ContentType::Csv => "csv",
            ContentType::Text => "txt",
            ContentType::Json => "json",
            ContentType::Html => "html",
        }
    }

    /// Guess the type of a report file from its extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("html") | Some("htm") => ContentType::Html,
            Some("json") => ContentType::Json,
            Some("md") => ContentType::Markdown,
            Some("csv") => ContentType::Csv,
            _ => ContentType::Text,
        }
    }
}

/// A named, typed text blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub content_type: ContentType,
    pub body: String,
}

impl Attachment {
    pub fn new(name: impl Into<String>, content_type: ContentType, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_type,
            body: body.into(),
        }
    }

    pub fn markdown(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(name, ContentType::Markdown, body)
    }

    pub fn csv(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(name, ContentType::Csv, body)
    }

    pub fn text(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(name, ContentType::Text, body)
    }

    /// File name the attachment is stored under
    pub fn file_name(&self) -> String {
        format!("{}.{}", sanitize_name(&self.name), self.content_type.extension())
    }
}

/// Receiver of rendered reports and run parameters
pub trait AttachmentSink {
    fn attach(&self, attachment: Attachment) -> Result<()>;

    /// Record a named value; a later value for the same name replaces it
    fn parameter(&self, name: &str, value: &str) -> Result<()>;
}

impl<S: AttachmentSink + ?Sized> AttachmentSink for &S {
    fn attach(&self, attachment: Attachment) -> Result<()> {
        (**self).attach(attachment)
    }

    fn parameter(&self, name: &str, value: &str) -> Result<()> {
        (**self).parameter(name, value)
    }
}

/// Writes each attachment to `<dir>/<sanitized-name>.<ext>`.
///
/// A later attachment with the same name replaces the earlier file.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn parameters_path(&self) -> PathBuf {
        self.dir.join(PARAMETERS_FILE)
    }

    /// Parameters written so far; an unreadable file reads as empty
    pub fn parameters(&self) -> Result<BTreeMap<String, String>> {
        let path = self.parameters_path();
        let content = match std::fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_slice(&content).unwrap_or_else(|e| {
            warn!("Ignoring corrupt parameters file {}: {}", path.display(), e);
            BTreeMap::new()
        }))
    }
}

impl AttachmentSink for DirectorySink {
    fn attach(&self, attachment: Attachment) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let path = self.dir.join(attachment.file_name());
        std::fs::write(&path, attachment.body.as_bytes())?;

        debug!(
            "Attached '{}' ({}) to {}",
            attachment.name,
            attachment.content_type.mime(),
            path.display()
        );
        Ok(())
    }

    fn parameter(&self, name: &str, value: &str) -> Result<()> {
        let mut parameters = self.parameters()?;
        parameters.insert(name.to_string(), value.to_string());

        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.parameters_path(), serde_json::to_vec_pretty(&parameters)?)?;
        Ok(())
    }
}

/// Collects attachments in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    attachments: Mutex<Vec<Attachment>>,
    parameters: Mutex<BTreeMap<String, String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attachments(&self) -> Vec<Attachment> {
        self.attachments.lock().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.attachments.lock().iter().map(|a| a.name.clone()).collect()
    }

    /// Most recent attachment with the given name
    pub fn find(&self, name: &str) -> Option<Attachment> {
        self.attachments
            .lock()
            .iter()
            .rev()
            .find(|a| a.name == name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.attachments.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.lock().is_empty()
    }

    pub fn parameters(&self) -> BTreeMap<String, String> {
        self.parameters.lock().clone()
    }

    pub fn parameter_value(&self, name: &str) -> Option<String> {
        self.parameters.lock().get(name).cloned()
    }

    pub fn clear(&self) {
        self.attachments.lock().clear();
        self.parameters.lock().clear();
    }
}

impl AttachmentSink for MemorySink {
    fn attach(&self, attachment: Attachment) -> Result<()> {
        self.attachments.lock().push(attachment);
        Ok(())
    }

    fn parameter(&self, name: &str, value: &str) -> Result<()> {
        self.parameters
            .lock()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }
}
