/**
 * Payload types posted to the collector.
 *
 * The notice body has the shape:
 * ```json
 * {
 *   "errors": [{ "type": "...", "message": "...", "backtrace": [...] }],
 *   "context": { "notifier": {...}, "environment": "production" },
 *   "params": {}
 * }
 * ```
 *
 * The first entry of `errors` is the primary error; the rest are its
 * causes, outermost first.
 */
use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::frames;

// ---------------------------------------------------------------------------
// Notice
// ---------------------------------------------------------------------------

/**
 * One error report.
 *
 * Built by the caller (directly, or via `Notice::from_error`) and handed to
 * `AsyncSender::send`. Immutable once enqueued: the worker only reads it.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    /// Primary error first, then its `source()` chain.
    pub errors: Vec<NoticeError>,

    /// Notifier identity, environment and other metadata.
    #[serde(default)]
    pub context: Map<String, Value>,

    /// Free-form parameters attached by the caller.
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Notice {
    /**
     * Creates a notice carrying a single error record with a backtrace
     * captured at the call site.
     */
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![NoticeError {
                kind: kind.into(),
                message: message.into(),
                backtrace: frames::capture_backtrace(),
            }],
            context: Map::new(),
            params: Map::new(),
        }
    }

    /**
     * Builds a notice from a Rust error and its whole `source()` chain.
     *
     * Only the outermost error gets a backtrace: the causes were created
     * somewhere we can no longer observe.
     *
     * Each `type` is guessed from the error's `Debug` output, which for
     * enum-shaped errors names the variant rather than the type
     * (`std::io::Error` reports `Os` or `Custom`). Use
     * `from_error_with_kind` to name the outermost error explicitly.
     */
    pub fn from_error(error: &(dyn Error + 'static)) -> Self {
        Self::from_error_with_kind(type_label(error), error)
    }

    /// Like `from_error`, but the primary record's `type` is `kind`.
    pub fn from_error_with_kind(kind: impl Into<String>, error: &(dyn Error + 'static)) -> Self {
        let mut notice = Self::new(kind, error.to_string());

        let mut source = error.source();
        while let Some(cause) = source {
            notice.errors.push(NoticeError {
                kind: type_label(cause),
                message: cause.to_string(),
                backtrace: Vec::new(),
            });
            source = cause.source();
        }

        notice
    }

    /// The error the notice is about, if any.
    pub fn primary_error(&self) -> Option<&NoticeError> {
        self.errors.first()
    }

    /// Attaches a parameter, replacing an existing one with the same key.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/*
 * `dyn Error` carries no type name at runtime; the Debug output of most
 * errors starts with the type or variant name, which is the closest stable
 * label we can get.
 */
fn type_label(error: &dyn Error) -> String {
    let debug = format!("{error:?}");
    let label: String = debug
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == ':')
        .collect();

    if label.is_empty() {
        "Error".to_string()
    } else {
        label
    }
}

// ---------------------------------------------------------------------------
// NoticeError
// ---------------------------------------------------------------------------

/// A structured error record: type, message and ordered stack frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoticeError {
    #[serde(rename = "type")]
    pub kind: String,

    pub message: String,

    /// Most recent call first.
    #[serde(default)]
    pub backtrace: Vec<BacktraceFrame>,
}

impl NoticeError {
    /**
     * Renders the backtrace one frame per line:
     * ``src/main.rs:10 in `main'``.
     */
    pub fn render_backtrace(&self) -> String {
        self.backtrace
            .iter()
            .map(BacktraceFrame::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ---------------------------------------------------------------------------
// BacktraceFrame
// ---------------------------------------------------------------------------

/**
 * A single resolved stack frame.
 *
 * Frames with unresolved pieces keep the placeholders produced by
 * `frames::convert_backtrace` (`<unknown>` and line `0`).
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktraceFrame {
    pub file: String,

    pub line: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,

    pub function: String,
}

impl fmt::Display for BacktraceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} in `{}'", self.file, self.line, self.function)
    }
}

// ---------------------------------------------------------------------------
// DeployInfo
// ---------------------------------------------------------------------------

/**
 * A deploy announcement. Every field is optional; `environment` falls back
 * to `Config::environment` when left empty.
 */
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeployInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Outer {
        inner: std::io::Error,
    }

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "could not load settings")
        }
    }

    impl Error for Outer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.inner)
        }
    }

    /**
     * The cause chain becomes additional error records, outermost first.
     */
    #[test]
    fn test_from_error_walks_source_chain() {
        let error = Outer {
            inner: std::io::Error::new(std::io::ErrorKind::NotFound, "settings.toml missing"),
        };

        let notice = Notice::from_error(&error);

        assert_eq!(notice.errors.len(), 2);
        assert_eq!(notice.errors[0].kind, "Outer");
        assert_eq!(notice.errors[0].message, "could not load settings");
        assert_eq!(notice.errors[1].kind, "Custom");
        assert_eq!(notice.errors[1].message, "settings.toml missing");
        assert!(notice.errors[1].backtrace.is_empty());
    }

    /**
     * An explicit kind replaces the Debug guess (`Custom` for io errors) on
     * the primary record; causes keep their guessed labels.
     */
    #[test]
    fn test_from_error_with_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "settings.toml missing");
        assert_eq!(Notice::from_error(&io).errors[0].kind, "Custom");

        let notice = Notice::from_error_with_kind("std::io::Error", &io);
        assert_eq!(notice.errors.len(), 1);
        assert_eq!(notice.errors[0].kind, "std::io::Error");
        assert_eq!(notice.errors[0].message, "settings.toml missing");

        let wrapped = Outer {
            inner: std::io::Error::new(std::io::ErrorKind::NotFound, "settings.toml missing"),
        };
        let notice = Notice::from_error_with_kind("SettingsError", &wrapped);
        assert_eq!(notice.errors[0].kind, "SettingsError");
        assert_eq!(notice.errors[1].kind, "Custom");
    }

    #[test]
    fn test_frame_rendering() {
        let error = NoticeError {
            kind: "RuntimeError".into(),
            message: "boom".into(),
            backtrace: vec![
                BacktraceFrame {
                    file: "src/app.rs".into(),
                    line: 12,
                    column: Some(5),
                    function: "app::run".into(),
                },
                BacktraceFrame {
                    file: "src/main.rs".into(),
                    line: 3,
                    column: None,
                    function: "main".into(),
                },
            ],
        };

        assert_eq!(
            error.render_backtrace(),
            "src/app.rs:12 in `app::run'\nsrc/main.rs:3 in `main'"
        );
    }

    /**
     * The collector expects `type`, not `kind`, and omits absent deploy fields.
     */
    #[test]
    fn test_wire_field_names() {
        let notice = Notice {
            errors: vec![NoticeError {
                kind: "E".into(),
                message: "m".into(),
                backtrace: Vec::new(),
            }],
            context: Map::new(),
            params: Map::new(),
        }
        .with_param("user_id", 42);

        let json = serde_json::to_value(&notice).unwrap();
        assert_eq!(json["errors"][0]["type"], "E");
        assert_eq!(json["params"]["user_id"], 42);

        let deploy = DeployInfo {
            revision: Some("abc123".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&deploy).unwrap();
        assert_eq!(json, serde_json::json!({ "revision": "abc123" }));
    }
}
