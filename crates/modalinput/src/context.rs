//! # Contexts
//!
//! ## Overview
//!
//! This module contains the data passed around while resolving keys:
//!
//! * [EditorState] is the read-only view of the editor that the input handler consults before
//!   each lookup.
//! * [LookupContext] is what the [Registry](crate::registry::Registry) uses to filter bindings:
//!   the current mode, file type, and the flags and variables that guard conditions refer to.
//! * [ModeContext] is handed to modes when they are entered or exited, or asked to handle an
//!   unmapped key.
use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::Value;

/// A line and column within a buffer.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq)]
pub struct Position {
    /// Zero-indexed line.
    pub line: usize,
    /// Zero-indexed column.
    pub column: usize,
}

impl Position {
    /// Create a new position.
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

/// Describes the current selection.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SelectionInfo {
    /// Where the selection started.
    pub anchor: Position,
    /// Where the cursor is within the selection.
    pub head: Position,
    /// Whether the selection covers whole lines.
    pub linewise: bool,
}

/// A read-only view of the editor used to refresh the lookup context before each key.
#[allow(unused_variables)]
pub trait EditorState: Send + Sync {
    /// The language or file type of the focused buffer, like `rust` or `go`.
    fn file_type(&self) -> Option<String> {
        None
    }

    /// The path of the focused buffer, if it has one.
    fn file_path(&self) -> Option<PathBuf> {
        None
    }

    /// The current selection, if there is one.
    fn selection(&self) -> Option<SelectionInfo> {
        None
    }

    /// Whether the focused buffer has unsaved changes.
    fn is_modified(&self) -> bool {
        false
    }

    /// Whether the focused buffer can be edited.
    fn is_readonly(&self) -> bool {
        false
    }

    /// The cursor position in the focused buffer.
    fn cursor(&self) -> Position {
        Position::default()
    }
}

/// A copy of the editor's state taken at one point in time.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EditorSnapshot {
    /// See [EditorState::file_type].
    pub file_type: Option<String>,
    /// See [EditorState::file_path].
    pub file_path: Option<PathBuf>,
    /// See [EditorState::selection].
    pub selection: Option<SelectionInfo>,
    /// See [EditorState::is_modified].
    pub modified: bool,
    /// See [EditorState::is_readonly].
    pub readonly: bool,
    /// See [EditorState::cursor].
    pub cursor: Position,
}

impl EditorSnapshot {
    /// Copy the current values out of an [EditorState].
    pub fn capture(state: &dyn EditorState) -> Self {
        EditorSnapshot {
            file_type: state.file_type(),
            file_path: state.file_path(),
            selection: state.selection(),
            modified: state.is_modified(),
            readonly: state.is_readonly(),
            cursor: state.cursor(),
        }
    }
}

impl EditorState for EditorSnapshot {
    fn file_type(&self) -> Option<String> {
        self.file_type.clone()
    }

    fn file_path(&self) -> Option<PathBuf> {
        self.file_path.clone()
    }

    fn selection(&self) -> Option<SelectionInfo> {
        self.selection
    }

    fn is_modified(&self) -> bool {
        self.modified
    }

    fn is_readonly(&self) -> bool {
        self.readonly
    }

    fn cursor(&self) -> Position {
        self.cursor
    }
}

/// The context used to filter and rank bindings during a lookup.
#[derive(Clone, Debug, Default)]
pub struct LookupContext {
    /// The current mode. Global bindings are always considered.
    pub mode: Option<String>,

    /// The current file type. Bindings restricted to another file type are skipped.
    pub file_type: Option<String>,

    /// Boolean flags that guard conditions can refer to by name.
    pub flags: HashMap<String, bool>,

    /// String variables that guard conditions can compare with `==`.
    pub variables: HashMap<String, String>,
}

impl LookupContext {
    /// Create an empty context.
    pub fn new() -> Self {
        LookupContext::default()
    }

    /// Set the current mode.
    pub fn with_mode<S: Into<String>>(mut self, mode: S) -> Self {
        self.mode = Some(mode.into());
        self
    }

    /// Set the current file type.
    pub fn with_file_type<S: Into<String>>(mut self, file_type: S) -> Self {
        self.file_type = Some(file_type.into());
        self
    }

    /// Set a boolean flag.
    pub fn with_flag<S: Into<String>>(mut self, name: S, value: bool) -> Self {
        self.flags.insert(name.into(), value);
        self
    }

    /// Set a string variable.
    pub fn with_variable<S: Into<String>, V: Into<String>>(mut self, name: S, value: V) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Look up a flag. Unknown flags are false.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// Look up a variable.
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    /// Refresh the file type, flags and variables derived from the editor's state.
    pub fn refresh(&mut self, editor: &dyn EditorState) {
        self.file_type = editor.file_type();

        self.flags.insert("editorReadonly".into(), editor.is_readonly());
        self.flags.insert("editorModified".into(), editor.is_modified());
        self.flags.insert("editorHasSelection".into(), editor.selection().is_some());

        match &self.file_type {
            Some(ft) => self.variables.insert("resourceLangId".into(), ft.clone()),
            None => self.variables.remove("resourceLangId"),
        };

        match editor.file_path() {
            Some(path) => {
                let filename = path.file_name().map(|f| f.to_string_lossy().into_owned());

                self.variables
                    .insert("resourcePath".into(), path.to_string_lossy().into_owned());

                if let Some(filename) = filename {
                    self.variables.insert("resourceFilename".into(), filename);
                }
            },
            None => {
                self.variables.remove("resourcePath");
                self.variables.remove("resourceFilename");
            },
        }

        match &self.mode {
            Some(mode) => self.variables.insert("mode".into(), mode.clone()),
            None => self.variables.remove("mode"),
        };
    }
}

/// Data passed to modes during a transition, or while handling an unmapped key.
#[derive(Clone, Debug, Default)]
pub struct ModeContext {
    /// The mode being left.
    pub previous: Option<String>,

    /// The mode being entered.
    pub next: Option<String>,

    /// The editor's state when the transition began.
    pub editor: Option<EditorSnapshot>,

    /// The current selection.
    pub selection: Option<SelectionInfo>,

    /// The register that was selected before the transition.
    pub register: Option<char>,

    /// The count that was typed before the transition.
    pub count: Option<usize>,

    /// Anything else a mode might want to know about.
    pub extra: HashMap<String, Value>,
}

impl ModeContext {
    /// Create a context carrying a snapshot of the editor.
    pub fn from_editor(editor: EditorSnapshot) -> Self {
        ModeContext {
            selection: editor.selection,
            editor: Some(editor),
            ..ModeContext::default()
        }
    }
}
