//! Native dialogs
//!
//! Blocking message boxes and file pickers backed by `rfd`. Every call
//! returns once the user has answered or cancelled.

use std::path::{Path, PathBuf};

use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

/// Severity of a message box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Error,
    Warning,
    Info,
}

impl MessageKind {
    fn level(self) -> MessageLevel {
        match self {
            Self::Error => MessageLevel::Error,
            Self::Warning => MessageLevel::Warning,
            Self::Info => MessageLevel::Info,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Info => "Info",
        }
    }
}

/// Buttons offered by a message box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageChoice {
    Ok,
    YesNo,
    OkCancel,
}

/// Show a message box; returns true for Ok/Yes
pub fn show_message_box(kind: MessageKind, choice: MessageChoice, message: &str) -> bool {
    let buttons = match choice {
        MessageChoice::Ok => MessageButtons::Ok,
        MessageChoice::YesNo => MessageButtons::YesNo,
        MessageChoice::OkCancel => MessageButtons::OkCancel,
    };

    let result = MessageDialog::new()
        .set_level(kind.level())
        .set_title(kind.title())
        .set_description(message)
        .set_buttons(buttons)
        .show();

    matches!(result, MessageDialogResult::Ok | MessageDialogResult::Yes)
}

pub fn show_error(message: &str) {
    show_message_box(MessageKind::Error, MessageChoice::Ok, message);
}

pub fn show_error_yes_no(message: &str) -> bool {
    show_message_box(MessageKind::Error, MessageChoice::YesNo, message)
}

pub fn show_error_ok_cancel(message: &str) -> bool {
    show_message_box(MessageKind::Error, MessageChoice::OkCancel, message)
}

pub fn show_warning(message: &str) {
    show_message_box(MessageKind::Warning, MessageChoice::Ok, message);
}

pub fn show_warning_yes_no(message: &str) -> bool {
    show_message_box(MessageKind::Warning, MessageChoice::YesNo, message)
}

pub fn show_warning_ok_cancel(message: &str) -> bool {
    show_message_box(MessageKind::Warning, MessageChoice::OkCancel, message)
}

pub fn show_info(message: &str) {
    show_message_box(MessageKind::Info, MessageChoice::Ok, message);
}

pub fn show_info_yes_no(message: &str) -> bool {
    show_message_box(MessageKind::Info, MessageChoice::YesNo, message)
}

pub fn show_info_ok_cancel(message: &str) -> bool {
    show_message_box(MessageKind::Info, MessageChoice::OkCancel, message)
}

/// Log an error and show it in a blocking dialog
pub fn report_error(context: &str, error: &dyn std::fmt::Display) {
    tracing::error!("{}: {}", context, error);
    show_error(&format!("{context}:\n{error}"));
}

/// Named file-type filter, e.g. `("Images", ["png", "jpg"])`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

impl FileFilter {
    pub fn new(name: impl Into<String>, extensions: &[&str]) -> Self {
        Self {
            name: name.into(),
            extensions: extensions.iter().map(|e| e.trim_start_matches('.').to_string()).collect(),
        }
    }

    /// Matches every file
    pub fn all_files() -> Self {
        Self::new("All Files", &["*"])
    }
}

fn file_dialog(title: &str, filters: &[FileFilter], directory: Option<&Path>) -> FileDialog {
    let dialog = filters
        .iter()
        .fold(FileDialog::new().set_title(title), |dialog, filter| {
            dialog.add_filter(filter.name.as_str(), &filter.extensions)
        });
    match directory {
        Some(dir) => dialog.set_directory(dir),
        None => dialog,
    }
}

/// Pick one existing file
pub fn open_file_dialog(filters: &[FileFilter], directory: Option<&Path>) -> Option<PathBuf> {
    file_dialog("Open File", filters, directory).pick_file()
}

/// Pick any number of existing files; empty when cancelled
pub fn open_files_dialog(filters: &[FileFilter], directory: Option<&Path>) -> Vec<PathBuf> {
    file_dialog("Open Files", filters, directory)
        .pick_files()
        .unwrap_or_default()
}

/// Choose a path to save to
pub fn save_file_dialog(filters: &[FileFilter], directory: Option<&Path>) -> Option<PathBuf> {
    file_dialog("Save File", filters, directory).save_file()
}

pub fn pick_folder_dialog(directory: Option<&Path>) -> Option<PathBuf> {
    file_dialog("Select Folder", &[], directory).pick_folder()
}
