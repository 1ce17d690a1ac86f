//! File picker overlay
//!
//! Stands in for the browser's file dialog: lists subdirectories and the
//! files that match the upload control's accept filter.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use kiosk_core::MediaKind;
use ratatui::widgets::ListState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
}

pub struct FilePicker {
    pub kind: MediaKind,
    pub dir: PathBuf,
    pub entries: Vec<PickerEntry>,
    pub state: ListState,
}

impl FilePicker {
    pub fn open(dir: &Path, kind: MediaKind) -> io::Result<Self> {
        let mut picker = Self {
            kind,
            dir: dir.to_path_buf(),
            entries: Vec::new(),
            state: ListState::default(),
        };
        picker.change_dir(dir)?;
        Ok(picker)
    }

    pub fn nav_down(&mut self) {
        let len = self.entries.len();
        if len > 0 {
            let i = self.state.selected().unwrap_or(0);
            self.state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn nav_up(&mut self) {
        let i = self.state.selected().unwrap_or(0);
        self.state.select(Some(i.saturating_sub(1)));
    }

    pub fn selected(&self) -> Option<&PickerEntry> {
        self.state.selected().and_then(|i| self.entries.get(i))
    }

    /// Open the selected directory, or return the selected file.
    pub fn enter(&mut self) -> io::Result<Option<PathBuf>> {
        let Some(entry) = self.selected().cloned() else {
            return Ok(None);
        };

        if entry.is_dir {
            self.change_dir(&entry.path)?;
            Ok(None)
        } else {
            Ok(Some(entry.path))
        }
    }

    pub fn parent(&mut self) -> io::Result<()> {
        match self.dir.parent().map(Path::to_path_buf) {
            Some(parent) => self.change_dir(&parent),
            None => Ok(()),
        }
    }

    fn change_dir(&mut self, dir: &Path) -> io::Result<()> {
        self.entries = read_entries(dir, self.kind)?;
        self.dir = dir.to_path_buf();
        self.state = ListState::default();
        if !self.entries.is_empty() {
            self.state.select(Some(0));
        }
        Ok(())
    }
}

fn read_entries(dir: &Path, kind: MediaKind) -> io::Result<Vec<PickerEntry>> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }

        let path = entry.path();
        if path.is_dir() {
            dirs.push(PickerEntry { path, name, is_dir: true });
        } else if kind.accepts(&path) {
            files.push(PickerEntry { path, name, is_dir: false });
        }
    }

    dirs.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    files.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    let mut entries = Vec::with_capacity(dirs.len() + files.len() + 1);
    if let Some(parent) = dir.parent() {
        entries.push(PickerEntry {
            path: parent.to_path_buf(),
            name: "..".to_string(),
            is_dir: true,
        });
    }
    entries.extend(dirs);
    entries.extend(files);
    Ok(entries)
}
