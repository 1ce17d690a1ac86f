use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiosk_core::{
    GenerateError, MediaAttachment, MediaError, MediaKind, Phase, RequestState, TextGenerator,
};
use ratatui::layout::Rect;
use tokio::sync::mpsc;

use crate::picker::FilePicker;
use crate::tui::AppEvent;

/// Most rows the prompt box grows to before it scrolls.
pub const MAX_PROMPT_ROWS: u16 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub request: RequestState,
    pub model: String,

    // Prompt editing
    pub prompt_cursor: usize, // cursor position in request.prompt, in chars

    // Response pane
    pub response_scroll: u16,
    pub response_height: u16,
    pub response_area: Option<Rect>, // for mouse hit-testing, updated during render

    // Media selection
    pub file_picker: Option<FilePicker>,
    pub media_loading: bool,
    media_dir: PathBuf,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    generator: Arc<dyn TextGenerator>,
    events: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        model: &str,
        media_dir: PathBuf,
        api_key_missing: bool,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let request = RequestState::new(api_key_missing);
        let input_mode = if request.input_enabled() {
            InputMode::Editing
        } else {
            InputMode::Normal
        };

        Self {
            should_quit: false,
            input_mode,
            request,
            model: model.to_string(),
            prompt_cursor: 0,
            response_scroll: 0,
            response_height: 0,
            response_area: None,
            file_picker: None,
            media_loading: false,
            media_dir,
            animation_frame: 0,
            generator,
            events,
        }
    }

    // Submission

    /// Send the current prompt and attachment. A no-op unless the request
    /// state allows a submission right now.
    pub fn submit(&mut self) -> bool {
        if self.media_loading {
            return false;
        }
        let Some(submission) = self.request.begin_submit() else {
            return false;
        };

        tracing::info!(
            prompt_chars = submission.prompt.chars().count(),
            media = submission
                .attachment
                .as_ref()
                .map(|m| m.mime_type.as_str())
                .unwrap_or("none"),
            "submitting prompt"
        );

        self.response_scroll = 0;
        self.animation_frame = 0;

        let generator = Arc::clone(&self.generator);
        let events = self.events.clone();
        tokio::spawn(async move {
            let request = tokio::spawn(async move {
                generator
                    .generate(&submission.prompt, submission.attachment.as_ref())
                    .await
            });
            let result = request.await.unwrap_or(Err(GenerateError::Aborted));
            // The UI may already be gone; the result is simply dropped then
            let _ = events.send(AppEvent::Generated(result));
        });

        true
    }

    pub fn on_generated(&mut self, result: Result<String, GenerateError>) {
        if !self.request.finish(result) {
            tracing::warn!("discarding generation result with no request in flight");
            return;
        }

        match self.request.phase {
            Phase::Success => tracing::info!("response ready"),
            Phase::Failed => tracing::warn!(
                error = self.request.error.as_deref().unwrap_or_default(),
                "request failed"
            ),
            Phase::Idle | Phase::Loading => {}
        }
    }

    // Media

    pub fn open_file_picker(&mut self, kind: MediaKind) {
        if !self.request.uploads_enabled() || self.media_loading {
            return;
        }

        match FilePicker::open(&self.media_dir, kind) {
            Ok(picker) => self.file_picker = Some(picker),
            Err(e) => {
                tracing::warn!(dir = %self.media_dir.display(), error = %e, "cannot open media directory");
                self.request
                    .report_error(format!("Cannot open {}: {}", self.media_dir.display(), e));
            }
        }
    }

    pub fn close_file_picker(&mut self) {
        self.file_picker = None;
    }

    /// Act on the picker's selection: descend into a directory or start
    /// loading a file.
    pub fn picker_enter(&mut self) {
        let Some(picker) = self.file_picker.as_mut() else {
            return;
        };

        match picker.enter() {
            Ok(Some(path)) => {
                self.media_dir = picker.dir.clone();
                self.file_picker = None;
                self.load_media(&path);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "cannot read directory");
                self.request.report_error(format!("Cannot open directory: {}", e));
                self.file_picker = None;
            }
        }
    }

    pub fn picker_parent(&mut self) {
        if let Some(picker) = self.file_picker.as_mut() {
            if let Err(e) = picker.parent() {
                tracing::warn!(error = %e, "cannot read parent directory");
            }
        }
    }

    /// Read a file in the background; the result arrives as
    /// `AppEvent::MediaLoaded`.
    pub fn load_media(&mut self, path: &Path) {
        if !self.request.uploads_enabled() || self.media_loading {
            return;
        }

        self.media_loading = true;
        let path = path.to_path_buf();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = MediaAttachment::load(&path).await;
            let _ = events.send(AppEvent::MediaLoaded(result));
        });
    }

    pub fn on_media_loaded(&mut self, result: Result<MediaAttachment, MediaError>) {
        self.media_loading = false;

        match result {
            Ok(media) => {
                let mime_type = media.mime_type.clone();
                let bytes = media.decoded_len();
                if self.request.attach(media) {
                    tracing::info!(mime_type = %mime_type, bytes, "attachment staged");
                } else {
                    tracing::warn!(mime_type = %mime_type, "attachment refused, uploads disabled");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load media");
                self.request.report_error(format!("Could not attach file: {}", e));
            }
        }
    }

    pub fn remove_attachment(&mut self) {
        if self.request.is_loading() {
            return;
        }
        if let Some(media) = self.request.remove_attachment() {
            tracing::info!(mime_type = %media.mime_type, "attachment removed");
        }
    }

    // Prompt editing

    pub fn insert_char(&mut self, c: char) {
        if !self.request.input_enabled() {
            return;
        }
        let byte_pos = char_to_byte_index(&self.request.prompt, self.prompt_cursor);
        self.request.prompt.insert(byte_pos, c);
        self.prompt_cursor += 1;
    }

    pub fn insert_str(&mut self, text: &str) {
        if !self.request.input_enabled() {
            return;
        }
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        let byte_pos = char_to_byte_index(&self.request.prompt, self.prompt_cursor);
        self.request.prompt.insert_str(byte_pos, &text);
        self.prompt_cursor += text.chars().count();
    }

    pub fn delete_before_cursor(&mut self) {
        if !self.request.input_enabled() || self.prompt_cursor == 0 {
            return;
        }
        self.prompt_cursor -= 1;
        let byte_pos = char_to_byte_index(&self.request.prompt, self.prompt_cursor);
        self.request.prompt.remove(byte_pos);
    }

    pub fn delete_at_cursor(&mut self) {
        if !self.request.input_enabled() {
            return;
        }
        let char_count = self.request.prompt.chars().count();
        if self.prompt_cursor < char_count {
            let byte_pos = char_to_byte_index(&self.request.prompt, self.prompt_cursor);
            self.request.prompt.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.prompt_cursor = self.prompt_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.request.prompt.chars().count();
        self.prompt_cursor = (self.prompt_cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.prompt_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.prompt_cursor = self.request.prompt.chars().count();
    }

    /// Row and column of the cursor inside the prompt text.
    pub fn cursor_row_col(&self) -> (usize, usize) {
        let before: String = self.request.prompt.chars().take(self.prompt_cursor).collect();
        let row = before.matches('\n').count();
        let col = before
            .rsplit('\n')
            .next()
            .map(|line| line.chars().count())
            .unwrap_or(0);
        (row, col)
    }

    /// Rows the prompt box needs, capped so the response keeps the screen.
    pub fn prompt_rows(&self) -> u16 {
        let lines = self.request.prompt.split('\n').count().max(1);
        lines.min(MAX_PROMPT_ROWS as usize) as u16
    }

    // Response scrolling

    pub fn scroll_down(&mut self) {
        self.response_scroll = self.response_scroll.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.response_scroll = self.response_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half = (self.response_height / 2).max(1);
        self.response_scroll = self.response_scroll.saturating_add(half);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half = (self.response_height / 2).max(1);
        self.response_scroll = self.response_scroll.saturating_sub(half);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.request.is_loading() || self.media_loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}
