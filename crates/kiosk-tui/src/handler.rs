use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use kiosk_core::MediaKind;

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => {
            if app.input_mode == InputMode::Editing && app.file_picker.is_none() {
                app.insert_str(&text);
            }
        }
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Generated(result) => app.on_generated(result),
        AppEvent::MediaLoaded(result) => app.on_media_loaded(result),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.file_picker.is_some() {
        handle_picker(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.close_file_picker(),
        KeyCode::Char('j') | KeyCode::Down => {
            if let Some(picker) = app.file_picker.as_mut() {
                picker.nav_down();
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if let Some(picker) = app.file_picker.as_mut() {
                picker.nav_up();
            }
        }
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => app.picker_enter(),
        KeyCode::Backspace | KeyCode::Char('h') | KeyCode::Left => app.picker_parent(),
        _ => {}
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Half-page scroll (before plain 'd' so Ctrl+D matches first)
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }

        KeyCode::Char('i') => app.open_file_picker(MediaKind::Image),
        KeyCode::Char('v') => app.open_file_picker(MediaKind::Video),
        KeyCode::Char('d') => app.remove_attachment(),

        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('g') => app.response_scroll = 0,
        KeyCode::PageDown => app.scroll_half_page_down(),
        KeyCode::PageUp => app.scroll_half_page_up(),

        KeyCode::Char('e') | KeyCode::Enter => {
            if app.request.input_enabled() {
                app.input_mode = InputMode::Editing;
                app.cursor_end();
            }
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,

        // Shift+Enter where the terminal reports it, Alt+Enter everywhere
        KeyCode::Enter
            if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            app.insert_char('\n');
        }
        KeyCode::Enter => {
            app.submit();
        }

        KeyCode::Char('o') if ctrl => app.open_file_picker(MediaKind::Image),
        KeyCode::Char('g') if ctrl => app.open_file_picker(MediaKind::Video),
        KeyCode::Char('x') if ctrl => app.remove_attachment(),
        KeyCode::Char('u') if ctrl => {
            while app.prompt_cursor > 0 {
                app.delete_before_cursor();
            }
        }

        KeyCode::Backspace => app.delete_before_cursor(),
        KeyCode::Delete => app.delete_at_cursor(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::PageDown => app.scroll_half_page_down(),
        KeyCode::PageUp => app.scroll_half_page_up(),
        KeyCode::Char(c) if !ctrl => app.insert_char(c),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let over_response = app.response_area.is_some_and(|area| {
        mouse.column >= area.x
            && mouse.column < area.x + area.width
            && mouse.row >= area.y
            && mouse.row < area.y + area.height
    });
    if !over_response {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(),
        MouseEventKind::ScrollUp => app.scroll_up(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use kiosk_core::error::{BAD_REQUEST_MESSAGE, UNKNOWN_FAILURE_MESSAGE};
    use kiosk_core::{GenerateError, MediaAttachment, Phase, TextGenerator};
    use tokio::sync::mpsc;

    use crate::app::MAX_PROMPT_ROWS;

    struct ScriptedGenerator {
        calls: AtomicUsize,
        seen: Mutex<Vec<(String, Option<MediaAttachment>)>>,
        reply: fn() -> Result<String, GenerateError>,
    }

    impl ScriptedGenerator {
        fn new(reply: fn() -> Result<String, GenerateError>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
                reply,
            })
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(
            &self,
            prompt: &str,
            media: Option<&MediaAttachment>,
        ) -> Result<String, GenerateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((prompt.to_string(), media.cloned()));
            (self.reply)()
        }
    }

    fn app_with(
        generator: Arc<ScriptedGenerator>,
        api_key_missing: bool,
    ) -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(generator, "gemini-2.5-flash", std::env::temp_dir(), api_key_missing, tx);
        (app, rx)
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c)));
        }
    }

    fn image() -> MediaAttachment {
        MediaAttachment::from_data_url("data:image/png;base64,iVBORw0KGgo=").unwrap()
    }

    #[tokio::test]
    async fn test_hello_end_to_end() {
        let generator = ScriptedGenerator::new(|| Ok("Hello! How can I help you today?".to_string()));
        let (mut app, mut rx) = app_with(generator.clone(), false);

        type_text(&mut app, "Hello");
        handle_event(&mut app, key(KeyCode::Enter));
        assert_eq!(app.request.phase, Phase::Loading);

        let event = rx.recv().await.unwrap();
        handle_event(&mut app, event);

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(generator.seen.lock().unwrap()[0], ("Hello".to_string(), None));
        assert_eq!(app.request.phase, Phase::Success);
        assert_eq!(app.request.response, "Hello! How can I help you today?");
        assert!(!app.request.is_loading());
    }

    #[tokio::test]
    async fn test_blank_submit_is_noop() {
        let generator = ScriptedGenerator::new(|| Ok("unused".to_string()));
        let (mut app, _rx) = app_with(generator.clone(), false);

        type_text(&mut app, "   ");
        handle_event(&mut app, key(KeyCode::Enter));
        tokio::task::yield_now().await;

        assert_eq!(app.request.phase, Phase::Idle);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_while_loading_is_noop() {
        let generator = ScriptedGenerator::new(|| Ok("first".to_string()));
        let (mut app, mut rx) = app_with(generator.clone(), false);

        type_text(&mut app, "one");
        handle_event(&mut app, key(KeyCode::Enter));
        assert!(!app.submit());

        let event = rx.recv().await.unwrap();
        handle_event(&mut app, event);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(app.request.response, "first");
    }

    #[tokio::test]
    async fn test_failure_shows_error_and_stays_interactive() {
        let generator = ScriptedGenerator::new(|| {
            Err(GenerateError::Api {
                status: 400,
                message: "Request contains an invalid argument.".to_string(),
            })
        });
        let (mut app, mut rx) = app_with(generator, false);

        type_text(&mut app, "describe");
        handle_event(&mut app, key(KeyCode::Enter));
        let event = rx.recv().await.unwrap();
        handle_event(&mut app, event);

        assert_eq!(app.request.phase, Phase::Failed);
        assert_eq!(app.request.error.as_deref(), Some(BAD_REQUEST_MESSAGE));
        assert!(app.request.can_submit());
    }

    #[tokio::test]
    async fn test_media_only_submission() {
        let generator = ScriptedGenerator::new(|| Ok("A tiny PNG.".to_string()));
        let (mut app, mut rx) = app_with(generator.clone(), false);

        handle_event(&mut app, AppEvent::MediaLoaded(Ok(image())));
        assert_eq!(app.request.attachment, Some(image()));

        handle_event(&mut app, key(KeyCode::Enter));
        let event = rx.recv().await.unwrap();
        handle_event(&mut app, event);

        assert_eq!(generator.seen.lock().unwrap()[0], (String::new(), Some(image())));
        assert_eq!(app.request.response, "A tiny PNG.");
    }

    #[tokio::test]
    async fn test_attach_and_remove() {
        let generator = ScriptedGenerator::new(|| Ok(String::new()));
        let (mut app, _rx) = app_with(generator, false);

        handle_event(&mut app, AppEvent::MediaLoaded(Ok(image())));
        assert!(app.request.attachment.is_some());

        // Upload controls are disabled once something is attached
        handle_event(&mut app, AppEvent::Key(KeyEvent::new(KeyCode::Char('o'), KeyModifiers::CONTROL)));
        assert!(app.file_picker.is_none());

        handle_event(&mut app, AppEvent::Key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL)));
        assert_eq!(app.request.attachment, None);
    }

    #[tokio::test]
    async fn test_missing_key_blocks_input_and_submit() {
        let generator = ScriptedGenerator::new(|| Ok("unused".to_string()));
        let (mut app, _rx) = app_with(generator.clone(), true);
        assert_eq!(app.input_mode, InputMode::Normal);

        handle_event(&mut app, key(KeyCode::Char('e')));
        assert_eq!(app.input_mode, InputMode::Normal);

        app.input_mode = InputMode::Editing;
        type_text(&mut app, "Hello");
        assert!(app.request.prompt.is_empty());
        assert!(!app.submit());

        app.input_mode = InputMode::Normal;
        handle_event(&mut app, key(KeyCode::Char('i')));
        assert!(app.file_picker.is_none());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_shift_enter_inserts_newline() {
        let generator = ScriptedGenerator::new(|| Ok(String::new()));
        let (mut app, _rx) = app_with(generator.clone(), false);

        type_text(&mut app, "line one");
        handle_event(&mut app, AppEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT)));
        type_text(&mut app, "two");

        assert_eq!(app.request.prompt, "line one\ntwo");
        assert_eq!(app.cursor_row_col(), (1, 3));
        assert_eq!(app.prompt_rows(), 2);
        assert_eq!(app.request.phase, Phase::Idle);
    }

    #[tokio::test]
    async fn test_editing_is_utf8_safe() {
        let generator = ScriptedGenerator::new(|| Ok(String::new()));
        let (mut app, _rx) = app_with(generator, false);

        type_text(&mut app, "héllo");
        handle_event(&mut app, key(KeyCode::Left));
        handle_event(&mut app, key(KeyCode::Left));
        handle_event(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.request.prompt, "hélo");

        handle_event(&mut app, key(KeyCode::Home));
        handle_event(&mut app, key(KeyCode::Delete));
        assert_eq!(app.request.prompt, "élo");

        handle_event(&mut app, AppEvent::Paste("a\r\nb".to_string()));
        assert_eq!(app.request.prompt, "a\nbélo");
    }

    #[tokio::test]
    async fn test_media_load_failure_is_reported() {
        let generator = ScriptedGenerator::new(|| Ok(String::new()));
        let (mut app, _rx) = app_with(generator, false);

        handle_event(
            &mut app,
            AppEvent::MediaLoaded(Err(kiosk_core::MediaError::MalformedDataUrl)),
        );
        assert_eq!(
            app.request.error.as_deref(),
            Some("Could not attach file: Not a base64 data URL")
        );
        assert_eq!(app.request.attachment, None);
    }

    #[tokio::test]
    async fn test_missing_key_blocks_submit_with_staged_attachment() {
        let generator = ScriptedGenerator::new(|| Ok("unused".to_string()));
        let (mut app, _rx) = app_with(generator.clone(), true);
        app.request.attachment = Some(image());

        assert!(!app.submit());
        app.input_mode = InputMode::Editing;
        handle_event(&mut app, key(KeyCode::Enter));
        tokio::task::yield_now().await;

        assert_eq!(app.request.phase, Phase::Idle);
        assert_eq!(app.request.attachment, Some(image()));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_panicking_generator_shows_unknown_failure() {
        let generator = ScriptedGenerator::new(|| panic!("generator blew up"));
        let (mut app, mut rx) = app_with(generator, false);

        type_text(&mut app, "Hello");
        handle_event(&mut app, key(KeyCode::Enter));
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, AppEvent::Generated(Err(GenerateError::Aborted))));
        handle_event(&mut app, event);

        assert_eq!(app.request.phase, Phase::Failed);
        assert_eq!(app.request.error.as_deref(), Some(UNKNOWN_FAILURE_MESSAGE));
        assert!(app.request.can_submit());
    }

    #[tokio::test]
    async fn test_huge_paste_keeps_prompt_rows_capped() {
        let generator = ScriptedGenerator::new(|| Ok(String::new()));
        let (mut app, _rx) = app_with(generator, false);

        handle_event(&mut app, AppEvent::Paste("\n".repeat(65_536)));
        assert_eq!(app.request.prompt.split('\n').count(), 65_537);
        assert_eq!(app.prompt_rows(), MAX_PROMPT_ROWS);
    }
}
