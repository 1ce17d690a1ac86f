use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use kiosk_core::config::MISSING_KEY_BANNER;

use crate::app::{App, InputMode};

const PROMPT_PLACEHOLDER: &str = "Enter a prompt or upload an image/video...";
const MISSING_KEY_PLACEHOLDER: &str = "API Key not configured";
const RESPONSE_PLACEHOLDER: &str = "The AI's response will appear here.";

/// Style the inline markdown the model tends to emit: `**bold**`,
/// `*italic*` and `` `code` ``. Unclosed markers are kept as literal text.
fn parse_inline_markdown(text: &str, base: Style) -> Vec<Span<'static>> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        let (marker, style) = match c {
            '*' if rest.starts_with("**") => ("**", base.add_modifier(Modifier::BOLD)),
            '*' => ("*", base.add_modifier(Modifier::ITALIC)),
            '`' => ("`", base.fg(Color::LightGreen)),
            _ => {
                plain.push(c);
                rest = &rest[c.len_utf8()..];
                continue;
            }
        };

        let after = &rest[marker.len()..];
        match after.find(marker) {
            Some(end) if end > 0 => {
                if !plain.is_empty() {
                    spans.push(Span::styled(std::mem::take(&mut plain), base));
                }
                spans.push(Span::styled(after[..end].to_string(), style));
                rest = &after[end + marker.len()..];
            }
            _ => {
                plain.push_str(marker);
                rest = after;
            }
        }
    }

    if !plain.is_empty() {
        spans.push(Span::styled(plain, base));
    }
    spans
}

/// One response line: headings and bullets get their own treatment, the
/// rest goes through inline parsing.
fn parse_markdown_line(line: &str) -> Line<'static> {
    let trimmed = line.trim_start();

    if let Some(heading) = trimmed.strip_prefix('#') {
        let heading = heading.trim_start_matches('#').trim();
        let style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
        return Line::from(parse_inline_markdown(heading, style));
    }

    let indent = &line[..line.len() - trimmed.len()];
    let bullet = trimmed
        .strip_prefix("* ")
        .or_else(|| trimmed.strip_prefix("- "));
    if let Some(item) = bullet {
        let mut spans = vec![Span::raw(format!("{}• ", indent))];
        spans.extend(parse_inline_markdown(item, Style::default()));
        return Line::from(spans);
    }

    let spans = parse_inline_markdown(line, Style::default());
    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let bytes = bytes as f64;
    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < KB * KB {
        format!("{:.1} KB", bytes / KB)
    } else {
        format!("{:.1} MB", bytes / (KB * KB))
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let banner_height = if app.request.api_key_missing() { 3 } else { 0 };
    let attachment_height = if app.request.attachment.is_some() || app.media_loading { 1 } else { 0 };

    let [header_area, banner_area, response_area, attachment_area, input_area, footer_area] =
        Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(banner_height),
            Constraint::Min(3),
            Constraint::Length(attachment_height),
            Constraint::Length(app.prompt_rows() + 2),
            Constraint::Length(1),
        ])
        .areas(area);

    render_header(frame, header_area);
    if banner_height > 0 {
        render_config_banner(frame, banner_area);
    }
    render_response(app, frame, response_area);
    if attachment_height > 0 {
        render_attachment(app, frame, attachment_area);
    }
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.file_picker.is_some() {
        render_file_picker(app, frame, area);
    }
}

fn render_header(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            "Gemini Prompt Kiosk",
            Style::default().fg(Color::Magenta).bold(),
        )),
        Line::from(Span::styled(
            "Your direct interface to Google's Gemini AI",
            Style::default().fg(Color::Gray),
        )),
    ];
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn render_config_banner(frame: &mut Frame, area: Rect) {
    let banner = Paragraph::new(Line::from(vec![
        Span::styled("Configuration Error:", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" "),
        Span::raw(MISSING_KEY_BANNER),
    ]))
    .style(Style::default().fg(Color::LightRed))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    );
    frame.render_widget(banner, area);
}

fn render_response(app: &mut App, frame: &mut Frame, area: Rect) {
    app.response_area = Some(area);
    app.response_height = area.height.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Gemini: {} ", app.model));

    if app.request.is_loading() {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        let inner_height = area.height.saturating_sub(2) as usize;
        let mut lines = vec![Line::default(); inner_height.saturating_sub(1) / 2];
        lines.push(Line::from(Span::styled(
            format!("Thinking{:<3}", dots),
            Style::default().fg(Color::LightBlue).add_modifier(Modifier::ITALIC),
        )));
        let spinner = Paragraph::new(lines).alignment(Alignment::Center).block(block);
        frame.render_widget(spinner, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();

    if let Some(error) = &app.request.error {
        lines.push(Line::from(Span::styled(
            "An Error Occurred:",
            Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(Color::LightRed))));
        lines.push(Line::default());
    }

    if !app.request.response.is_empty() {
        lines.extend(app.request.response.lines().map(parse_markdown_line));
    }

    if lines.is_empty() {
        if !app.request.api_key_missing() {
            let inner_height = area.height.saturating_sub(2) as usize;
            let mut placeholder = vec![Line::default(); inner_height.saturating_sub(1) / 2];
            placeholder.push(Line::from(Span::styled(
                RESPONSE_PLACEHOLDER,
                Style::default().fg(Color::DarkGray),
            )));
            frame.render_widget(
                Paragraph::new(placeholder).alignment(Alignment::Center).block(block),
                area,
            );
        } else {
            frame.render_widget(block, area);
        }
        return;
    }

    let response = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.response_scroll, 0));
    frame.render_widget(response, area);
}

fn render_attachment(app: &App, frame: &mut Frame, area: Rect) {
    let line = match &app.request.attachment {
        Some(media) => {
            let kind = if media.is_image() {
                "Image"
            } else if media.is_video() {
                "Video"
            } else {
                "File"
            };
            let remove_hint = if app.request.is_loading() {
                String::new()
            } else {
                "  (Ctrl+X or d to remove)".to_string()
            };
            Line::from(vec![
                Span::styled(format!(" [{}] ", kind), Style::default().bg(Color::Magenta).fg(Color::White)),
                Span::raw(format!(" {} · {}", media.mime_type, format_size(media.decoded_len()))),
                Span::styled(remove_hint, Style::default().fg(Color::DarkGray)),
            ])
        }
        None => {
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            Line::from(Span::styled(
                format!(" Loading media{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ))
        }
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let enabled = app.request.input_enabled();
    let editing = enabled && app.input_mode == InputMode::Editing && app.file_picker.is_none();

    let border_color = if editing { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Prompt ");

    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;

    if app.request.prompt.is_empty() {
        let placeholder = if app.request.api_key_missing() {
            MISSING_KEY_PLACEHOLDER
        } else {
            PROMPT_PLACEHOLDER
        };
        let input = Paragraph::new(Span::styled(placeholder, Style::default().fg(Color::DarkGray)))
            .block(block);
        frame.render_widget(input, area);
    } else {
        let text_style = if enabled {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };

        // Keep the cursor visible in both directions
        let (row, col) = app.cursor_row_col();
        let row_offset = row.saturating_sub(inner_height.saturating_sub(1));
        let col_offset = if inner_width == 0 {
            0
        } else {
            col.saturating_sub(inner_width.saturating_sub(1))
        };

        let input = Paragraph::new(app.request.prompt.as_str())
            .style(text_style)
            .block(block)
            .scroll((row_offset as u16, col_offset as u16));
        frame.render_widget(input, area);
    }

    if editing {
        let (row, col) = app.cursor_row_col();
        let row = row.min(inner_height.saturating_sub(1));
        let col = col.min(inner_width.saturating_sub(1));
        frame.set_cursor_position((area.x + 1 + col as u16, area.y + 1 + row as u16));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " PROMPT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let disabled_style = Style::default().bg(Color::Black).fg(Color::DarkGray);

    let uploads = if app.request.uploads_enabled() && !app.media_loading {
        label_style
    } else {
        disabled_style
    };
    let send = if app.request.can_submit() && !app.media_loading {
        label_style
    } else {
        disabled_style
    };

    let mut hints = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", send),
            Span::styled(" Shift+Enter ", key_style),
            Span::styled(" newline ", label_style),
            Span::styled(" Ctrl+O ", key_style),
            Span::styled(" image ", uploads),
            Span::styled(" Ctrl+G ", key_style),
            Span::styled(" video ", uploads),
        ],
        InputMode::Normal => vec![
            Span::styled(" e ", key_style),
            Span::styled(" edit ", if app.request.input_enabled() { label_style } else { disabled_style }),
            Span::styled(" i ", key_style),
            Span::styled(" image ", uploads),
            Span::styled(" v ", key_style),
            Span::styled(" video ", uploads),
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
        ],
    };

    if app.request.attachment.is_some() && !app.request.is_loading() {
        let key = if app.input_mode == InputMode::Editing { " Ctrl+X " } else { " d " };
        hints.extend(vec![
            Span::styled(key, key_style),
            Span::styled(" remove ", label_style),
        ]);
    }

    hints.extend(match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
        ],
        InputMode::Normal => vec![
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
    });

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_file_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let Some(picker) = app.file_picker.as_mut() else {
        return;
    };

    // Calculate popup size and position (centered)
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = (picker.entries.len() as u16 + 2)
        .max(4)
        .min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(
            " {} ({}) {} ",
            picker.kind.display_name(),
            picker.kind.accept(),
            picker.dir.display()
        ));

    if picker.entries.is_empty() {
        let empty = Paragraph::new(Span::styled(
            format!(" No {} files here", picker.kind.display_name().to_lowercase()),
            Style::default().fg(Color::DarkGray),
        ))
        .block(block);
        frame.render_widget(empty, popup_area);
        return;
    }

    let items: Vec<ListItem> = picker
        .entries
        .iter()
        .map(|entry| {
            if entry.is_dir {
                ListItem::new(format!(" {}/ ", entry.name)).style(Style::default().fg(Color::Blue))
            } else {
                ListItem::new(format!(" {} ", entry.name))
            }
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut picker.state);
}
