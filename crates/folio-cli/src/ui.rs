use folio_engine::editing::{BlockKind, UploadStatus};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

use crate::app::{App, Mode};

const PREVIEW_CHARS: usize = 48;

fn icon(kind: BlockKind) -> &'static str {
    match kind {
        BlockKind::Paragraph => "¶ ",
        BlockKind::Heading => "H ",
        BlockKind::Image => "▣ ",
        BlockKind::Quote => "❝ ",
        BlockKind::Divider => "──",
    }
}

fn preview(payload: &str) -> String {
    let first_line = payload.lines().next().unwrap_or_default();
    let mut text: String = first_line.chars().take(PREVIEW_CHARS).collect();
    if first_line.chars().count() > PREVIEW_CHARS {
        text.push('…');
    }
    text
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    let dirty = if app.is_dirty() { " [modified]" } else { "" };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            app.post.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  /{}  {}{dirty}", app.post.slug, app.post.date)),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Post"));
    f.render_widget(header, rows[0]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[1]);

    let block_items: Vec<ListItem> = app
        .session
        .document()
        .blocks()
        .iter()
        .map(|block| {
            let detail = match (block.kind, app.session.upload_status(block.id)) {
                (_, Some(UploadStatus::Uploading)) => {
                    Span::styled("uploading…", Style::default().fg(Color::Cyan))
                }
                (_, Some(UploadStatus::Failed(message))) => Span::styled(
                    format!("upload failed: {message}"),
                    Style::default().fg(Color::Red),
                ),
                (BlockKind::Image, None) if block.is_pending() => {
                    Span::styled("no image yet", Style::default().fg(Color::DarkGray))
                }
                (BlockKind::Divider, None) => Span::raw(""),
                _ => Span::raw(preview(&block.payload)),
            };
            ListItem::new(Line::from(vec![Span::raw(icon(block.kind)), Span::raw(" "), detail]))
        })
        .collect();

    let blocks_list = List::new(block_items)
        .block(Block::default().borders(Borders::ALL).title("Blocks"))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));
    f.render_stateful_widget(blocks_list, panes[0], &mut app.block_list_state);

    let html = Paragraph::new(app.session.html().to_string())
        .block(Block::default().borders(Borders::ALL).title("HTML"))
        .wrap(Wrap { trim: false });
    f.render_widget(html, panes[1]);

    let footer = match app.mode.prompt() {
        Some((label, buffer)) => Paragraph::new(Line::from(vec![
            Span::styled(format!("{label}: "), Style::default().fg(Color::Yellow)),
            Span::raw(buffer.to_string()),
            Span::raw("▏"),
        ]))
        .block(Block::default().borders(Borders::ALL).title(
            if app.mode == Mode::ConfirmDelete {
                "y: Delete | any other key: Cancel"
            } else {
                "Enter: Confirm | Esc: Cancel"
            },
        )),
        None => Paragraph::new(Line::from(app.status.clone())).block(
            Block::default().borders(Borders::ALL).title(
                "1-5: Add ¶/H/▣/❝/── | e: Edit | u: Upload | x: Remove | J/K: Move | t: Title | n: Slug | d: Date | E: Excerpt | c: Cover | s: Save | D: Delete | q: Quit",
            ),
        ),
    };
    f.render_widget(footer, rows[2]);
}
