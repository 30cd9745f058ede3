use super::app_logic::TuiApp;
use super::app_state::AppMode;
use crate::selection::TriState;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

fn checkbox(state: TriState) -> &'static str {
    match state {
        TriState::Unchecked => "[ ]",
        TriState::Indeterminate => "[-]",
        TriState::Checked => "[x]",
    }
}

fn draw_help_block(f: &mut Frame, area: Rect) {
    let help_text_lines_content = vec![
        Line::from("Arrows/jk: Nav | Space/Enter: Sel | Tab/o: Fold | *: Expand All | -: Collapse All"),
        Line::from("a: Sel All Vis | d: Desel All Vis | /: Filter | e: Extensions | q/Esc: Quit"),
        Line::from("y: Copy to clipboard | w: Save text file | z: Download zip"),
    ];
    let help_paragraph = Paragraph::new(help_text_lines_content).block(
        Block::default()
            .borders(Borders::ALL)
            .title("ghyank Interactive Selection"),
    );
    f.render_widget(help_paragraph, area);
}

fn draw_filter_input_block<M>(f: &mut Frame, app: &TuiApp<M>, area: Rect) {
    let input_text = format!("/{}", app.filter_input);
    let filter_paragraph = Paragraph::new(input_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Filter (Esc to cancel, Enter to apply)"),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(filter_paragraph, area);
    f.set_cursor_position((area.x + 1 + app.filter_cursor_pos as u16 + 1, area.y + 1));
}

fn draw_main_list_block<M>(f: &mut Frame, app: &mut TuiApp<M>, area: Rect) {
    app.list_viewport_height = area.height.saturating_sub(2) as usize;
    let rows = app.visible_rows();
    app.clamp_scroll(&rows);

    let end = (app.scroll_offset + app.list_viewport_height).min(rows.len());
    let list_items: Vec<ListItem> = rows
        .get(app.scroll_offset..end)
        .unwrap_or(&[])
        .iter()
        .map(|row| {
            let expansion_prefix = if row.is_dir {
                if row.expanded { "[-] " } else { "[+] " }
            } else {
                "    "
            };
            ListItem::new(format!(
                "{}{} {}",
                expansion_prefix,
                checkbox(row.state),
                row.label
            ))
        })
        .collect();

    let list_title = if !app.filter_input.is_empty() && app.mode != AppMode::Filtering {
        format!("Files (Filter: '{}')", app.filter_input)
    } else {
        "Select files/directories".to_string()
    };

    let list_widget = List::new(list_items)
        .block(Block::default().borders(Borders::ALL).title(list_title))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("❯ ");

    let mut list_state = ListState::default();
    if app.mode != AppMode::Extensions {
        if let Some(pos) = app.cursor_position(&rows) {
            if pos >= app.scroll_offset && pos < end {
                list_state.select(Some(pos - app.scroll_offset));
            }
        }
    }
    f.render_stateful_widget(list_widget, area, &mut list_state);
}

fn draw_extension_bar<M>(f: &mut Frame, app: &TuiApp<M>, area: Rect) {
    let groups = app.model.extensions().groups();
    let mut spans = Vec::with_capacity(app.ext_order.len() * 2);
    for (pos, &group) in app.ext_order.iter().enumerate() {
        let entry = &groups[group];
        let name = if entry.extension.is_empty() {
            "(none)"
        } else {
            entry.extension.as_str()
        };
        let text = format!(
            "{} {} ({})",
            checkbox(app.model.group_state(group)),
            name,
            entry.members.len()
        );
        let style = if app.mode == AppMode::Extensions && pos == app.ext_cursor {
            Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        spans.push(Span::styled(text, style));
        spans.push(Span::raw("  "));
    }

    let title = if app.mode == AppMode::Extensions {
        "Extensions (h/l: Move, Space: Toggle, e/Esc: Back)"
    } else {
        "Extensions (e to focus)"
    };
    let bar = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: true });
    f.render_widget(bar, area);
}

fn draw_status_line<M>(f: &mut Frame, app: &TuiApp<M>, area: Rect) {
    let count = app.model.selected_count();
    let noun = if count == 1 { "file" } else { "files" };
    let mut text = format!(" {count} {noun} selected");
    if let Some(id) = app.cursor {
        text.push_str(" | ");
        text.push_str(&app.model.tree().path_of(id));
    }
    let status = Paragraph::new(text)
        .style(Style::default().add_modifier(Modifier::DIM));
    f.render_widget(status, area);
}

pub(super) fn ui_frame<M>(frame: &mut Frame, app: &mut TuiApp<M>) {
    let help_lines = 3;
    let filter_input_height = if app.mode == AppMode::Filtering { 3 } else { 0 };

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(help_lines + 2),
            Constraint::Length(filter_input_height),
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_help_block(frame, main_chunks[0]);
    if app.mode == AppMode::Filtering {
        draw_filter_input_block(frame, app, main_chunks[1]);
    }
    draw_main_list_block(frame, app, main_chunks[2]);
    draw_extension_bar(frame, app, main_chunks[3]);
    draw_status_line(frame, app, main_chunks[4]);
}
