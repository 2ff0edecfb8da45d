//! Console layout and widgets.
//!
//! ```text
//! ┌ backstage ────────────────────────────────────────┐
//! │ 仪表盘 │ 文章列表 │ 新增文章管理                  │
//! └───────────────────────────────────────────────────┘
//!  内容管理 / 文章管理 / 文章列表
//! ┌ Menu ──────┐┌ 文章列表 ───────────────────────────┐
//! │ 仪表盘     ││ ID  标题        作者   创建时间      │
//! │ 内容管理   ││ ...                                 │
//! └────────────┘└─────────────────────────────────────┘
//!  ✔ 删除成功 | Tab: switch tab | w: close | ...
//! ```

use super::app::{ConsoleApp, DetailView, Focus, Input, InputTarget, ListView, View};
use crate::api::value_text;
use crate::notice::NoticeLevel;
use crate::pages::FieldKind;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 24;

pub fn render(frame: &mut Frame, app: &ConsoleApp) {
    let maximized = app.shell().state().tabs.is_maximize;
    let mut constraints = vec![Constraint::Length(3)];
    if !maximized {
        constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Min(0));
    constraints.push(Constraint::Length(1));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.area());

    render_tabs(frame, app, chunks[0]);
    let body = if maximized {
        chunks[1]
    } else {
        render_breadcrumb(frame, app, chunks[1]);
        chunks[2]
    };
    render_body(frame, app, body);
    render_footer(frame, app, chunks[chunks.len() - 1]);
}

fn render_tabs(frame: &mut Frame, app: &ConsoleApp, area: Rect) {
    let shell = app.shell();
    let titles: Vec<Line> = shell.tabs().iter().map(|t| Line::from(t.label.clone())).collect();
    let selected = shell.state().tabs.position(shell.active_key());

    let mut title = String::from(" backstage ");
    if shell.is_refreshing() {
        title.push_str("⟳ ");
    }
    if shell.state().tabs.is_maximize {
        title.push_str("[max] ");
    }

    let mut tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    if let Some(index) = selected {
        tabs = tabs.select(index);
    }
    frame.render_widget(tabs, area);
}

fn render_breadcrumb(frame: &mut Frame, app: &ConsoleApp, area: Rect) {
    let nav = &app.shell().state().tabs.nav;
    let mut spans = vec![Span::raw(" ")];
    for (i, label) in nav.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" / ", Style::default().fg(Color::DarkGray)));
        }
        let style = if i + 1 == nav.len() {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(label.clone(), style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_body(frame: &mut Frame, app: &ConsoleApp, area: Rect) {
    if !app.sidebar_visible() {
        render_content(frame, app, area);
        return;
    }
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
        .split(area);
    render_sidebar(frame, app, chunks[0]);
    render_content(frame, app, chunks[1]);
}

fn render_sidebar(frame: &mut Frame, app: &ConsoleApp, area: Rect) {
    let menu = &app.shell().state().menu;
    let focused = app.focus() == Focus::Sidebar;
    let items: Vec<ListItem> = app
        .sidebar_entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let indent = "  ".repeat(entry.depth);
            let marker = if entry.is_group {
                if menu.open_keys.iter().any(|k| k == entry.key) {
                    "▾ "
                } else {
                    "▸ "
                }
            } else {
                "  "
            };
            let mut style = if entry.key == menu.selected_key {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else if entry.is_group {
                Style::default().fg(Color::Gray)
            } else {
                Style::default().fg(Color::White)
            };
            if focused && i == app.sidebar_index() {
                style = style.add_modifier(Modifier::REVERSED);
            }
            ListItem::new(Line::from(Span::styled(
                format!("{}{}{}", indent, marker, entry.label),
                style,
            )))
        })
        .collect();

    let border = if focused { Color::Cyan } else { Color::DarkGray };
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Menu "),
    );
    frame.render_widget(list, area);
}

fn render_content(frame: &mut Frame, app: &ConsoleApp, area: Rect) {
    if app.is_loading_route() {
        render_message(frame, area, " Loading ", "Loading…", Color::Yellow);
        return;
    }
    match app.active_view() {
        Some(View::Dashboard) => render_dashboard(frame, app, area),
        Some(View::List(view)) => render_list(frame, app, view, area),
        Some(View::Detail(view)) => render_detail(frame, app, view, area),
        Some(View::NotFound) => {
            let text = format!("404: no page for {}", app.shell().active_key());
            render_message(frame, area, " Not found ", &text, Color::Red);
        }
        None => render_message(
            frame,
            area,
            " backstage ",
            "No permissions loaded. Set `permissions` with `backstage config set`.",
            Color::DarkGray,
        ),
    }
}

fn render_message(frame: &mut Frame, area: Rect, title: &str, text: &str, color: Color) {
    let paragraph = Paragraph::new(text.to_string())
        .style(Style::default().fg(color))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    frame.render_widget(paragraph, area);
}

fn render_dashboard(frame: &mut Frame, app: &ConsoleApp, area: Rect) {
    let shell = app.shell();
    let label = Style::default().fg(Color::Blue);
    let lines = vec![
        Line::from(vec![
            Span::styled("API: ", label),
            Span::raw(app.api_base().to_string()),
        ]),
        Line::from(vec![
            Span::styled("Permissions: ", label),
            Span::raw(shell.permissions().sorted().join(", ")),
        ]),
        Line::from(vec![
            Span::styled("Open tabs: ", label),
            Span::raw(shell.tabs().len().to_string()),
        ]),
    ];
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Dashboard "));
    frame.render_widget(paragraph, area);
}

fn render_list(frame: &mut Frame, app: &ConsoleApp, view: &ListView, area: Rect) {
    let page = &view.page;
    let def = page.def();
    if !page.permission().page {
        render_message(frame, area, def.title, "No permission to view this page.", Color::Red);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    let filter = match app.input() {
        Some(Input {
            target: InputTarget::Filter(index),
            buffer,
            ..
        }) => {
            let label = def.search_fields.get(*index).map_or("", |f| f.label);
            format!(" Search {}: {}▏", label, buffer)
        }
        _ => {
            let active: Vec<String> = page
                .filters()
                .iter()
                .map(|(k, v)| format!("{}={}", k, value_text(v)))
                .collect();
            if active.is_empty() {
                " /: search".to_string()
            } else {
                format!(" Filter: {}", active.join(" "))
            }
        }
    };
    frame.render_widget(
        Paragraph::new(filter).style(Style::default().fg(Color::Gray)),
        chunks[0],
    );

    let header = Row::new(def.columns.iter().map(|c| Cell::from(c.title)))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = page
        .rows()
        .iter()
        .map(|row| {
            Row::new(
                def.columns
                    .iter()
                    .map(|c| Cell::from(row.get(c.data_index).map(value_text).unwrap_or_default())),
            )
        })
        .collect();
    let widths: Vec<Constraint> = def.columns.iter().map(|c| Constraint::Length(c.width)).collect();

    let mut title = format!(
        " {} · page {}/{} · {} total ",
        def.title,
        page.page(),
        page.page_count(),
        page.total()
    );
    if page.is_loading() {
        title.push_str("· loading… ");
    }

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = TableState::default();
    if !page.rows().is_empty() {
        state.select(Some(view.selected));
    }
    frame.render_stateful_widget(table, chunks[1], &mut state);
}

fn render_detail(frame: &mut Frame, app: &ConsoleApp, view: &DetailView, area: Rect) {
    let page = &view.page;
    let title = format!(" {} ", page.tab().label);
    if !page.is_allowed() {
        render_message(frame, area, &title, "No permission to edit this record.", Color::Red);
        return;
    }

    let editing = app.input().and_then(|input| match input.target {
        InputTarget::Field(name) => Some((name, input.buffer.as_str())),
        InputTarget::Filter(_) => None,
    });
    let label_width = page
        .def()
        .form_fields
        .iter()
        .map(|f| f.label.chars().count() * 2)
        .max()
        .unwrap_or(0);

    let items: Vec<ListItem> = page
        .def()
        .form_fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let marker = if field.required { "*" } else { " " };
            let value = match editing {
                Some((name, buffer)) if name == field.name => format!("{}▏", buffer),
                _ => display_value(field.kind, &view.field_text(field.name)),
            };
            let pad = label_width.saturating_sub(field.label.chars().count() * 2);
            let mut style = Style::default();
            if i == view.field {
                style = style.add_modifier(Modifier::REVERSED);
            }
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Red)),
                Span::styled(
                    format!("{}{}  ", field.label, " ".repeat(pad)),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(value, style),
            ]))
        })
        .collect();

    let mut block_title = title;
    if page.is_loading() {
        block_title.push_str("· loading… ");
    }
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(block_title));
    frame.render_widget(list, area);
}

/// Multi-line fields are shown on one line.
fn display_value(kind: FieldKind, text: &str) -> String {
    match kind {
        FieldKind::Input => text.to_string(),
        FieldKind::TextArea | FieldKind::Editor => {
            text.lines().map(str::trim).collect::<Vec<_>>().join(" ⏎ ")
        }
    }
}

fn help_text(app: &ConsoleApp) -> String {
    if let Some(input) = app.input() {
        return match input.target {
            InputTarget::Filter(_) => "Enter: search | Tab: next field | Esc: cancel",
            InputTarget::Field(_) => "Enter: apply | Esc: cancel",
        }
        .to_string();
    }
    if app.focus() == Focus::Sidebar {
        return "↑↓: move | Enter: open | Esc: back".to_string();
    }
    match app.active_view() {
        Some(View::List(view)) => {
            let flags = view.page.permission();
            let mut keys = vec!["↑↓: row"];
            if flags.create {
                keys.push("n: new");
            }
            if flags.update {
                keys.push("e: edit");
            }
            if flags.delete {
                keys.push("d: delete");
            }
            if flags.page {
                keys.extend(["[ ]: page", "/: search"]);
            }
            keys.extend(["r: refresh", "w: close", "q: quit"]);
            keys.join(" | ")
        }
        Some(View::Detail(_)) => {
            "↑↓: field | Enter: edit | Ctrl-S: save | Ctrl-R: reset | Esc: back | q: quit"
                .to_string()
        }
        _ => "Tab: switch tab | s: menu | w/o/</>/X: close | r: refresh | m: maximize | b: sidebar | q: quit"
            .to_string(),
    }
}

fn render_footer(frame: &mut Frame, app: &ConsoleApp, area: Rect) {
    let mut spans = Vec::new();
    if let Some(notice) = app.shell().notices().latest() {
        let (icon, color) = match notice.level {
            NoticeLevel::Success => ("✔", Color::Green),
            NoticeLevel::Info => ("ℹ", Color::Cyan),
            NoticeLevel::Warning => ("!", Color::Yellow),
            NoticeLevel::Error => ("✘", Color::Red),
        };
        spans.push(Span::styled(
            format!(" {} {} ", icon, notice.content),
            Style::default().fg(color),
        ));
        spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
    }
    spans.push(Span::styled(
        format!(" {} ", help_text(app)),
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
