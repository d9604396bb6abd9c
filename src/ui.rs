use crate::app::{App, InputMode};
use crate::api::TodoApi;
use crate::buffer::{BufferMode, EditBuffer, Field};
use crate::models::{Status, Todo};
use crate::view::{
    overdue_status, priority_class, progress_class, status_summary, subtask_progress, DueStatus,
    PriorityClass, ProgressClass, StatusFilter,
};
use chrono::NaiveDate;
use crossterm::event::{self, Event as CEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

fn centered_rect_absolute(width: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length((r.height.saturating_sub(height)) / 2),
                Constraint::Length(height),
                Constraint::Length((r.height.saturating_sub(height) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Length((r.width.saturating_sub(width)) / 2),
                Constraint::Length(width),
                Constraint::Length((r.width.saturating_sub(width) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

fn priority_color(class: PriorityClass) -> Color {
    match class {
        PriorityClass::Green => Color::Green,
        PriorityClass::Amber => Color::Yellow,
        PriorityClass::Red => Color::Red,
        PriorityClass::Unknown => Color::Gray,
    }
}

fn progress_color(class: ProgressClass) -> Color {
    match class {
        ProgressClass::Overdue => Color::Red,
        ProgressClass::Strong => Color::Blue,
        ProgressClass::Medium => Color::Cyan,
        ProgressClass::Light => Color::LightCyan,
    }
}

fn key_hint(key: &'static str, action: &'static str) -> [Span<'static>; 2] {
    [
        Span::styled(key, Style::default().fg(Color::Red)),
        Span::raw(action),
    ]
}

fn get_legend(input_mode: &InputMode) -> Text<'static> {
    let hints: Vec<[Span<'static>; 2]> = match input_mode {
        InputMode::Normal => vec![
            key_hint(" q ", ": Quit "),
            key_hint(" j/k ", ": Move "),
            key_hint(" f ", ": Filter "),
            key_hint(" a ", ": Add "),
            key_hint(" e ", ": Edit "),
            key_hint(" x ", ": Toggle Done "),
            key_hint(" d ", ": Delete "),
            key_hint(" r ", ": Refresh "),
            key_hint(" Enter ", ": Details "),
            key_hint(" Esc ", ": Close/Dismiss "),
        ],
        InputMode::Editing => vec![
            key_hint(" i ", ": Type "),
            key_hint(" Tab ", ": Next Field "),
            key_hint(" p ", ": Priority "),
            key_hint(" s ", ": Status "),
            key_hint(" +/- ", ": Due Date "),
            key_hint(" n ", ": Add Subtask "),
            key_hint(" Space ", ": Check Subtask "),
            key_hint(" D ", ": Remove Subtask "),
            key_hint(" Enter ", ": Save "),
            key_hint(" Esc ", ": Cancel "),
        ],
        InputMode::Insert => vec![
            key_hint(" Tab ", ": Next Field "),
            key_hint(" Esc ", ": Stop Typing "),
        ],
        InputMode::ConfirmDelete(_) => vec![
            key_hint(" y ", ": Delete "),
            key_hint(" n ", ": Cancel "),
        ],
    };
    Text::from(Line::from(hints.into_iter().flatten().collect::<Vec<_>>()))
}

fn text_bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn todo_item(todo: &Todo, today: NaiveDate) -> ListItem<'static> {
    let marker = match todo.status {
        Status::Completed => Span::styled("[x] ", Style::default().fg(Color::Green)),
        Status::InProgress => Span::styled("[~] ", Style::default().fg(Color::Yellow)),
        Status::Todo => Span::raw("[ ] "),
    };

    let title_style = if todo.completed {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default()
    };

    let priority_label = todo
        .priority
        .map(|p| p.to_string())
        .unwrap_or_else(|| "?".to_string());
    // A finished item past its date gets no badge
    let due = match (overdue_status(todo.due_date, today), todo.completed) {
        (DueStatus::Overdue, false) => {
            Span::styled(" OVERDUE ", Style::default().fg(Color::White).bg(Color::Red))
        }
        (DueStatus::Overdue, true) => Span::raw(""),
        (DueStatus::Upcoming, _) => {
            Span::styled(" upcoming ", Style::default().fg(Color::DarkGray))
        }
    };

    let mut lines = vec![Line::from(vec![
        marker,
        Span::styled(
            format!(" {} ", priority_label),
            Style::default()
                .fg(Color::Black)
                .bg(priority_color(priority_class(todo.priority))),
        ),
        Span::raw(" "),
        Span::styled(todo.title.clone(), title_style),
        Span::styled(
            format!("  {}", todo.due_date.format("%d %b, %Y")),
            Style::default().fg(Color::Gray),
        ),
        due,
    ])];

    let progress = subtask_progress(todo);
    if progress.is_visible() {
        let color = progress_color(progress_class(&progress, todo.due_date, today));
        lines.push(Line::from(vec![
            Span::raw("    "),
            Span::styled(text_bar(progress.ratio, 20), Style::default().fg(color)),
            Span::raw(format!(" {}/{}", progress.completed, progress.total)),
        ]));
    }

    ListItem::new(Text::from(lines))
}

fn draw_sidebar<A: TodoApi>(f: &mut Frame, app: &App<A>, area: Rect) {
    let summary = status_summary(app.store.todos());
    let lines: Vec<Line> = StatusFilter::ALL
        .iter()
        .enumerate()
        .map(|(i, filter)| {
            let text = format!(" {} {} ({})", i + 1, filter.label(), summary.count(*filter));
            if *filter == app.filter {
                Line::from(Span::styled(
                    text,
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(Span::raw(text))
            }
        })
        .collect();

    let sidebar = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Filter"));
    f.render_widget(sidebar, area);
}

fn draw_detail(f: &mut Frame, todo: &Todo, today: NaiveDate, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Task Details");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let progress = subtask_progress(todo);
    let gauge_height = if progress.is_visible() { 2 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(gauge_height)].as_ref())
        .split(inner);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut lines: Vec<Line<'static>> = vec![
        Line::from(Span::styled(todo.title.clone(), bold)),
        Line::from(vec![
            Span::styled("Priority: ", bold),
            Span::styled(
                todo.priority
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "Unknown".to_string()),
                Style::default().fg(priority_color(priority_class(todo.priority))),
            ),
        ]),
        Line::from(vec![Span::styled("Status: ", bold), Span::raw(todo.status.to_string())]),
        Line::from(vec![
            Span::styled("Due: ", bold),
            Span::raw(todo.due_date.format("%Y-%m-%d").to_string()),
            match overdue_status(todo.due_date, today) {
                DueStatus::Overdue => Span::styled(" (overdue)", Style::default().fg(Color::Red)),
                DueStatus::Upcoming => Span::raw(""),
            },
        ]),
        Line::from(Span::styled("Description: ", bold)),
    ];

    if todo.description.trim().is_empty() {
        lines.push(Line::from("No description"));
    } else {
        for line in todo.description.lines() {
            lines.push(Line::from(line.to_string()));
        }
    }

    if !todo.subtasks.is_empty() {
        lines.push(Line::from(Span::styled("Subtasks:", bold)));
        for subtask in &todo.subtasks {
            let (check, style) = if subtask.completed {
                ("[x] ", Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT))
            } else {
                ("[ ] ", Style::default())
            };
            lines.push(Line::from(vec![
                Span::raw(check),
                Span::styled(subtask.title.clone(), style),
            ]));
        }
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), chunks[0]);

    if progress.is_visible() {
        let color = progress_color(progress_class(&progress, todo.due_date, today));
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(color))
            .ratio(progress.ratio)
            .label(format!("{}/{} subtasks", progress.completed, progress.total));
        f.render_widget(gauge, chunks[1]);
    }
}

fn field_label(buffer: &EditBuffer, field: Field, label: &'static str) -> Span<'static> {
    if buffer.focus == field {
        Span::styled(
            label,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(label, Style::default().add_modifier(Modifier::BOLD))
    }
}

fn draw_editor<A: TodoApi>(f: &mut Frame, app: &App<A>, buffer: &EditBuffer, area: Rect) {
    let typing = app.input_mode == InputMode::Insert;
    let cursor = |field: Field| if typing && buffer.focus == field { "_" } else { "" };

    let mut lines: Vec<Line<'static>> = vec![
        Line::from(vec![
            field_label(buffer, Field::Title, "Title: "),
            Span::raw(format!("{}{}", buffer.title, cursor(Field::Title))),
        ]),
        Line::from(vec![
            field_label(buffer, Field::Description, "Description: "),
            Span::raw(format!("{}{}", buffer.description, cursor(Field::Description))),
        ]),
        Line::from(vec![
            field_label(buffer, Field::Priority, "Priority: "),
            Span::styled(
                buffer.priority.to_string(),
                Style::default().fg(priority_color(priority_class(Some(buffer.priority)))),
            ),
        ]),
        Line::from(vec![
            field_label(buffer, Field::DueDate, "Due Date: "),
            Span::raw(buffer.due_date.format("%Y-%m-%d").to_string()),
        ]),
        Line::from(vec![
            field_label(buffer, Field::Status, "Status: "),
            Span::raw(buffer.status.to_string()),
        ]),
        Line::from(Span::styled(
            "Subtasks:",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];

    for (i, subtask) in buffer.subtasks.iter().enumerate() {
        let field = Field::Subtask(i);
        let check = if subtask.completed { "[x] " } else { "[ ] " };
        lines.push(Line::from(vec![
            field_label(buffer, field, "  - "),
            Span::raw(check),
            Span::raw(format!("{}{}", subtask.title, cursor(field))),
        ]));
    }

    if let Some(err) = &app.form_error {
        lines.push(Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(Color::Red),
        )));
    }

    let title = match buffer.mode() {
        BufferMode::Create => "New Task (Enter to Save)",
        BufferMode::Edit(_) => "Edit Task (Enter to Save)",
    };

    let width = (area.width * 60 / 100).max(30).min(area.width);
    let height = (lines.len() as u16 + 2).min(area.height);
    let popup_area = centered_rect_absolute(width, height, area);

    let popup = Paragraph::new(lines)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Green)),
        )
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(popup, popup_area);
}

fn draw_confirm(f: &mut Frame, title: &str, area: Rect) {
    let popup_area = centered_rect_absolute(50.min(area.width), 5.min(area.height), area);
    let text = vec![
        Line::from(format!("Delete \"{}\"?", title)),
        Line::from("This action cannot be undone. (y/n)"),
    ];
    let popup = Paragraph::new(text)
        .block(
            Block::default()
                .title("Confirm Deletion")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Red)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    f.render_widget(Clear, popup_area);
    f.render_widget(popup, popup_area);
}

pub fn draw<A: TodoApi>(f: &mut Frame, app: &mut App<A>) {
    let size = f.area();
    let banner_height = if app.store.error().is_some() { 1 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints(
            [
                Constraint::Length(banner_height),
                Constraint::Min(0),
                Constraint::Length(2),
            ]
            .as_ref(),
        )
        .split(size);

    let banner_chunk = chunks[0];
    let body_chunk = chunks[1];
    let footer_chunk = chunks[2];

    if let Some(err) = app.store.error() {
        let banner = Paragraph::new(format!(" {} (Esc to dismiss)", err))
            .style(Style::default().fg(Color::White).bg(Color::Red));
        f.render_widget(banner, banner_chunk);
    }

    let detail_open = app.detail().is_some();
    let columns = if detail_open {
        vec![
            Constraint::Length(22),
            Constraint::Percentage(55),
            Constraint::Min(0),
        ]
    } else {
        vec![Constraint::Length(22), Constraint::Min(0)]
    };
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(columns)
        .split(body_chunk);

    draw_sidebar(f, app, body[0]);

    let list_title = format!("My Todos ({})", app.filter.label());
    let items: Vec<ListItem<'static>> = app
        .visible()
        .into_iter()
        .map(|todo| todo_item(todo, app.today))
        .collect();

    let tasks_widget = if items.is_empty() {
        List::new(vec![ListItem::new("No tasks available")])
            .block(Block::default().borders(Borders::ALL).title(list_title))
    } else {
        List::new(items)
            .block(Block::default().borders(Borders::ALL).title(list_title))
            .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
            .highlight_symbol(">> ")
    };
    f.render_stateful_widget(tasks_widget, body[1], &mut app.state);

    if let Some(todo) = app.detail() {
        draw_detail(f, todo, app.today, body[2]);
    }

    if let Some(buffer) = &app.buffer {
        draw_editor(f, app, buffer, body_chunk);
    }

    if let InputMode::ConfirmDelete(id) = &app.input_mode {
        let title = app
            .store
            .get(id)
            .map(|t| t.title.as_str())
            .unwrap_or("this task");
        draw_confirm(f, title, body_chunk);
    }

    let legend = Paragraph::new(get_legend(&app.input_mode))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    f.render_widget(legend, footer_chunk);
}

pub async fn run_app<B: Backend, A: TodoApi>(
    terminal: &mut Terminal<B>,
    mut app: App<A>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, &mut app))?;

        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_input(key).await {
                    return Ok(());
                }
            }
        }
    }
}
