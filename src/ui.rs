use std::io;
use std::time::Duration;

use crossterm::event::{self, Event as CEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::app::{ActiveInput, App, InputMode};
use mindsync::grouping::Bucket;
use mindsync::models::{Priority, Task};
use mindsync::parser::format_datetime_input;

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

fn bucket_color(bucket: Bucket) -> Color {
    match bucket {
        Bucket::Overdue => Color::Red,
        Bucket::Today => Color::Yellow,
        Bucket::Upcoming => Color::Cyan,
        Bucket::Completed => Color::Green,
    }
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::Green,
        Priority::Medium => Color::Yellow,
        Priority::High => Color::Red,
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
            key_hint(" a ", ": Add "),
            key_hint(" e ", ": Edit "),
            key_hint(" Space ", ": Toggle Done "),
            key_hint(" d ", ": Delete "),
            key_hint(" r ", ": Reload "),
        ],
        InputMode::Editing => vec![
            key_hint(" Tab ", ": Next Field "),
            key_hint(" i ", ": Insert / Cycle Priority "),
            key_hint(" l/f ", ": Attach Link/File "),
            key_hint(" x ", ": Drop Last Attachment "),
            key_hint(" Enter ", ": Save "),
            key_hint(" Esc ", ": Cancel "),
        ],
        InputMode::Insert => vec![
            key_hint(" Tab ", ": Next Field "),
            key_hint(" Esc ", ": Done Typing "),
        ],
    };
    Text::from(Line::from(hints.into_iter().flatten().collect::<Vec<_>>()))
}

fn label_line(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(label, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(value),
    ])
}

fn detail_lines(task: &Task) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    lines.push(label_line("Title: ", task.title.clone()));
    lines.push(label_line("Status: ", task.status.to_string()));
    lines.push(Line::from(vec![
        Span::styled("Priority: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            task.priority.to_string(),
            Style::default().fg(priority_color(task.priority)),
        ),
    ]));
    lines.push(label_line(
        "Due Date: ",
        task.due_date
            .as_ref()
            .map(format_datetime_input)
            .unwrap_or_else(|| "No due date".to_string()),
    ));
    if let Some(reminder) = &task.reminder {
        lines.push(label_line("Reminder: ", format_datetime_input(reminder)));
    }

    lines.push(Line::from(vec![Span::styled(
        "Tags: ",
        Style::default().add_modifier(Modifier::BOLD),
    )]));
    if task.tags.is_empty() {
        lines.push(Line::from(Span::raw("No tags".to_string())));
    } else {
        let mut tag_spans: Vec<Span<'static>> = Vec::new();
        for (i, tag) in task.tags.as_slice().iter().enumerate() {
            if i > 0 {
                tag_spans.push(Span::raw(" ".to_string()));
            }
            tag_spans.push(Span::styled(
                format!(" {} ", tag),
                Style::default().bg(Color::Yellow).fg(Color::Black),
            ));
        }
        lines.push(Line::from(tag_spans));
    }

    if !task.attachments.is_empty() {
        lines.push(Line::from(vec![Span::styled(
            "Attachments: ",
            Style::default().add_modifier(Modifier::BOLD),
        )]));
        for attachment in &task.attachments {
            lines.push(Line::from(Span::raw(format!(
                "{}: {}",
                attachment.kind.as_str(),
                attachment.value
            ))));
        }
    }

    lines.push(Line::from(vec![Span::styled(
        "Description: ",
        Style::default().add_modifier(Modifier::BOLD),
    )]));
    match task.description.as_deref() {
        Some(desc) if !desc.trim().is_empty() => {
            for line in desc.lines() {
                lines.push(Line::from(Span::raw(line.to_string())));
            }
        }
        _ => lines.push(Line::from(Span::raw("No description".to_string()))),
    }

    if task.ai_generated == Some(true) {
        let confidence = task
            .ai_confidence
            .map(|c| format!(" ({:.0}% confidence)", c * 100.0))
            .unwrap_or_default();
        lines.push(Line::from(Span::styled(
            format!("Suggested by assistant{}", confidence),
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines
}

fn render_tasks(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
        .split(area);

    let tasks_widget = if !app.rows.is_empty() {
        let items: Vec<ListItem> = app
            .rows
            .iter()
            .map(|(bucket, task)| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:<10}", bucket.to_string()),
                        Style::default().fg(bucket_color(*bucket)),
                    ),
                    Span::raw(task.title.clone()),
                ]))
            })
            .collect();

        List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Tasks"))
            .highlight_style(
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(">> ")
    } else {
        List::new(vec![ListItem::new("No tasks yet. Press 'a' to add one.")])
            .block(Block::default().borders(Borders::ALL).title("Tasks"))
    };

    f.render_stateful_widget(tasks_widget, chunks[0], &mut app.state);

    let detail_block = Block::default().borders(Borders::ALL).title("Task Details");
    let paragraph = match app.selected_task() {
        Some(task) => Paragraph::new(detail_lines(task)),
        None => Paragraph::new("Select a task to see its details"),
    };
    f.render_widget(
        paragraph.block(detail_block).wrap(Wrap { trim: true }),
        chunks[1],
    );
}

// Three fifths of the screen, at least 30 columns when there is room.
fn form_width(total: u16) -> u16 {
    (total / 5 * 3).max(30).min(total)
}

fn render_form(f: &mut Frame, app: &App, area: Rect) {
    let popup_width = form_width(area.width);
    let attachments = app.form.attachments();
    let popup_height = (ActiveInput::ALL.len() + attachments.len() + 2).min(area.height as usize) as u16;
    let popup_area = centered_rect_absolute(popup_width, popup_height, area);

    let title = if app.form.base.is_editing() {
        "Edit Task (Enter to Save)"
    } else {
        "New Task (Enter to Save)"
    };
    let popup_block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Green));

    let mut lines: Vec<Line> = ActiveInput::ALL
        .iter()
        .map(|input| {
            let active = *input == app.active_input;
            let marker = if active { "> " } else { "  " };
            let label_style = if active {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            let mut value = app.form.text(*input);
            if active && matches!(app.input_mode, InputMode::Insert) {
                value.push('_');
            }
            Line::from(vec![
                Span::styled(format!("{}{:<12}", marker, input.label()), label_style),
                Span::styled(value, Style::default().fg(Color::White)),
            ])
        })
        .collect();
    for attachment in attachments {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:<12}", attachment.kind.as_str()),
                Style::default().fg(Color::Gray),
            ),
            Span::styled(attachment.value.clone(), Style::default().fg(Color::White)),
        ]));
    }

    let input = Paragraph::new(lines)
        .block(popup_block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(input, popup_area);
}

pub async fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> io::Result<()> {
    loop {
        // Buckets depend on the clock, not only on the task list.
        app.refresh_rows();

        terminal.draw(|f| {
            let size = f.area();

            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(0)
                .constraints(
                    [
                        Constraint::Min(0),
                        Constraint::Length(1),
                        Constraint::Length(2),
                    ]
                    .as_ref(),
                )
                .split(size);

            render_tasks(f, &mut app, chunks[0]);
            if !matches!(app.input_mode, InputMode::Normal) {
                render_form(f, &app, chunks[0]);
            }

            if let Some(message) = &app.status_message {
                let status = Paragraph::new(message.as_str()).style(Style::default().fg(Color::Red));
                f.render_widget(status, chunks[1]);
            }

            let legend = Paragraph::new(get_legend(&app.input_mode))
                .style(Style::default().fg(Color::White))
                .alignment(Alignment::Left)
                .wrap(Wrap { trim: true });

            f.render_widget(legend, chunks[2]);
        })?;

        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_input(key).await? {
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_width_on_wide_and_narrow_terminals() {
        assert_eq!(form_width(100), 60);
        assert_eq!(form_width(40), 30);
        assert_eq!(form_width(20), 20);
        assert_eq!(form_width(2000), 1200);
        assert_eq!(form_width(u16::MAX), 39321);
    }
}
