use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};
use unicode_width::UnicodeWidthChar;

use crate::models::{RecommendationItem, ResultPayload};

use super::{App, state::FocusArea};

const PLACEHOLDER: &str = "What we feeling today?";

pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(4),
            Constraint::Length(1),
        ])
        .split(frame.size());

    draw_header(frame, app, chunks[0]);
    draw_input(frame, app, chunks[1]);
    draw_submit(frame, app, chunks[2]);

    if app.view.results().is_some() {
        draw_results(frame, app, chunks[3]);
    }

    draw_footer(frame, app, chunks[4]);
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            app.page_title.clone(),
            Style::default()
                .fg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from("Music picks based on your mood, time & weather").style(dim_style()),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title("Mood")
        .borders(Borders::ALL)
        .border_style(border_style(app.focus, FocusArea::Input));

    let text = if app.view.query.is_empty() {
        Line::from(format!("> {PLACEHOLDER}")).style(dim_style())
    } else {
        // Borders plus the "> " prompt.
        let room = usize::from(area.width.saturating_sub(4));
        Line::from(format!("> {}", visible_tail(&app.view.query, room)))
    };

    frame.render_widget(Paragraph::new(text).block(block), area);
}

/// Longest suffix of `text` that fits in `width` terminal columns.
fn visible_tail(text: &str, width: usize) -> &str {
    let mut used = 0;
    let mut start = text.len();
    for (idx, ch) in text.char_indices().rev() {
        used += ch.width().unwrap_or(0);
        if used > width {
            break;
        }
        start = idx;
    }
    &text[start..]
}

fn draw_submit(frame: &mut Frame, app: &App, area: Rect) {
    let control = app.view.lifecycle.submit_control();
    let style = if control.disabled {
        dim_style()
    } else {
        Style::default()
            .fg(Color::Black)
            .bg(Color::LightGreen)
            .add_modifier(Modifier::BOLD)
    };
    let button = Paragraph::new(Line::from(Span::styled(
        format!("[ {} ]", control.label),
        style,
    )));
    frame.render_widget(button, area);
}

fn draw_results(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(payload) = app.view.results().cloned() else {
        return;
    };

    let info_height = if app.view.info_panel().is_some() {
        info_lines(&payload).len() as u16 + 2
    } else {
        0
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(info_height),
            Constraint::Min(3),
        ])
        .split(area);

    let toggle = Paragraph::new(Line::from(Span::styled(
        format!("[ {} ]", app.view.info_toggle_label()),
        Style::default().fg(Color::Cyan),
    )));
    frame.render_widget(toggle, chunks[0]);

    if info_height > 0 {
        let context = Paragraph::new(info_lines(&payload))
            .block(Block::default().title("Context").borders(Borders::ALL));
        frame.render_widget(context, chunks[1]);
    }

    let items: Vec<ListItem> = if payload.recommendations.is_empty() {
        vec![ListItem::new("No recommendations returned").style(dim_style())]
    } else {
        payload
            .recommendations
            .iter()
            .map(|item| ListItem::new(recommendation_lines(item)))
            .collect()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .title("Recommendations")
                .borders(Borders::ALL)
                .border_style(border_style(app.focus, FocusArea::Results)),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(list, chunks[2], &mut app.results_state);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let help = match app.focus {
        FocusArea::Input => "Type your mood • Enter: get recommendations • Tab: results • Ctrl+C: quit",
        FocusArea::Results => "↑/↓: select • o: listen • i: toggle info • Tab: input • q: quit",
    };
    let footer = Paragraph::new(help).style(Style::default().fg(Color::Gray));
    frame.render_widget(footer, area);
}

fn info_lines(payload: &ResultPayload) -> Vec<Line<'static>> {
    let mut lines = vec![
        labelled("Time of Day", payload.time_of_day.clone()),
        labelled("Weather", payload.weather.description.clone()),
        labelled("Temperature", payload.temperature_label()),
    ];
    if let Some(feels_like) = payload.weather.feels_like {
        lines.push(labelled("Feels Like", format!("{feels_like}°C")));
    }
    if let Some(local_time) = payload.local_time {
        lines.push(labelled(
            "Local Time",
            local_time.format("%Y-%m-%d %H:%M").to_string(),
        ));
    }
    lines
}

fn labelled(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{label}: "),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(value),
    ])
}

fn recommendation_lines(item: &RecommendationItem) -> Vec<Line<'static>> {
    let cover = if item.has_cover() {
        Line::from(format!("   cover: {}", item.album_cover_url)).style(dim_style())
    } else {
        Line::from("   no cover").style(dim_style())
    };

    let mut lines = vec![
        Line::from(Span::styled(
            item.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("   {}", item.artist)),
        Line::from(format!("   {}", item.meta_line())).style(dim_style()),
        cover,
    ];
    if item.listen_link().is_some() {
        lines.push(Line::from("   ▶ Listen on Spotify").style(Style::default().fg(Color::Green)));
    }
    lines
}

fn border_style(current: FocusArea, area: FocusArea) -> Style {
    if current == area {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn dim_style() -> Style {
    Style::default().fg(Color::DarkGray)
}
