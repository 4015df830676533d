use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use subdomains_core::models::full_domain;
use subdomains_core::utils::format_optional;

use crate::app::{App, LoadState};
use crate::ui::styles;

/// Render the Profile tab - account details above the user's subdomains
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(5)])
        .split(area);

    render_account(frame, app, chunks[0]);
    render_subdomains(frame, app, chunks[1]);
}

fn render_account(frame: &mut Frame, app: &App, area: Rect) {
    let identity = app.session_view.identity.as_ref();
    let username = identity.map(|i| i.username.as_str()).filter(|s| !s.is_empty());
    let email = identity.map(|i| i.email.as_str()).filter(|s| !s.is_empty());

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Username:   ", styles::muted_style()),
            Span::raw(format_optional(username, "-")),
        ]),
        Line::from(vec![
            Span::styled("Email:      ", styles::muted_style()),
            Span::raw(format_optional(email, "-")),
        ]),
    ];
    if let Some(expires) = identity.and_then(|i| i.expires_at) {
        lines.push(Line::from(vec![
            Span::styled("Login until ", styles::muted_style()),
            Span::raw(expires.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(
            "Username and email can only be changed in the Account Center: {}",
            app.config.account_center_url
        ),
        styles::muted_style(),
    )));

    let block = Block::default()
        .title(" Profile ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_subdomains(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(format!(" Your Subdomains ({}) ", app.user_subdomains.len()))
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let placeholder = match app.user_subdomains_state {
        LoadState::Idle | LoadState::Loading => {
            Some(Span::styled(" Loading your subdomains...", styles::muted_style()))
        }
        LoadState::Failed(ref msg) => Some(Span::styled(format!(" Error: {}", msg), styles::error_style())),
        LoadState::Loaded if app.user_subdomains.is_empty() => Some(Span::styled(
            " You have not created any subdomains yet. Press [o] to order one.",
            styles::muted_style(),
        )),
        LoadState::Loaded => None,
    };
    if let Some(span) = placeholder {
        frame.render_widget(Paragraph::new(Line::from(span)).block(block), area);
        return;
    }

    let header = Row::new([Cell::from("Subdomain"), Cell::from("Status")])
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = app
        .user_subdomains
        .iter()
        .map(|subdomain| {
            Row::new(vec![
                Cell::from(format!(
                    "https://{}",
                    full_domain(&subdomain.name, &app.config.domain_suffix)
                )),
                Cell::from(Span::styled(
                    subdomain.status.as_str(),
                    styles::subdomain_status_style(&subdomain.status),
                )),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Fill(1), Constraint::Length(10)])
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.profile_selection));

    frame.render_stateful_widget(table, area, &mut state);
}
