use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use subdomains_core::models::full_domain;

use crate::app::{App, AppState, LoadState};
use crate::ui::styles;

/// Render the Home tab - search box above the subdomain table
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Intro
            Constraint::Length(3), // Search box
            Constraint::Min(5),    // Table
        ])
        .split(area);

    render_intro(frame, app, chunks[0]);
    render_search(frame, app, chunks[1]);
    render_table(frame, app, chunks[2]);
}

fn render_intro(frame: &mut Frame, app: &App, area: Rect) {
    let call_to_action = if app.is_authenticated() {
        Span::styled("[o] Order New Subdomain →", styles::highlight_style())
    } else {
        Span::styled("[l] Login to Order", styles::highlight_style())
    };
    let line = Line::from(vec![
        Span::styled(" Existing subdomains and their purposes. ", styles::muted_style()),
        call_to_action,
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_search(frame: &mut Frame, app: &App, area: Rect) {
    let searching = matches!(app.state, AppState::Searching);
    let content = if app.search_query.is_empty() && !searching {
        Span::styled("Press / to search by name or purpose", styles::muted_style())
    } else {
        let cursor = if searching { "▌" } else { "" };
        Span::styled(format!("{}{}", app.search_query, cursor), styles::search_style())
    };

    let block = Block::default()
        .title(" Search ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(searching));

    frame.render_widget(Paragraph::new(Line::from(content)).block(block), area);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let filtered = app.filtered_subdomains();
    let focused = matches!(app.state, AppState::Normal);

    let block = Block::default()
        .title(format!(" Subdomains ({}) ", filtered.len()))
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    // Loading and error states replace the table
    let placeholder = match app.subdomains_state {
        LoadState::Idle | LoadState::Loading if app.subdomains.is_empty() => {
            Some(Span::styled(" Loading subdomains...", styles::muted_style()))
        }
        LoadState::Failed(ref msg) if app.subdomains.is_empty() => {
            Some(Span::styled(format!(" Error: {}", msg), styles::error_style()))
        }
        _ if filtered.is_empty() => Some(Span::styled(" No subdomains found", styles::muted_style())),
        _ => None,
    };
    if let Some(span) = placeholder {
        frame.render_widget(Paragraph::new(Line::from(span)).block(block), area);
        return;
    }

    let header = Row::new([Cell::from("Subdomain"), Cell::from("Purpose"), Cell::from("Status")])
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = filtered
        .iter()
        .enumerate()
        .map(|(i, subdomain)| {
            let style = if i == app.home_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            Row::new(vec![
                Cell::from(full_domain(&subdomain.name, &app.config.domain_suffix)),
                Cell::from(subdomain.purpose.as_str()),
                Cell::from(Span::styled(
                    subdomain.status.as_str(),
                    styles::subdomain_status_style(&subdomain.status),
                )),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(35),
        Constraint::Fill(1),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.home_selection));

    frame.render_stateful_widget(table, area, &mut state);

    // A failed reload keeps the old rows; say so on the bottom border
    if let LoadState::Failed(ref msg) = app.subdomains_state {
        let line_area = Rect::new(area.x + 2, area.y + area.height.saturating_sub(1), area.width.saturating_sub(4), 1);
        frame.render_widget(
            Paragraph::new(Span::styled(format!(" Reload failed: {} ", msg), styles::error_style())),
            line_area,
        );
    }
}
