use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use subdomains_core::utils::format_optional;

use crate::app::{App, OrderFocus};
use crate::ui::styles;

const TERMS: [&str; 5] = [
    "Subdomains must adhere to company policies and guidelines.",
    "Requests for offensive or inappropriate subdomains will be rejected.",
    "Subdomains are allocated on a first-come, first-served basis.",
    "Each request is reviewed and approved by the administrative team.",
    "Maintenance of a subdomain is the responsibility of the requester.",
];

/// Render the Order tab - form on the left, terms on the right
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_form(frame, app, chunks[0]);
    render_terms(frame, app, chunks[1]);
}

fn field_style(app: &App, focus: OrderFocus) -> ratatui::style::Style {
    if app.order_focus == focus {
        styles::selected_style()
    } else {
        styles::list_item_style()
    }
}

fn render_form(frame: &mut Frame, app: &App, area: Rect) {
    let email = app
        .session_view
        .identity
        .as_ref()
        .map(|i| i.email.as_str())
        .filter(|e| !e.is_empty());

    let mut lines = vec![Line::from("")];

    // Subdomain name with the fixed suffix beside it
    let name_cursor = if app.order_focus == OrderFocus::Name { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::styled(" Subdomain: [", styles::muted_style()),
        Span::styled(
            format!("{:<20}", format!("{}{}", app.order_name, name_cursor)),
            field_style(app, OrderFocus::Name),
        ),
        Span::styled("]", styles::muted_style()),
        Span::styled(format!(".{}", app.config.domain_suffix.trim_start_matches('.')), styles::muted_style()),
    ]));
    if app.order_is_duplicate() {
        lines.push(Line::from(Span::styled(
            "            This subdomain already exists. Please choose another one.",
            styles::error_style(),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            format!("            {}", app.order_preview()),
            styles::muted_style(),
        )));
    }
    lines.push(Line::from(""));

    // Email is taken from the account and cannot be edited here
    lines.push(Line::from(vec![
        Span::styled(" Email:      ", styles::muted_style()),
        Span::styled(format_optional(email, "-"), styles::muted_style()),
    ]));
    lines.push(Line::from(Span::styled(
        format!("             Change it in the Account Center: {}", app.config.account_center_url),
        styles::muted_style(),
    )));
    lines.push(Line::from(""));

    let purpose_cursor = if app.order_focus == OrderFocus::Purpose { "▌" } else { "" };
    let purpose = if app.order_purpose.is_empty() && app.order_focus != OrderFocus::Purpose {
        Span::styled("Describe the purpose of this subdomain", styles::muted_style())
    } else {
        Span::styled(
            format!("{}{}", app.order_purpose, purpose_cursor),
            field_style(app, OrderFocus::Purpose),
        )
    };
    lines.push(Line::from(vec![Span::styled(" Purpose:    ", styles::muted_style()), purpose]));
    lines.push(Line::from(""));

    let label = if app.submitting { "Submitting..." } else { "Submit Order" };
    let button_style = if !app.can_submit_order() && !app.submitting {
        styles::muted_style()
    } else {
        field_style(app, OrderFocus::Submit)
    };
    let button = if app.order_focus == OrderFocus::Submit {
        format!(" ▶ {} ◀ ", label)
    } else {
        format!("   {}   ", label)
    };
    lines.push(Line::from(vec![
        Span::raw("            ["),
        Span::styled(button, button_style),
        Span::raw("]"),
    ]));

    let block = Block::default()
        .title(" Order a New Subdomain ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_terms(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![Line::from(Span::styled("Terms and Conditions", styles::highlight_style()))];
    lines.extend(TERMS.iter().map(|t| Line::from(format!(" • {}", t))));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("{} subdomains already registered", app.subdomains.len()),
        styles::muted_style(),
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}
