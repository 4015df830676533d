use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState, OrderFocus, Tab};
use subdomains_core::utils::truncate_string;

use super::styles;
use super::tabs::{home, order, profile};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::ConfirmingQuit => render_confirm_overlay(frame, "Are you sure you want to quit?", "quit"),
        AppState::ConfirmingLogout => render_confirm_overlay(frame, "Log out of your account?", "log out"),
        _ => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  Dovuchcha Subdomains";
    let greeting = match app.username() {
        Some(name) => format!("Hello, {}!  [l] Logout", name),
        None if !app.session_view.initialized => "Restoring session...".to_string(),
        None => "[l] Login".to_string(),
    };
    let help_hint = if app.help_available() { "  [?] Help" } else { "" };

    let used = title.chars().count() + greeting.chars().count() + help_hint.len() + 4;
    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat((area.width as usize).saturating_sub(used))),
        Span::styled(greeting, styles::highlight_style()),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let tabs = [
        ("[1] Home", Tab::Home),
        ("[2] Order", Tab::Order),
        ("[3] Profile", Tab::Profile),
    ];

    let mut spans = vec![Span::raw(" ")];
    for (i, (label, tab)) in tabs.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let style = if app.current_tab == *tab {
            styles::tab_style(true)
        } else if tab.requires_login() && !app.is_authenticated() {
            styles::muted_style()
        } else {
            styles::tab_style(false)
        };
        spans.push(Span::styled(*label, style));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Home => home::render(frame, app, area),
        Tab::Order => order::render(frame, app, area),
        Tab::Profile => profile::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.current_tab {
        Tab::Order if app.order_focus == OrderFocus::Submit => "[Enter] submit | [?] help | [Esc] back",
        Tab::Order => "[Tab] next field | [Esc] back",
        Tab::Profile => "[u]pdate | [l]ogout | [q]uit",
        Tab::Home => "[/] search | [u]pdate | [q]uit",
    };

    let left_text = match app.status_message {
        Some(ref msg) => format!(" {} ", msg),
        None => format!(" {} ", app.session_status()),
    };
    let right_text = format!(" {} ", shortcuts);

    let width = area.width as usize;
    let left_text = truncate_string(&left_text, width.saturating_sub(right_text.len()));
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 24, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  Dovuchcha Subdomains", styles::title_style())),
        Line::from(Span::styled(format!("  version {}", version), styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-3", "Switch tabs"),
        help_line("←/→", "Previous/next tab"),
        help_line("↑/↓", "Navigate list"),
        help_line("Esc", "Go back / clear search"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("/", "Search subdomains"),
        help_line("u", "Reload from the server"),
        help_line("o", "Order a new subdomain"),
        help_line("l", "Log in / log out"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled(" Order Form", styles::highlight_style())),
        help_line("Tab", "Next field"),
        help_line("Enter", "Next field / submit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(help_text).block(block);

    frame.render_widget(paragraph, area);
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(72, 16, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled(" Log in with your Dovuchcha account", styles::title_style())),
        Line::from(""),
        Line::from(Span::styled(" 1. Open this address in a browser:", styles::muted_style())),
    ];

    match app.login_url {
        Some(ref url) => lines.push(Line::from(Span::styled(format!("    {}", url), styles::highlight_style()))),
        None => lines.push(Line::from(Span::styled("    (login address unavailable)", styles::error_style()))),
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " 2. Paste the address the browser lands on afterwards:",
        styles::muted_style(),
    )));

    // Show the tail of the callback so the cursor stays visible
    let field_width = (area.width as usize).saturating_sub(8);
    let typed: Vec<char> = app.login_callback.chars().collect();
    let visible: String = typed[typed.len().saturating_sub(field_width)..].iter().collect();
    let cursor = if app.login_pending { "" } else { "▌" };
    lines.push(Line::from(vec![
        Span::styled("  [", styles::muted_style()),
        Span::styled(format!("{}{}", visible, cursor), styles::selected_style()),
        Span::styled("]", styles::muted_style()),
    ]));

    lines.push(Line::from(""));
    if app.login_pending {
        lines.push(Line::from(Span::styled(" Completing login...", styles::search_style())));
    } else {
        lines.push(Line::from(vec![
            Span::styled(" [Enter]", styles::help_key_style()),
            Span::styled(" complete login  ", styles::muted_style()),
            Span::styled("[Esc]", styles::help_key_style()),
            Span::styled(" cancel", styles::muted_style()),
        ]));
    }

    // Error message
    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

/// Create a centered rectangle with fixed dimensions
pub(crate) fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_confirm_overlay(frame: &mut Frame, question: &str, action: &str) {
    let area = centered_rect_fixed(46, 7, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("   {}", question), styles::highlight_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(format!(" to {}, ", action), styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fits_inside() {
        let outer = Rect::new(0, 0, 100, 40);
        let inner = centered_rect_fixed(46, 10, outer);
        assert_eq!(inner, Rect::new(27, 15, 46, 10));

        let tiny = Rect::new(0, 0, 20, 5);
        let clamped = centered_rect_fixed(46, 10, tiny);
        assert_eq!(clamped.width, 20);
        assert_eq!(clamped.height, 5);
    }
}
