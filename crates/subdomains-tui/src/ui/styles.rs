use ratatui::style::{Color, Modifier, Style};

use subdomains_core::models::SubdomainStatus;

// Color palette
pub const PRIMARY: Color = Color::Rgb(64, 128, 192);
pub const SECONDARY: Color = Color::Rgb(96, 160, 96);
pub const ACCENT: Color = Color::Rgb(192, 160, 64);
pub const ERROR: Color = Color::Rgb(192, 64, 64);
pub const MUTED: Color = Color::Rgb(128, 128, 128);
pub const HIGHLIGHT: Color = Color::Rgb(48, 48, 64);

// Styles
pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default()
        .bg(HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn success_style() -> Style {
    Style::default().fg(SECONDARY)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn tab_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(PRIMARY)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(Color::White)
    }
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn search_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(32, 32, 40)).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default()
        .fg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

/// Active green, pending yellow, inactive red, anything else grey
pub fn subdomain_status_style(status: &SubdomainStatus) -> Style {
    match status {
        SubdomainStatus::Active => success_style(),
        SubdomainStatus::Pending => highlight_style(),
        SubdomainStatus::Inactive => error_style(),
        SubdomainStatus::Other(_) => muted_style(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_colours() {
        assert_eq!(subdomain_status_style(&SubdomainStatus::Active).fg, Some(SECONDARY));
        assert_eq!(subdomain_status_style(&SubdomainStatus::Pending).fg, Some(ACCENT));
        assert_eq!(subdomain_status_style(&SubdomainStatus::Inactive).fg, Some(ERROR));
        assert_eq!(
            subdomain_status_style(&SubdomainStatus::Other("archived".into())).fg,
            Some(MUTED)
        );
    }
}
