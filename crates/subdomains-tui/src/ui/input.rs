//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    can_add_callback_char, can_add_name_char, can_add_purpose_char, App, AppState, OrderFocus,
    Tab, PAGE_SCROLL_SIZE,
};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> bool {
    // Handle login overlay
    if matches!(app.state, AppState::LoggingIn) {
        handle_login_input(app, key);
        return false;
    }

    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return false;
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return true;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return false;
    }

    if matches!(app.state, AppState::ConfirmingLogout) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Normal;
                app.logout();
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return false;
    }

    // Handle search mode
    if matches!(app.state, AppState::Searching) {
        handle_search_input(app, key);
        return false;
    }

    // The order form takes typed characters, so it sees keys before the globals
    if app.current_tab == Tab::Order {
        handle_order_input(app, key);
        return false;
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char('1') => app.set_tab(Tab::Home),
        KeyCode::Char('2') => app.set_tab(Tab::Order),
        KeyCode::Char('3') => app.set_tab(Tab::Profile),
        KeyCode::Left => app.set_tab(app.current_tab.prev()),
        KeyCode::Right => app.set_tab(app.current_tab.next()),
        KeyCode::Char('l') => {
            if app.is_authenticated() {
                app.state = AppState::ConfirmingLogout;
            } else {
                app.start_login();
            }
        }
        KeyCode::Char('u') => match app.current_tab {
            Tab::Profile => app.refresh_user_subdomains(),
            _ => app.refresh_subdomains(),
        },
        KeyCode::Esc => {
            app.search_query.clear();
            app.status_message = None;
            app.set_tab(Tab::Home);
        }
        _ => match app.current_tab {
            Tab::Home => handle_home_input(app, key),
            Tab::Profile => handle_profile_input(app, key),
            Tab::Order => {}
        },
    }

    false
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.search_query.clear();
            app.home_selection = 0;
        }
        KeyCode::Enter => {
            // Keep search query active
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => {
            app.search_query.pop();
            app.home_selection = 0;
        }
        KeyCode::Char(c) => {
            app.search_query.push(c);
            // Reset selection when search changes
            app.home_selection = 0;
        }
        _ => {}
    }
}

fn handle_login_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.login_callback.clear();
            app.login_error = None;
        }
        KeyCode::Enter => app.submit_login_callback(),
        KeyCode::Backspace => {
            app.login_callback.pop();
        }
        KeyCode::Char(c) => {
            if can_add_callback_char(app.login_callback.len(), c) {
                app.login_callback.push(c);
            }
        }
        _ => {}
    }
}

fn handle_home_input(app: &mut App, key: KeyEvent) {
    let max_index = app.filtered_subdomains().len().saturating_sub(1);

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            app.home_selection = app.home_selection.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.home_selection = (app.home_selection + 1).min(max_index);
        }
        KeyCode::PageUp => {
            app.home_selection = app.home_selection.saturating_sub(PAGE_SCROLL_SIZE);
        }
        KeyCode::PageDown => {
            app.home_selection = (app.home_selection + PAGE_SCROLL_SIZE).min(max_index);
        }
        KeyCode::Home => app.home_selection = 0,
        KeyCode::End => app.home_selection = max_index,
        KeyCode::Char('/') => {
            app.state = AppState::Searching;
            app.search_query.clear();
        }
        KeyCode::Char('o') => app.set_tab(Tab::Order),
        KeyCode::Char('p') => app.set_tab(Tab::Profile),
        _ => {}
    }
}

fn handle_profile_input(app: &mut App, key: KeyEvent) {
    let max_index = app.user_subdomains.len().saturating_sub(1);

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            app.profile_selection = app.profile_selection.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.profile_selection = (app.profile_selection + 1).min(max_index);
        }
        KeyCode::Char('o') => app.set_tab(Tab::Order),
        _ => {}
    }
}

fn handle_order_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.set_tab(Tab::Home);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.order_focus = app.order_focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.order_focus = app.order_focus.prev();
        }
        KeyCode::Enter => match app.order_focus {
            OrderFocus::Name => app.order_focus = OrderFocus::Purpose,
            OrderFocus::Purpose => app.order_focus = OrderFocus::Submit,
            OrderFocus::Submit => app.submit_order(),
        },
        KeyCode::Backspace => match app.order_focus {
            OrderFocus::Name => {
                app.order_name.pop();
            }
            OrderFocus::Purpose => {
                app.order_purpose.pop();
            }
            OrderFocus::Submit => {}
        },
        KeyCode::Char('?') if app.order_focus == OrderFocus::Submit => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char('q') if app.order_focus == OrderFocus::Submit => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char(c) => match app.order_focus {
            OrderFocus::Name => {
                if can_add_name_char(app.order_name.len(), c) {
                    app.order_name.push(c);
                }
            }
            OrderFocus::Purpose => {
                if can_add_purpose_char(app.order_purpose.chars().count(), c) {
                    app.order_purpose.push(c);
                }
            }
            // Ignore other character input on button
            OrderFocus::Submit => {}
        },
        _ => {}
    }
}
