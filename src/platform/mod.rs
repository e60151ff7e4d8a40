//! Platform helpers
//!
//! Page navigation for the browser build: launch options come from the query
//! string and level changes are written back into it.

/// Level-select page
pub const MENU_URL: &str = "menu.html";
/// Game page
pub const GAME_PAGE: &str = "index.html";

/// Session options requested by the page URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOptions {
    pub level: u32,
    pub autopilot: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            level: 1,
            autopilot: false,
        }
    }
}

/// Parse `?level=N&autopilot=1` style query strings
///
/// The level defaults to 1 and is clamped to `1..=level_count`; anything
/// that is not an integer counts as 1. Only `autopilot=1` enables the
/// autopilot.
pub fn parse_query(search: &str, level_count: u32) -> LaunchOptions {
    let mut options = LaunchOptions::default();
    let query = search.strip_prefix('?').unwrap_or(search);

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        match key {
            "level" => {
                let requested = value.trim().parse::<i64>().unwrap_or(1);
                options.level = requested.clamp(1, level_count.max(1) as i64) as u32;
            }
            "autopilot" => options.autopilot = value == "1",
            _ => {}
        }
    }

    options
}

/// Relative URL of the game page at `level`
pub fn level_url(level: u32) -> String {
    format!("{}?level={}", GAME_PAGE, level)
}
