//! Theme data model: built-in palettes, appearance detection, and
//! resolution from config.
//!
//! Two built-in palettes (dark and light) with custom color overrides from
//! the config file. The "auto" scheme follows the terminal's appearance,
//! which is re-detected on a timer and delivered as an event.

use std::process::Command;

use ratatui::style::Color;

use crate::config::{AppConfig, ThemeColorsConfig, ThemeConfig};

/// Background brightness of the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Dark,
    Light,
}

// ── Runtime theme colors ─────────────────────────────────────────────────────

/// All runtime colors used in the UI.
///
/// Constructed from a config-level `ThemeConfig` via `resolve_theme()`.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeColors {
    // List views
    pub list_bg: Color,
    pub list_fg: Color,
    pub list_selected_bg: Color,
    pub list_selected_fg: Color,
    pub list_dir_fg: Color,
    pub list_dim_fg: Color,

    // Content views
    pub content_bg: Color,
    pub content_fg: Color,
    pub content_line_nr_fg: Color,

    // Status bar
    pub status_bg: Color,
    pub status_fg: Color,

    // Borders & chrome
    pub border_fg: Color,
    pub header_fg: Color,

    // Semantic colors (not configurable, consistent across themes)
    pub error_fg: Color,
    pub warning_fg: Color,
    pub success_fg: Color,
    pub info_fg: Color,
    pub accent_fg: Color,
    pub dim_fg: Color,
}

// ── Built-in palettes ────────────────────────────────────────────────────────

/// Dark theme using Catppuccin Mocha palette.
pub fn dark_theme() -> ThemeColors {
    ThemeColors {
        list_bg: Color::Reset,
        list_fg: Color::Rgb(205, 214, 244),          // #cdd6f4 (text)
        list_selected_bg: Color::Rgb(69, 71, 90),    // #45475a (surface1)
        list_selected_fg: Color::Rgb(205, 214, 244), // #cdd6f4
        list_dir_fg: Color::Rgb(137, 180, 250),      // #89b4fa (blue)
        list_dim_fg: Color::Rgb(108, 112, 134),      // #6c7086 (overlay0)

        content_bg: Color::Reset,
        content_fg: Color::Rgb(205, 214, 244),
        content_line_nr_fg: Color::Rgb(108, 112, 134),

        status_bg: Color::Rgb(30, 30, 46), // #1e1e2e (base)
        status_fg: Color::Rgb(205, 214, 244),

        border_fg: Color::Rgb(88, 91, 112), // #585b70 (surface2)
        header_fg: Color::Rgb(137, 180, 250),

        error_fg: Color::Rgb(243, 139, 168),   // #f38ba8 (red)
        warning_fg: Color::Rgb(249, 226, 175), // #f9e2af (yellow)
        success_fg: Color::Rgb(166, 227, 161), // #a6e3a1 (green)
        info_fg: Color::Rgb(137, 180, 250),    // #89b4fa (blue)
        accent_fg: Color::Rgb(203, 166, 247),  // #cba6f7 (mauve)
        dim_fg: Color::Rgb(108, 112, 134),     // #6c7086
    }
}

/// Light theme using Catppuccin Latte palette.
pub fn light_theme() -> ThemeColors {
    ThemeColors {
        list_bg: Color::Reset,
        list_fg: Color::Rgb(76, 79, 105),            // #4c4f69 (text)
        list_selected_bg: Color::Rgb(204, 208, 218), // #ccd0da (surface1)
        list_selected_fg: Color::Rgb(76, 79, 105),
        list_dir_fg: Color::Rgb(30, 102, 245), // #1e66f5 (blue)
        list_dim_fg: Color::Rgb(156, 160, 176), // #9ca0b0 (overlay0)

        content_bg: Color::Reset,
        content_fg: Color::Rgb(76, 79, 105),
        content_line_nr_fg: Color::Rgb(156, 160, 176),

        status_bg: Color::Rgb(239, 241, 245), // #eff1f5 (base)
        status_fg: Color::Rgb(76, 79, 105),

        border_fg: Color::Rgb(172, 176, 190), // #acb0be (surface2)
        header_fg: Color::Rgb(30, 102, 245),

        error_fg: Color::Rgb(210, 15, 57),    // #d20f39 (red)
        warning_fg: Color::Rgb(223, 142, 29), // #df8e1d (yellow)
        success_fg: Color::Rgb(64, 160, 43),  // #40a02b (green)
        info_fg: Color::Rgb(30, 102, 245),
        accent_fg: Color::Rgb(136, 57, 239), // #8839ef (mauve)
        dim_fg: Color::Rgb(156, 160, 176),
    }
}

fn palette(scheme: Scheme) -> ThemeColors {
    match scheme {
        Scheme::Dark => dark_theme(),
        Scheme::Light => light_theme(),
    }
}

// ── Color parsing ────────────────────────────────────────────────────────────

/// Parse a hex color string like `"#aabbcc"` into a `ratatui::style::Color`.
/// Returns `None` for malformed input.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

/// Parse a hex color string, falling back to the provided default on error.
fn parse_or(hex_opt: Option<&str>, fallback: Color) -> Color {
    hex_opt.and_then(parse_hex_color).unwrap_or(fallback)
}

// ── Appearance detection ─────────────────────────────────────────────────────

/// Scheme from a `COLORFGBG` value such as `"15;0"` (fg;bg, ANSI indices).
pub fn scheme_from_colorfgbg(value: &str) -> Option<Scheme> {
    let bg: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    match bg {
        7 | 9..=15 => Some(Scheme::Light),
        _ => Some(Scheme::Dark),
    }
}

/// Best guess at the terminal background. Blocking: may run a process.
pub fn detect_scheme() -> Scheme {
    if cfg!(target_os = "macos") {
        // The key only exists while dark mode is on.
        return match Command::new("defaults")
            .args(["read", "-g", "AppleInterfaceStyle"])
            .output()
        {
            Ok(out) if out.status.success() => {
                if String::from_utf8_lossy(&out.stdout).trim() == "Dark" {
                    Scheme::Dark
                } else {
                    Scheme::Light
                }
            }
            Ok(_) => Scheme::Light,
            Err(_) => Scheme::Dark,
        };
    }
    std::env::var("COLORFGBG")
        .ok()
        .and_then(|v| scheme_from_colorfgbg(&v))
        .unwrap_or(Scheme::Dark)
}

// ── Theme resolution ─────────────────────────────────────────────────────────

/// The scheme in effect: fixed by config, or the detected one for "auto"
/// and "custom".
pub fn effective_scheme(config: &ThemeConfig, detected: Scheme) -> Scheme {
    match config.scheme.as_deref().unwrap_or("auto") {
        "dark" => Scheme::Dark,
        "light" => Scheme::Light,
        _ => detected,
    }
}

/// Resolve the final `ThemeColors` from config.
///
/// - `"auto"` (default): palette matching the detected appearance
/// - `"dark"` / `"light"`: fixed Catppuccin palette
/// - `"custom"`: detected palette, then override with custom hex values
pub fn resolve_theme(config: &ThemeConfig, detected: Scheme) -> ThemeColors {
    let mut theme = palette(effective_scheme(config, detected));
    if config.scheme.as_deref() == Some("custom") {
        if let Some(custom) = &config.custom {
            apply_custom_colors(&mut theme, custom);
        }
    }
    theme
}

/// Syntect theme name for the scheme in effect.
pub fn syntax_theme_name(config: &AppConfig, detected: Scheme) -> &str {
    match effective_scheme(&config.theme, detected) {
        Scheme::Dark => config.syntax_theme_dark(),
        Scheme::Light => config.syntax_theme_light(),
    }
}

/// Apply custom hex color overrides on top of an existing theme.
fn apply_custom_colors(theme: &mut ThemeColors, custom: &ThemeColorsConfig) {
    let slots: [(&Option<String>, &mut Color); 13] = [
        (&custom.list_bg, &mut theme.list_bg),
        (&custom.list_fg, &mut theme.list_fg),
        (&custom.list_selected_bg, &mut theme.list_selected_bg),
        (&custom.list_selected_fg, &mut theme.list_selected_fg),
        (&custom.list_dir_fg, &mut theme.list_dir_fg),
        (&custom.list_dim_fg, &mut theme.list_dim_fg),
        (&custom.content_bg, &mut theme.content_bg),
        (&custom.content_fg, &mut theme.content_fg),
        (&custom.content_line_nr_fg, &mut theme.content_line_nr_fg),
        (&custom.status_bg, &mut theme.status_bg),
        (&custom.status_fg, &mut theme.status_fg),
        (&custom.border_fg, &mut theme.border_fg),
        (&custom.header_fg, &mut theme.header_fg),
    ];
    for (hex, slot) in slots {
        *slot = parse_or(hex.as_deref(), *slot);
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme(name: &str) -> ThemeConfig {
        ThemeConfig {
            scheme: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_hex_color_valid() {
        assert_eq!(parse_hex_color("#ff0000"), Some(Color::Rgb(255, 0, 0)));
        assert_eq!(parse_hex_color("#1a1b26"), Some(Color::Rgb(26, 27, 38)));
        assert_eq!(parse_hex_color("00ff00"), Some(Color::Rgb(0, 255, 0)));
    }

    #[test]
    fn test_parse_hex_color_invalid() {
        assert_eq!(parse_hex_color("#zzzzzz"), None);
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color(""), None);
        assert_eq!(parse_hex_color("#ééé"), None);
    }

    #[test]
    fn test_fixed_schemes_ignore_detection() {
        assert_eq!(
            resolve_theme(&scheme("dark"), Scheme::Light).list_dir_fg,
            Color::Rgb(137, 180, 250)
        );
        assert_eq!(
            resolve_theme(&scheme("light"), Scheme::Dark).list_dir_fg,
            Color::Rgb(30, 102, 245)
        );
    }

    #[test]
    fn test_auto_follows_detection() {
        let config = ThemeConfig::default();
        assert_eq!(resolve_theme(&config, Scheme::Dark), dark_theme());
        assert_eq!(resolve_theme(&config, Scheme::Light), light_theme());
    }

    #[test]
    fn test_resolve_custom_overrides() {
        let config = ThemeConfig {
            scheme: Some("custom".to_string()),
            custom: Some(ThemeColorsConfig {
                list_bg: Some("#1a1b26".to_string()),
                list_fg: Some("#c0caf5".to_string()),
                status_bg: Some("#zzzzzz".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let theme = resolve_theme(&config, Scheme::Dark);
        assert_eq!(theme.list_bg, Color::Rgb(26, 27, 38));
        assert_eq!(theme.list_fg, Color::Rgb(192, 202, 245));
        // Invalid hex keeps the palette value
        assert_eq!(theme.status_bg, Color::Rgb(30, 30, 46));
        assert_eq!(theme.list_dir_fg, Color::Rgb(137, 180, 250));
    }

    #[test]
    fn test_unknown_scheme_follows_detection() {
        assert_eq!(resolve_theme(&scheme("neon"), Scheme::Light), light_theme());
    }

    #[test]
    fn test_colorfgbg() {
        assert_eq!(scheme_from_colorfgbg("15;0"), Some(Scheme::Dark));
        assert_eq!(scheme_from_colorfgbg("0;15"), Some(Scheme::Light));
        assert_eq!(scheme_from_colorfgbg("0;default;7"), Some(Scheme::Light));
        assert_eq!(scheme_from_colorfgbg("garbage"), None);
    }

    #[test]
    fn test_syntax_theme_per_scheme() {
        let config = AppConfig::default();
        assert_eq!(syntax_theme_name(&config, Scheme::Dark), "base16-ocean.dark");
        assert_eq!(syntax_theme_name(&config, Scheme::Light), "InspiredGitHub");
    }

    #[test]
    fn test_dark_and_light_different() {
        let dark = dark_theme();
        let light = light_theme();
        assert_ne!(dark.list_fg, light.list_fg);
        assert_ne!(dark.list_selected_bg, light.list_selected_bg);
        assert_ne!(dark.error_fg, light.error_fg);
    }
}
