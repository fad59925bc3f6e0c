//! Centralized color theme for the TUI.
//!
//! Every color used by the UI is looked up here, including the conversion of
//! the server's floating-point RGB triples into terminal colors. No hardcoded
//! `Color::*` constants elsewhere in the codebase.

use ratatui::style::Color;

use crate::page::StyleClass;

/// A complete color palette for the client.
pub struct Theme {
    // ── Surfaces / borders ───────────────────────────────────────────────
    pub border: Color,

    // ── Text ─────────────────────────────────────────────────────────────
    pub text: Color,
    pub text_dim: Color,

    // ── Entry screen ─────────────────────────────────────────────────────
    pub game_title: Color,
    pub subtext: Color,
    pub field_text: Color,
    pub field_placeholder: Color,
    pub error: Color,

    // ── Game board ───────────────────────────────────────────────────────
    pub board_border: Color,
    pub food: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            border: Color::Cyan,
            text: Color::White,
            text_dim: Color::DarkGray,
            game_title: Color::Yellow,
            subtext: Color::DarkGray,
            field_text: Color::White,
            field_placeholder: Color::DarkGray,
            error: Color::Red,
            board_border: Color::DarkGray,
            food: Color::Gray,
        }
    }
}

impl Theme {
    /// Foreground color for a styled span or panel border.
    pub fn class_color(&self, class: StyleClass) -> Color {
        match class {
            StyleClass::FormInput => self.field_text,
            StyleClass::LoginBox | StyleClass::InstructionsBox => self.border,
            StyleClass::Subtext => self.subtext,
            StyleClass::GameTitle => self.game_title,
            StyleClass::ErrorText => self.error,
            StyleClass::Viewport => self.board_border,
        }
    }

    /// Convert a server color triple (components in `0.0..=1.0`) into a
    /// 24-bit terminal color.
    pub fn rgb(color: (f64, f64, f64)) -> Color {
        let channel = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Color::Rgb(channel(color.0), channel(color.1), channel(color.2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_conversion_scales_and_clamps() {
        assert_eq!(Theme::rgb((0.0, 0.5, 1.0)), Color::Rgb(0, 128, 255));
        // Out-of-range components are clamped, not wrapped.
        assert_eq!(Theme::rgb((-1.0, 2.0, 0.8)), Color::Rgb(0, 255, 204));
    }
}
