//! Color theme for the Blockfall TUI.
//!
//! Kanagawa Wave palette; block colors cycle through the accents by value.

use ratatui::style::{Color, Modifier, Style};

mod colors {
    use super::Color;

    pub const BG_DARK: Color = Color::Rgb(22, 22, 29); // sumiInk0
    pub const BG_PANEL: Color = Color::Rgb(31, 31, 40); // sumiInk3
    pub const BG_BORDER: Color = Color::Rgb(84, 84, 109); // sumiInk6

    pub const TEXT_PRIMARY: Color = Color::Rgb(220, 215, 186); // fujiWhite
    pub const TEXT_MUTED: Color = Color::Rgb(114, 113, 105); // fujiGray

    pub const PRIMARY: Color = Color::Rgb(149, 127, 184); // oniViolet
    pub const BLUE: Color = Color::Rgb(126, 156, 216); // crystalBlue
    pub const CYAN: Color = Color::Rgb(127, 180, 202); // springBlue
    pub const GREEN: Color = Color::Rgb(152, 187, 108); // springGreen
    pub const YELLOW: Color = Color::Rgb(230, 195, 132); // carpYellow
    pub const ORANGE: Color = Color::Rgb(255, 160, 102); // surimiOrange
    pub const RED: Color = Color::Rgb(255, 93, 98); // peachRed
}

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg_dark: Color,
    pub bg_panel: Color,
    pub bg_border: Color,
    pub text_primary: Color,
    pub text_muted: Color,
    pub primary: Color,
    pub warning: Color,
    pub error: Color,
    blocks: [Color; 6],
}

impl Palette {
    #[must_use]
    pub fn standard() -> Self {
        Self {
            bg_dark: colors::BG_DARK,
            bg_panel: colors::BG_PANEL,
            bg_border: colors::BG_BORDER,
            text_primary: colors::TEXT_PRIMARY,
            text_muted: colors::TEXT_MUTED,
            primary: colors::PRIMARY,
            warning: colors::YELLOW,
            error: colors::RED,
            blocks: [
                colors::BLUE,
                colors::CYAN,
                colors::GREEN,
                colors::YELLOW,
                colors::ORANGE,
                colors::RED,
            ],
        }
    }

    /// Fill color of a block holding `2^value`.
    #[must_use]
    pub fn block(&self, value: u32) -> Color {
        self.blocks[value as usize % self.blocks.len()]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::standard()
    }
}

pub mod styles {
    use super::{Modifier, Palette, Style};

    #[must_use]
    pub fn block(palette: &Palette, value: u32) -> Style {
        Style::default()
            .bg(palette.block(value))
            .fg(palette.bg_dark)
            .add_modifier(Modifier::BOLD)
    }

    /// Pre-merge value still fading out.
    #[must_use]
    pub fn ghost(palette: &Palette, value: u32) -> Style {
        Style::default()
            .bg(palette.block(value))
            .fg(palette.bg_panel)
            .add_modifier(Modifier::DIM)
    }

    #[must_use]
    pub fn column(palette: &Palette) -> Style {
        Style::default().bg(palette.bg_panel)
    }

    #[must_use]
    pub fn label(palette: &Palette) -> Style {
        Style::default().fg(palette.text_muted)
    }

    #[must_use]
    pub fn value(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.text_primary)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn cursor(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.primary)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn status(palette: &Palette) -> Style {
        Style::default().fg(palette.warning)
    }
}
