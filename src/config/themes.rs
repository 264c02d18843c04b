use std::collections::HashMap;

use ratatui::style::Color;

use super::ThemeName;

/// Colours the reviewer screen is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub accent: Color,
    pub active_toggle: Color,
    pub active_text: Color,
    pub muted: Color,
    pub favorite: Color,
    pub error: Color,
}

#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    palettes: HashMap<ThemeName, Palette>,
}

impl ThemeRegistry {
    pub fn contains(&self, theme: &ThemeName) -> bool {
        self.palettes.contains_key(theme)
    }

    pub fn palette(&self, theme: &ThemeName) -> Palette {
        self.palettes
            .get(theme)
            .or_else(|| self.palettes.get(&ThemeName::Dark))
            .copied()
            .unwrap_or(DARK)
    }
}

const DARK: Palette = Palette {
    accent: Color::Cyan,
    active_toggle: Color::Blue,
    active_text: Color::Black,
    muted: Color::Gray,
    favorite: Color::Yellow,
    error: Color::Red,
};

impl Default for ThemeRegistry {
    fn default() -> Self {
        let palettes = [
            (ThemeName::Dark, DARK),
            (
                ThemeName::Light,
                Palette {
                    accent: Color::Blue,
                    active_toggle: Color::LightBlue,
                    active_text: Color::Black,
                    muted: Color::DarkGray,
                    favorite: Color::Magenta,
                    error: Color::Red,
                },
            ),
            (
                ThemeName::HighContrast,
                Palette {
                    accent: Color::White,
                    active_toggle: Color::Yellow,
                    active_text: Color::Black,
                    muted: Color::White,
                    favorite: Color::LightYellow,
                    error: Color::LightRed,
                },
            ),
            (
                ThemeName::Solarized,
                Palette {
                    accent: Color::Rgb(38, 139, 210),
                    active_toggle: Color::Rgb(42, 161, 152),
                    active_text: Color::Rgb(0, 43, 54),
                    muted: Color::Rgb(131, 148, 150),
                    favorite: Color::Rgb(181, 137, 0),
                    error: Color::Rgb(220, 50, 47),
                },
            ),
        ]
        .into_iter()
        .collect();
        Self { palettes }
    }
}
