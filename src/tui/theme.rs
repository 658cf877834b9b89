use ratatui::style::Color;

/// Color palette shared by every app screen.
#[derive(Debug, Clone)]
pub struct Theme {
    pub text_primary: Color,
    pub text_muted: Color,
    pub accent: Color,
    pub border: Color,
    pub border_focused: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub bg_surface: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            text_primary: Color::Rgb(205, 214, 244),
            text_muted: Color::Rgb(127, 132, 156),
            accent: Color::Rgb(137, 180, 250),
            border: Color::Rgb(69, 71, 90),
            border_focused: Color::Rgb(137, 180, 250),
            success: Color::Rgb(166, 227, 161),
            warning: Color::Rgb(249, 226, 175),
            error: Color::Rgb(243, 139, 168),
            bg_surface: Color::Rgb(49, 50, 68),
        }
    }
}
