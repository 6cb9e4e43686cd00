//! Inspector palette (Catppuccin Mocha)

use ratatui::style::Color;

pub struct Theme {
    pub fg: Color,
    pub accent: Color,
    pub muted: Color,
    pub ok: Color,
    pub error: Color,
    /// Shader keywords and built-in type names.
    pub keyword: Color,
    /// Offsets, sizes and array extents.
    pub offset: Color,
    pub border_focused: Color,
    pub border_normal: Color,
    pub selection_bg: Color,
    /// User-defined type names.
    pub type_name: Color,
    pub member: Color,
}

pub const DEFAULT_THEME: Theme = Theme {
    fg: Color::Rgb(205, 214, 244),
    accent: Color::Rgb(137, 180, 250),
    muted: Color::Rgb(108, 112, 134),
    ok: Color::Rgb(166, 227, 161),
    error: Color::Rgb(243, 139, 168),
    keyword: Color::Rgb(203, 166, 247),
    offset: Color::Rgb(250, 179, 135),
    border_focused: Color::Rgb(249, 226, 175),
    border_normal: Color::Rgb(88, 91, 112),
    selection_bg: Color::Rgb(49, 50, 68),
    type_name: Color::Rgb(148, 226, 213),
    member: Color::Rgb(245, 224, 220),
};
