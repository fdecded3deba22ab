//! Colors for the dashboard.

use ratatui::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub primary: Color,
    pub primary_background: Color,
    pub accent: Color,
    pub warning: Color,
    pub error: Color,
    pub success: Color,
    pub foreground: Color,
    pub background: Color,
    pub surface: Color,
    /// Usage columns above [`Theme::HOT_PERCENT`].
    pub hot: Color,
}

impl Theme {
    /// CPU% and MEM% cells above this are drawn in `hot`.
    pub const HOT_PERCENT: f32 = 10.0;

    pub const fn dark() -> Self {
        Self {
            primary: Color::from_u32(0x00ffff),
            primary_background: Color::from_u32(0x225555),
            accent: Color::from_u32(0xffaa22),
            warning: Color::from_u32(0xffdd55),
            error: Color::from_u32(0xff0000),
            success: Color::from_u32(0x00ff00),
            foreground: Color::from_u32(0xeeeeee),
            background: Color::from_u32(0x111111),
            surface: Color::from_u32(0x222222),
            hot: Color::from_u32(0xff5555),
        }
    }

    /// Blend toward white; `factor` is clamped to 0.0..=1.0.
    pub fn lighten(color: Color, factor: f32) -> Color {
        let factor = factor.clamp(0.0, 1.0);
        match color {
            Color::Rgb(r, g, b) => Color::Rgb(
                (r as f32 + (255.0 - r as f32) * factor) as u8,
                (g as f32 + (255.0 - g as f32) * factor) as u8,
                (b as f32 + (255.0 - b as f32) * factor) as u8,
            ),
            _ => color,
        }
    }

    /// Blend toward black; `factor` is clamped to 0.0..=1.0.
    pub fn darken(color: Color, factor: f32) -> Color {
        let factor = factor.clamp(0.0, 1.0);
        match color {
            Color::Rgb(r, g, b) => Color::Rgb(
                (r as f32 * (1.0 - factor)) as u8,
                (g as f32 * (1.0 - factor)) as u8,
                (b as f32 * (1.0 - factor)) as u8,
            ),
            _ => color,
        }
    }

    /// Color for a usage percentage cell.
    pub fn usage(&self, percent: f32) -> Color {
        if percent > Self::HOT_PERCENT {
            self.hot
        } else {
            self.foreground
        }
    }
}
