use ratatui::style::Color;

/// A named color palette for the TUI.
pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub muted: Color,
  pub accent: Color,
  pub border: Color,
  pub status: Color,
  pub error: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub static THEMES: &[Theme] = &[
  Theme {
    name: "slate",
    bg: Color::Rgb(24, 26, 32),
    fg: Color::Rgb(205, 214, 224),
    muted: Color::Rgb(110, 120, 134),
    accent: Color::Rgb(122, 162, 247),
    border: Color::Rgb(56, 62, 74),
    status: Color::Rgb(158, 206, 106),
    error: Color::Rgb(247, 118, 142),
    highlight_fg: Color::Rgb(24, 26, 32),
    highlight_bg: Color::Rgb(122, 162, 247),
    stripe_bg: Color::Rgb(30, 33, 41),
    key_fg: Color::Rgb(24, 26, 32),
    key_bg: Color::Rgb(110, 120, 134),
  },
  Theme {
    name: "paper",
    bg: Color::Rgb(246, 242, 233),
    fg: Color::Rgb(55, 53, 47),
    muted: Color::Rgb(140, 134, 122),
    accent: Color::Rgb(175, 82, 42),
    border: Color::Rgb(210, 202, 187),
    status: Color::Rgb(77, 124, 70),
    error: Color::Rgb(178, 52, 57),
    highlight_fg: Color::Rgb(246, 242, 233),
    highlight_bg: Color::Rgb(175, 82, 42),
    stripe_bg: Color::Rgb(238, 232, 220),
    key_fg: Color::Rgb(246, 242, 233),
    key_bg: Color::Rgb(140, 134, 122),
  },
  Theme {
    name: "noir",
    bg: Color::Rgb(12, 12, 12),
    fg: Color::Rgb(220, 220, 220),
    muted: Color::Rgb(128, 128, 128),
    accent: Color::Rgb(255, 255, 255),
    border: Color::Rgb(64, 64, 64),
    status: Color::Rgb(190, 190, 190),
    error: Color::Rgb(255, 95, 95),
    highlight_fg: Color::Rgb(12, 12, 12),
    highlight_bg: Color::Rgb(220, 220, 220),
    stripe_bg: Color::Rgb(20, 20, 20),
    key_fg: Color::Rgb(12, 12, 12),
    key_bg: Color::Rgb(128, 128, 128),
  },
];
