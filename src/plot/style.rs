use std::collections::BTreeMap;

// Adjacent entries must contrast, do not sort.
pub const PLOT_COLORS: &[&str] = &[
    "r",
    "g",
    "b",
    "c",
    "m",
    "goldenrod",
    "lime",
    "orange",
    "blueviolet",
    "brown",
    "teal",
    "olive",
    "lightcoral",
    "cornflowerblue",
    "forestgreen",
    "salmon",
];

pub const PLOT_SYMBOLS: &[&str] = &["o", "+", "x", "*", "s", "d", "^", "v"];

pub const FIT_COLOR: &str = "r";
pub const CURSOR_COLORS: [&str; 2] = ["r", "b"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Resolve one of the palette names (or a `#rrggbb` string). Unknown names are gray.
    pub fn from_name(name: &str) -> Self {
        match name {
            "r" | "red" => Self::new(255, 0, 0),
            "g" | "green" => Self::new(0, 128, 0),
            "b" | "blue" => Self::new(0, 0, 255),
            "c" | "cyan" => Self::new(0, 191, 191),
            "m" | "magenta" => Self::new(191, 0, 191),
            "k" | "black" => Self::new(0, 0, 0),
            "goldenrod" => Self::new(218, 165, 32),
            "lime" => Self::new(0, 255, 0),
            "orange" => Self::new(255, 165, 0),
            "blueviolet" => Self::new(138, 43, 226),
            "brown" => Self::new(165, 42, 42),
            "teal" => Self::new(0, 128, 128),
            "olive" => Self::new(128, 128, 0),
            "lightcoral" => Self::new(240, 128, 128),
            "cornflowerblue" => Self::new(100, 149, 237),
            "forestgreen" => Self::new(34, 139, 34),
            "salmon" => Self::new(250, 128, 114),
            hex if hex.len() == 7 && hex.is_ascii() && hex.starts_with('#') => {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(128);
                Self::new(channel(1), channel(3), channel(5))
            }
            _ => Self::new(128, 128, 128),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
pub enum LineKind {
    #[default]
    Solid,
    Dashed,
    /// Markers only.
    None,
}

/// How a curve (or overlay) is drawn. Opaque to the registries.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CurveStyle {
    pub color: String,
    pub marker: Option<String>,
    pub line: LineKind,
    pub width: f32,
    /// Higher values are drawn on top.
    pub z_order: i32,
    /// Free-form keyword options passed through to the render surface.
    pub extra: BTreeMap<String, String>,
}

impl Default for CurveStyle {
    fn default() -> Self {
        Self {
            color: PLOT_COLORS[0].to_owned(),
            marker: None,
            line: LineKind::Solid,
            width: 1.5,
            z_order: 0,
            extra: BTreeMap::new(),
        }
    }
}

impl CurveStyle {
    pub fn data(color: &str, marker: &str) -> Self {
        Self {
            color: color.to_owned(),
            marker: Some(marker.to_owned()),
            ..Default::default()
        }
    }

    /// Dashed overlay drawn above every data curve.
    pub fn fit_overlay() -> Self {
        Self {
            color: FIT_COLOR.to_owned(),
            marker: None,
            line: LineKind::Dashed,
            width: 2.0,
            z_order: 10,
            extra: BTreeMap::new(),
        }
    }

    pub fn cursor(color: &str) -> Self {
        Self {
            color: color.to_owned(),
            marker: Some("+".to_owned()),
            line: LineKind::None,
            width: 2.0,
            z_order: 20,
            extra: BTreeMap::new(),
        }
    }

    pub fn rgb(&self) -> Rgb {
        Rgb::from_name(&self.color)
    }
}

/// Hands out palette colors and marker symbols in a repeating sequence.
#[derive(Debug, Clone, Default)]
pub struct StyleCycle {
    color: usize,
    symbol: usize,
}

impl StyleCycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_color(&mut self) -> &'static str {
        let color = PLOT_COLORS[self.color % PLOT_COLORS.len()];
        self.color = (self.color + 1) % PLOT_COLORS.len();
        color
    }

    pub fn next_symbol(&mut self) -> &'static str {
        let symbol = PLOT_SYMBOLS[self.symbol % PLOT_SYMBOLS.len()];
        self.symbol = (self.symbol + 1) % PLOT_SYMBOLS.len();
        symbol
    }

    pub fn next_style(&mut self) -> CurveStyle {
        let color = self.next_color();
        let symbol = self.next_symbol();
        CurveStyle::data(color, symbol)
    }
}
