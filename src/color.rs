//! Color string helpers
//!
//! Colors travel through the public API as strings, either a name such as
//! `"red"` or a hex form such as `"#ff0000"`, and as packed `0xRRGGBB`
//! integers internally. Unparseable input yields `None` rather than an error.

/// Named colors and their packed RGB values.
const NAMED_COLORS: &[(&str, u32)] = &[
    ("black", 0x000000),
    ("blue", 0x0000FF),
    ("brown", 0x926239),
    ("cyan", 0x00FFFF),
    ("darkgray", 0x595959),
    ("gray", 0x999999),
    ("green", 0x00FF00),
    ("lightgray", 0xBFBFBF),
    ("magenta", 0xFF00FF),
    ("orange", 0xFFC800),
    ("pink", 0xFFAFAF),
    ("purple", 0xFF00FF),
    ("red", 0xFF0000),
    ("white", 0xFFFFFF),
    ("yellow", 0xFFFF00),
];

pub const WHITE: u32 = 0xFFFFFF;

/// Parse a color name or hex string into packed RGB.
///
/// Accepts `#rrggbb`, `0xrrggbb` and `#aarrggbb` (alpha is discarded).
/// Names ignore case, spaces and underscores, so `"Dark Gray"` works.
pub fn parse(color: &str) -> Option<u32> {
    let trimmed = color.trim();
    if trimmed.is_empty() {
        return None;
    }

    let hex = trimmed
        .strip_prefix('#')
        .or_else(|| trimmed.strip_prefix("0x"))
        .or_else(|| trimmed.strip_prefix("0X"));
    if let Some(hex) = hex {
        // `from_str_radix` would accept a leading sign.
        let digits_only = hex.bytes().all(|b| b.is_ascii_hexdigit());
        if !(hex.len() == 6 || hex.len() == 8) || !digits_only {
            return None;
        }
        return u32::from_str_radix(hex, 16).ok().map(|v| v & 0xFFFFFF);
    }

    let normalized: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == normalized)
        .map(|(_, rgb)| *rgb)
}

/// Format packed RGB as `#rrggbb`.
pub fn rgb_to_string(rgb: u32) -> String {
    format!("#{:06x}", rgb & 0xFFFFFF)
}

/// Normalize any accepted color string to `#rrggbb`, or `""` if invalid.
pub fn normalize(color: &str) -> String {
    parse(color).map(rgb_to_string).unwrap_or_default()
}

pub fn split_rgb(rgb: u32) -> (u8, u8, u8) {
    (
        ((rgb >> 16) & 0xFF) as u8,
        ((rgb >> 8) & 0xFF) as u8,
        (rgb & 0xFF) as u8,
    )
}

pub fn from_components(r: u8, g: u8, b: u8) -> u32 {
    (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// The name of a color if it has one, e.g. `0xFF0000 -> "red"`.
pub fn name_of(rgb: u32) -> Option<&'static str> {
    NAMED_COLORS
        .iter()
        .find(|(_, value)| *value == rgb & 0xFFFFFF)
        .map(|(name, _)| *name)
}
