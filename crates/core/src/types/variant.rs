//! Item variant vocabularies: colors and sizes.
//!
//! Both are closed sets. The catalog filter rejects unknown values instead of
//! silently matching nothing, so parsing lives here next to the enums.

use serde::{Deserialize, Serialize};

/// Error returned for an unknown color or size code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VariantParseError {
    /// Not one of the [`Color`] codes.
    #[error("unknown color: {0}")]
    Color(String),
    /// Not one of the [`ItemSize`] codes.
    #[error("unknown size: {0}")]
    Size(String),
}

/// Apparel color palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.color", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Color {
    Black,
    White,
    Gray,
    Ivory,
    Red,
    Pink,
    Orange,
    Yellow,
    Green,
    Khaki,
    Blue,
    Navy,
    Purple,
    Brown,
    Beige,
}

impl Color {
    /// Every color, in palette order.
    pub const ALL: [Self; 15] = [
        Self::Black,
        Self::White,
        Self::Gray,
        Self::Ivory,
        Self::Red,
        Self::Pink,
        Self::Orange,
        Self::Yellow,
        Self::Green,
        Self::Khaki,
        Self::Blue,
        Self::Navy,
        Self::Purple,
        Self::Brown,
        Self::Beige,
    ];

    /// Stored/wire code of the color.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Black => "BLACK",
            Self::White => "WHITE",
            Self::Gray => "GRAY",
            Self::Ivory => "IVORY",
            Self::Red => "RED",
            Self::Pink => "PINK",
            Self::Orange => "ORANGE",
            Self::Yellow => "YELLOW",
            Self::Green => "GREEN",
            Self::Khaki => "KHAKI",
            Self::Blue => "BLUE",
            Self::Navy => "NAVY",
            Self::Purple => "PURPLE",
            Self::Brown => "BROWN",
            Self::Beige => "BEIGE",
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Color {
    type Err = VariantParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == code)
            .ok_or_else(|| VariantParseError::Color(s.to_owned()))
    }
}

/// Garment size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.size", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemSize {
    Xs,
    S,
    M,
    L,
    Xl,
    Xxl,
    Free,
}

impl ItemSize {
    /// Every size, smallest first.
    pub const ALL: [Self; 7] = [
        Self::Xs,
        Self::S,
        Self::M,
        Self::L,
        Self::Xl,
        Self::Xxl,
        Self::Free,
    ];

    /// Stored/wire code of the size.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Xs => "XS",
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
            Self::Xl => "XL",
            Self::Xxl => "XXL",
            Self::Free => "FREE",
        }
    }
}

impl std::fmt::Display for ItemSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemSize {
    type Err = VariantParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|size| size.as_str() == code)
            .ok_or_else(|| VariantParseError::Size(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse() {
        assert_eq!("red".parse::<Color>().unwrap(), Color::Red);
        assert_eq!(" NAVY ".parse::<Color>().unwrap(), Color::Navy);
        assert_eq!(
            "TEAL".parse::<Color>(),
            Err(VariantParseError::Color("TEAL".to_owned()))
        );
    }

    #[test]
    fn test_size_parse() {
        assert_eq!("xl".parse::<ItemSize>().unwrap(), ItemSize::Xl);
        assert_eq!("FREE".parse::<ItemSize>().unwrap(), ItemSize::Free);
        assert!("XXXL".parse::<ItemSize>().is_err());
    }

    #[test]
    fn test_serde_codes_match_as_str() {
        for color in Color::ALL {
            let json = serde_json::to_string(&color).unwrap();
            assert_eq!(json, format!("\"{}\"", color.as_str()));
        }
        for size in ItemSize::ALL {
            let json = serde_json::to_string(&size).unwrap();
            assert_eq!(json, format!("\"{}\"", size.as_str()));
        }
    }
}
