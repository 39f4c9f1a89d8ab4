// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! WCAG 2.x color contrast checks for theme colors.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("color must start with '#': {0}")]
    MissingHash(String),

    #[error("color must have 3 or 6 hex digits: {0}")]
    BadLength(String),

    #[error("invalid hex digit in color: {0}")]
    BadDigit(String),
}

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Relative luminance in `[0, 1]`.
    pub fn relative_luminance(&self) -> f64 {
        fn channel(c: u8) -> f64 {
            let c = f64::from(c) / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * channel(self.r) + 0.7152 * channel(self.g) + 0.0722 * channel(self.b)
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(s.to_string()))?;

        let digits: Vec<u8> = hex
            .chars()
            .map(|c| {
                c.to_digit(16)
                    .map(|d| d as u8)
                    .ok_or_else(|| ColorParseError::BadDigit(s.to_string()))
            })
            .collect::<Result<_, _>>()?;

        match digits.as_slice() {
            [r, g, b] => Ok(Rgb::new(r * 17, g * 17, b * 17)),
            [r1, r2, g1, g2, b1, b2] => Ok(Rgb::new(r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2)),
            _ => Err(ColorParseError::BadLength(s.to_string())),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Contrast ratio between two colors, from 1 to 21.
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let la = a.relative_luminance();
    let lb = b.relative_luminance();
    let (light, dark) = if la >= lb { (la, lb) } else { (lb, la) };
    (light + 0.05) / (dark + 0.05)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    Normal,
    /// 18pt+, or 14pt+ bold
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WcagLevel {
    AA,
    AAA,
}

impl WcagLevel {
    pub fn required_ratio(self, size: TextSize) -> f64 {
        match (self, size) {
            (WcagLevel::AA, TextSize::Normal) => 4.5,
            (WcagLevel::AA, TextSize::Large) => 3.0,
            (WcagLevel::AAA, TextSize::Normal) => 7.0,
            (WcagLevel::AAA, TextSize::Large) => 4.5,
        }
    }
}

pub fn passes(foreground: Rgb, background: Rgb, level: WcagLevel, size: TextSize) -> bool {
    contrast_ratio(foreground, background) >= level.required_ratio(size)
}

/// One named foreground/background pair from a theme.
#[derive(Debug, Clone)]
pub struct ColorPair {
    pub name: String,
    pub foreground: Rgb,
    pub background: Rgb,
    pub size: TextSize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairReport {
    pub name: String,
    pub ratio: f64,
    pub passes_aa: bool,
    pub passes_aaa: bool,
}

/// Check every pair; failures are logged.
pub fn audit(pairs: &[ColorPair]) -> Vec<PairReport> {
    pairs
        .iter()
        .map(|pair| {
            let ratio = contrast_ratio(pair.foreground, pair.background);
            let report = PairReport {
                name: pair.name.clone(),
                ratio,
                passes_aa: ratio >= WcagLevel::AA.required_ratio(pair.size),
                passes_aaa: ratio >= WcagLevel::AAA.required_ratio(pair.size),
            };
            if !report.passes_aa {
                tracing::warn!(
                    pair = %pair.name,
                    foreground = %pair.foreground,
                    background = %pair.background,
                    ratio,
                    "Color pair fails WCAG AA"
                );
            }
            report
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgb = Rgb::new(0, 0, 0);
    const WHITE: Rgb = Rgb::new(255, 255, 255);

    #[test]
    fn test_parse_short_and_long_forms() {
        assert_eq!("#fff".parse::<Rgb>().unwrap(), WHITE);
        assert_eq!("#1A2b3C".parse::<Rgb>().unwrap(), Rgb::new(0x1a, 0x2b, 0x3c));
        assert_eq!(Rgb::new(0x1a, 0x2b, 0x3c).to_string(), "#1a2b3c");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!("fff".parse::<Rgb>(), Err(ColorParseError::MissingHash(_))));
        assert!(matches!("#ffff".parse::<Rgb>(), Err(ColorParseError::BadLength(_))));
        assert!(matches!("#ggg".parse::<Rgb>(), Err(ColorParseError::BadDigit(_))));
    }

    #[test]
    fn test_ratio_extremes() {
        assert!((contrast_ratio(BLACK, WHITE) - 21.0).abs() < 1e-9);
        assert!((contrast_ratio(WHITE, BLACK) - 21.0).abs() < 1e-9);
        assert!((contrast_ratio(WHITE, WHITE) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_thresholds() {
        // #767676 on white is the classic AA-normal boundary (~4.54).
        let grey: Rgb = "#767676".parse().unwrap();
        assert!(passes(grey, WHITE, WcagLevel::AA, TextSize::Normal));
        assert!(!passes(grey, WHITE, WcagLevel::AAA, TextSize::Normal));
        assert!(passes(grey, WHITE, WcagLevel::AAA, TextSize::Large));
    }

    #[test]
    fn test_audit_flags_failures() {
        let pairs = vec![
            ColorPair {
                name: "body".to_string(),
                foreground: BLACK,
                background: WHITE,
                size: TextSize::Normal,
            },
            ColorPair {
                name: "muted".to_string(),
                foreground: "#aaaaaa".parse().unwrap(),
                background: WHITE,
                size: TextSize::Normal,
            },
        ];
        let reports = audit(&pairs);
        assert!(reports[0].passes_aa && reports[0].passes_aaa);
        assert!(!reports[1].passes_aa);
    }
}
