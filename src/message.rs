//! Message descriptor types produced by template evaluation
//!
//! A [`MessageDescriptor`] is the structured result the host renders into
//! its own message/embed/component format. Directive tags build it
//! incrementally during evaluation; once evaluation completes it is plain
//! immutable data.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Most action rows one message may carry
pub const MAX_ACTION_ROWS: usize = 5;

/// Most buttons one action row may carry
pub const MAX_BUTTONS_PER_ROW: usize = 5;

/// The structured output of one template evaluation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageDescriptor {
    /// Freestanding text: literal runs and pure-tag results in document order
    pub content: String,
    /// Embed title
    pub title: Option<String>,
    /// Embed description
    pub description: Option<String>,
    /// Embed accent color
    pub color: Option<Color>,
    /// Component rows in the order their tags appeared
    pub rows: Vec<ActionRow>,
}

impl MessageDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently opened action row, if any
    pub fn current_row_mut(&mut self) -> Option<&mut ActionRow> {
        self.rows.last_mut()
    }

    /// Total button count across all rows
    pub fn button_count(&self) -> usize {
        self.rows.iter().map(|row| row.buttons.len()).sum()
    }
}

/// An ordered row of buttons
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionRow {
    pub buttons: Vec<Button>,
}

/// A single button component
#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    /// Custom id the host receives back on interaction
    pub id: String,
    pub label: String,
    pub style: ButtonStyle,
    pub emoji: Option<String>,
}

/// Visual style of a button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
    Link,
}

/// Unparseable button style string
#[derive(Debug, Clone, Error)]
#[error("unknown button style: `{0}`")]
pub struct InvalidButtonStyle(String);

impl FromStr for ButtonStyle {
    type Err = InvalidButtonStyle;

    /// Accepts style names case-insensitively, or the numeric codes 1-5
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "primary" | "1" => Ok(ButtonStyle::Primary),
            "secondary" | "2" => Ok(ButtonStyle::Secondary),
            "success" | "3" => Ok(ButtonStyle::Success),
            "danger" | "4" => Ok(ButtonStyle::Danger),
            "link" | "5" => Ok(ButtonStyle::Link),
            _ => Err(InvalidButtonStyle(s.to_string())),
        }
    }
}

/// 24-bit RGB color parsed from hex notation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u32);

/// Unparseable color string
#[derive(Debug, Clone, Error)]
#[error("invalid hex color: `{0}`")]
pub struct InvalidColor(String);

impl FromStr for Color {
    type Err = InvalidColor;

    /// Accepts 6-digit or 3-digit hex, with or without a leading `#`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        let expanded = match digits.len() {
            6 => digits.to_string(),
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            _ => return Err(InvalidColor(s.to_string())),
        };
        u32::from_str_radix(&expanded, 16)
            .map(Color)
            .map_err(|_| InvalidColor(s.to_string()))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}
