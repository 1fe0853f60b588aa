use crate::color::{RgbaColor, hex_to_rgba};
use crate::error::ColorParseError;

/// Ordered list of unique colors with an optional selection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Palette {
    colors: Vec<RgbaColor>,
    selected: Option<usize>,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a palette from hex strings, de-duplicating and selecting the first color.
    pub fn from_hex<S: AsRef<str>>(hexes: &[S]) -> Result<Self, ColorParseError> {
        let mut palette = Self::new();
        for hex in hexes {
            palette.add(hex_to_rgba(hex.as_ref())?);
        }
        if !palette.colors.is_empty() {
            palette.selected = Some(0);
        }
        Ok(palette)
    }

    pub fn colors(&self) -> &[RgbaColor] {
        &self.colors
    }

    pub fn hex_colors(&self) -> Vec<String> {
        self.colors.iter().map(|c| c.to_hex()).collect()
    }

    /// The color tools paint with, if any
    pub fn selected_color(&self) -> Option<RgbaColor> {
        self.selected.and_then(|i| self.colors.get(i).copied())
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Adds a color unless an entry with the same hex already exists. Returns its index.
    pub fn add(&mut self, color: RgbaColor) -> usize {
        match self.colors.iter().position(|c| c.to_hex() == color.to_hex()) {
            Some(index) => index,
            None => {
                self.colors.push(color);
                self.colors.len() - 1
            }
        }
    }

    pub fn select(&mut self, index: usize) -> bool {
        if index < self.colors.len() {
            self.selected = Some(index);
            true
        } else {
            false
        }
    }

    /// Adds the color if needed and selects it.
    pub fn add_and_select(&mut self, color: RgbaColor) -> usize {
        let index = self.add(color);
        self.selected = Some(index);
        index
    }

    pub fn select_hex(&mut self, hex: &str) -> Result<bool, ColorParseError> {
        let color = hex_to_rgba(hex)?;
        Ok(match self.colors.iter().position(|c| *c == color) {
            Some(index) => self.select(index),
            None => false,
        })
    }

    pub fn remove(&mut self, index: usize) -> Option<RgbaColor> {
        if index >= self.colors.len() {
            return None;
        }
        let removed = self.colors.remove(index);
        self.selected = match self.selected {
            Some(s) if s == index => None,
            Some(s) if s > index => Some(s - 1),
            other => other,
        };
        Some(removed)
    }
}
