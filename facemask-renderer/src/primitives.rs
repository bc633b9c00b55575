//! Primitive types for rendering

use serde::{Deserialize, Serialize};

/// RGBA color representation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red component (0.0 - 1.0)
    pub r: f32,
    /// Green component (0.0 - 1.0)
    pub g: f32,
    /// Blue component (0.0 - 1.0)
    pub b: f32,
    /// Alpha component (0.0 - 1.0)
    pub a: f32,
}

impl Color {
    /// Create a new color
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Convert to array format for GPU
    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Create from array format
    pub fn from_array(array: [f32; 4]) -> Self {
        Self {
            r: array[0],
            g: array[1],
            b: array[2],
            a: array[3],
        }
    }

    /// Whether every component lies in the 0.0 - 1.0 range
    pub fn is_normalized(&self) -> bool {
        self.to_array().iter().all(|c| (0.0..=1.0).contains(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_conversion() {
        let color = Color::new(0.0, 0.68, 0.37, 1.0);
        assert_eq!(Color::from_array(color.to_array()), color);
    }

    #[test]
    fn test_normalized_range() {
        assert!(Color::new(0.0, 0.5, 1.0, 1.0).is_normalized());
        assert!(!Color::new(1.5, 0.0, 0.0, 1.0).is_normalized());
    }
}
