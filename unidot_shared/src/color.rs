use std::fmt;

use serde::{Deserialize, Serialize};

/// Color with four float channels as Unity stores them in `m_Colors`.
///
/// The channels are nominally in `[0, 1]` but HDR colors (e.g. emission) exceed
/// that range, so nothing is clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Returns the channels in RGBA order.
    pub fn to_array(self) -> [f64; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Opaque white
impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f64; 4]> for Rgba {
    fn from([r, g, b, a]: [f64; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_opaque_white() {
        assert_eq!(Rgba::default(), Rgba::WHITE);
        assert_eq!(Rgba::default().to_array(), [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn from_array() {
        let color = Rgba::from([0.1, 0.2, 0.3, 0.4]);
        assert_eq!(color, Rgba::new(0.1, 0.2, 0.3, 0.4));
    }
}
