use std::fmt;
use std::ops::{Add, Mul};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const RED: Color = Color::new(1.0, 0.0, 0.0);
    pub const YELLOW: Color = Color::new(1.0, 1.0, 0.0);
    pub const GREEN: Color = Color::new(0.0, 1.0, 0.0);
    pub const CYAN: Color = Color::new(0.0, 1.0, 1.0);
    pub const BLUE: Color = Color::new(0.0, 0.0, 1.0);
    pub const MAGENTA: Color = Color::new(1.0, 0.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Same value on every channel
    pub const fn splat(value: f32) -> Self {
        Self::new(value, value, value)
    }

    pub fn channels(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Hue in degrees (taken modulo 360), saturation and value in [0, 1]
    pub fn from_hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let hue = hue.rem_euclid(360.0);
        let saturation = saturation.clamp(0.0, 1.0);
        let value = value.clamp(0.0, 1.0);

        let chroma = value * saturation;
        let temp = chroma * (1.0 - ((hue / 60.0) % 2.0 - 1.0).abs());
        let offset = value - chroma;

        let base = match (hue / 60.0) as u32 {
            0 => Color::new(chroma, temp, 0.0),
            1 => Color::new(temp, chroma, 0.0),
            2 => Color::new(0.0, chroma, temp),
            3 => Color::new(0.0, temp, chroma),
            4 => Color::new(temp, 0.0, chroma),
            _ => Color::new(chroma, 0.0, temp),
        };
        base + offset
    }
}

impl Mul<f32> for Color {
    type Output = Color;

    fn mul(self, rhs: f32) -> Color {
        Color::new(self.r * rhs, self.g * rhs, self.b * rhs)
    }
}

impl Add<f32> for Color {
    type Output = Color;

    fn add(self, rhs: f32) -> Color {
        Color::new(self.r + rhs, self.g + rhs, self.b + rhs)
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(Color::RED),
            "yellow" => Ok(Color::YELLOW),
            "green" => Ok(Color::GREEN),
            "cyan" => Ok(Color::CYAN),
            "blue" => Ok(Color::BLUE),
            "magenta" => Ok(Color::MAGENTA),
            "black" => Ok(Color::BLACK),
            "white" => Ok(Color::WHITE),
            _ => Err(format!("color does not exist: {}", s)),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}, {}}}", self.r, self.g, self.b)
    }
}
