use super::color::Color;
use super::light::Light;
use crate::rig::{split_key, BindingError, Consumer, Output, Param};
use crate::timer::Timer;
use crate::wiring::DeviceError;
use std::f32::consts::PI;

/// Shortest period a consumer can set, in seconds
const MIN_PERIOD: f32 = 1e-3;

fn period_param(seconds: f32) -> Param {
    Param::new(seconds.max(MIN_PERIOD))
}

fn period_consumer(period: &Param) -> Consumer {
    period.consumer_with(|v| v.max(MIN_PERIOD))
}

/// Colour split into per-channel parameters so consumers can bind each one
#[derive(Debug, Clone)]
struct ColorParams {
    r: Param,
    g: Param,
    b: Param,
}

impl ColorParams {
    fn new(color: Color) -> Self {
        Self {
            r: Param::new(color.r),
            g: Param::new(color.g),
            b: Param::new(color.b),
        }
    }

    fn get(&self) -> Color {
        Color::new(self.r.get(), self.g.get(), self.b.get())
    }

    fn take_dirty(&self) -> bool {
        // Non-short-circuiting so every flag is cleared
        self.r.take_dirty() | self.g.take_dirty() | self.b.take_dirty()
    }

    fn consumer(&self, kind: &'static str, channel: Option<&str>) -> Result<Consumer, BindingError> {
        match channel {
            None => {
                let params = self.clone();
                Ok(Box::new(move |value| {
                    params.r.set(value);
                    params.g.set(value);
                    params.b.set(value);
                }))
            }
            Some("r") => Ok(self.r.consumer()),
            Some("g") => Ok(self.g.consumer()),
            Some("b") => Ok(self.b.consumer()),
            Some(other) => Err(BindingError::UnknownComponent {
                kind,
                control: "color".to_string(),
                component: other.to_string(),
            }),
        }
    }
}

fn unknown(kind: &'static str, key: &str) -> BindingError {
    BindingError::UnknownControl {
        kind,
        key: key.to_string(),
    }
}

fn no_component(kind: &'static str, control: String) -> BindingError {
    BindingError::UnexpectedComponent { kind, control }
}

/// Constant colour; writes only when a parameter changed
pub struct SolidLight {
    light: Light,
    color: ColorParams,
    brightness: Param,
}

impl SolidLight {
    const KIND: &'static str = "solid light";

    pub fn new(light: Light, color: Color, brightness: f32) -> Self {
        Self {
            light,
            color: ColorParams::new(color),
            brightness: Param::new(brightness),
        }
    }

    pub fn light(&self) -> &Light {
        &self.light
    }
}

impl Output for SolidLight {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn consumer(&self, key: &str) -> Result<Consumer, BindingError> {
        match split_key(key) {
            (control, channel) if control == "color" => {
                self.color.consumer(Self::KIND, channel.as_deref())
            }
            (control, None) if control == "brightness" => Ok(self.brightness.consumer()),
            (control, Some(_)) if control == "brightness" => Err(no_component(Self::KIND, control)),
            _ => Err(unknown(Self::KIND, key)),
        }
    }

    fn step(&mut self) -> Result<(), DeviceError> {
        let changed = self.color.take_dirty() | self.brightness.take_dirty();
        if !changed {
            return Ok(());
        }
        self.light
            .set_color(self.color.get() * self.brightness.get())
    }
}

/// Walks the hue circle once per period
pub struct LightCycle {
    light: Light,
    brightness: Param,
    period: Param,
    timer: Timer,
}

impl LightCycle {
    const KIND: &'static str = "light cycle";

    pub fn new(light: Light, brightness: f32, period: f32) -> Self {
        Self {
            light,
            brightness: Param::new(brightness),
            period: period_param(period),
            timer: Timer::started(),
        }
    }

    pub fn light(&self) -> &Light {
        &self.light
    }
}

impl Output for LightCycle {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn consumer(&self, key: &str) -> Result<Consumer, BindingError> {
        match split_key(key) {
            (control, None) if control == "brightness" => Ok(self.brightness.consumer()),
            (control, None) if control == "period" => Ok(period_consumer(&self.period)),
            (control, Some(_)) if control == "brightness" || control == "period" => {
                Err(no_component(Self::KIND, control))
            }
            _ => Err(unknown(Self::KIND, key)),
        }
    }

    fn step(&mut self) -> Result<(), DeviceError> {
        let mut hue = self.timer.elapsed() * 360.0 / self.period.get();
        if hue > 360.0 {
            self.timer.reset();
            hue = 360.0;
        }
        self.light
            .set_color(Color::from_hsv(hue, 1.0, self.brightness.get()))
    }
}

/// Fades the colour in and out along a sine wave
pub struct FlashingLight {
    light: Light,
    color: ColorParams,
    brightness: Param,
    period: Param,
    timer: Timer,
}

impl FlashingLight {
    const KIND: &'static str = "flashing light";

    pub fn new(light: Light, color: Color, brightness: f32, period: f32) -> Self {
        Self {
            light,
            color: ColorParams::new(color),
            brightness: Param::new(brightness),
            period: period_param(period),
            timer: Timer::started(),
        }
    }

    pub fn light(&self) -> &Light {
        &self.light
    }
}

impl Output for FlashingLight {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn consumer(&self, key: &str) -> Result<Consumer, BindingError> {
        match split_key(key) {
            (control, channel) if control == "color" => {
                self.color.consumer(Self::KIND, channel.as_deref())
            }
            (control, None) if control == "brightness" => Ok(self.brightness.consumer()),
            (control, None) if control == "period" => Ok(period_consumer(&self.period)),
            (control, Some(_)) if control == "brightness" || control == "period" => {
                Err(no_component(Self::KIND, control))
            }
            _ => Err(unknown(Self::KIND, key)),
        }
    }

    fn step(&mut self) -> Result<(), DeviceError> {
        let phase = 2.0 * PI * self.timer.elapsed() / self.period.get();
        let level = (phase.sin() + 1.0) / 2.0;
        self.light
            .set_color(self.color.get() * self.brightness.get() * level)
    }
}
