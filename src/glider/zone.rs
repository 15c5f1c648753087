//! Atmosphere models over a flat ground at sea level (`z = 0`).

use serde::Deserialize;

/// Constant horizontal wind.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FlatZone {
    /// Wind velocity along the x-axis of the Earth frame.
    pub wind_x: f64,
    /// Wind velocity along the y-axis of the Earth frame.
    pub wind_y: f64,
}

impl FlatZone {
    /// Wind velocity in the Earth frame.
    #[must_use]
    pub const fn wind(&self) -> [f64; 3] {
        [self.wind_x, self.wind_y, 0.0]
    }
}

/// Flat zone with a single stationary thermal: a bell-shaped updraft
/// centered at `(center_x, center_y)`.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ThermalZone {
    /// Horizontal wind along the x-axis.
    pub wind_x: f64,
    /// Horizontal wind along the y-axis.
    pub wind_y: f64,
    /// Position of the thermal core.
    pub center_x: f64,
    /// Position of the thermal core.
    pub center_y: f64,
    /// Distance from the center at which the updraft drops to `1/e` of its
    /// peak.
    pub radius: f64,
    /// Vertical wind velocity at the center.
    pub strength: f64,
}

impl Default for ThermalZone {
    fn default() -> Self {
        Self {
            wind_x: 0.0,
            wind_y: 0.0,
            center_x: 100.0,
            center_y: 0.0,
            radius: 50.0,
            strength: 3.0,
        }
    }
}

impl ThermalZone {
    /// Vertical wind velocity at `(x, y)`.
    #[must_use]
    pub fn updraft(&self, x: f64, y: f64) -> f64 {
        let r = (x - self.center_x).hypot(y - self.center_y) / self.radius;
        self.strength * (-r * r).exp()
    }
}

/// Wind field the glider flies through.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Zone {
    /// Horizontal wind only.
    Flat(FlatZone),
    /// Horizontal wind and one thermal.
    Thermal(ThermalZone),
}

impl Default for Zone {
    fn default() -> Self {
        Self::Flat(FlatZone::default())
    }
}

impl Zone {
    /// Wind vector `(wx, wy, wz)` at point `(x, y, z)` and time `t`. The
    /// vertical component points up.
    #[must_use]
    pub fn wind(&self, x: f64, y: f64, z: f64, _t: f64) -> [f64; 3] {
        match self {
            Self::Flat(zone) => zone.wind(),
            Self::Thermal(zone) => {
                let updraft = if z < 0.0 { 0.0 } else { zone.updraft(x, y) };
                [zone.wind_x, zone.wind_y, updraft]
            },
        }
    }
}
