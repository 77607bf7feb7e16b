//! Stateless `t -> colour` maps used to tell ensemble members apart.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };

    fn from_unit(r: f64, g: f64, b: f64) -> Self {
        Self::from_bytes(r * 255.0, g * 255.0, b * 255.0)
    }

    fn from_bytes(r: f64, g: f64, b: f64) -> Self {
        let channel = |c: f64| c.clamp(0.0, 255.0).round() as u8;
        Self {
            r: channel(r),
            g: channel(g),
            b: channel(b),
        }
    }
}

/// Full-spectrum hue wheel, red at both ends.
///
/// `t` is clamped to `[0, 1]` and slightly gamma-bent (`t^0.9`) so the
/// middle of the ensemble spreads over more of the spectrum.
pub fn rainbow(t: f64) -> Rgb {
    let t = t.clamp(0.0, 1.0).powf(0.9);

    let h = t * 6.0;
    let i = h.floor();
    let f = h - i;
    let q = 1.0 - f;

    let (r, g, b) = match (i as i64).rem_euclid(6) {
        0 => (1.0, f, 0.0),   // red -> yellow
        1 => (q, 1.0, 0.0),   // yellow -> green
        2 => (0.0, 1.0, f),   // green -> cyan
        3 => (0.0, q, 1.0),   // cyan -> blue
        4 => (f, 0.0, 1.0),   // blue -> magenta
        _ => (1.0, 0.0, q),   // magenta -> red
    };
    Rgb::from_unit(r, g, b)
}

/// Polynomial approximation of the Turbo colormap.
pub fn turbo(t: f64) -> Rgb {
    let t = t.clamp(0.0, 1.0);

    let r = 34.61
        + t * (1172.33 + t * (-10793.56 + t * (33300.12 + t * (-38394.49 + t * 14825.05))));
    let g = 23.31
        + t * (557.33 + t * (1225.33 + t * (-3574.96 + t * (2220.70 + t * (-414.13)))));
    let b = 27.20
        + t * (3211.10 + t * (-15327.97 + t * (27814.00 + t * (-22569.18 + t * 6838.66))));

    Rgb::from_bytes(r, g, b)
}

/// Colour for an ensemble member at fraction `frac` in `[-1, 1]`.
pub fn ensemble_color(frac: f64) -> Rgb {
    rainbow((frac + 1.0) / 2.0)
}
