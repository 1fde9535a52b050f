//! Hex color parsing and the perceptual checks behind theme sanitization.

/// HSL triple: hue in degrees, saturation and lightness in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

/// Parses `#RGB` or `#RRGGBB` (case-insensitive, leading `#` optional).
pub fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim().trim_start_matches('#');
    match hex.len() {
        3 => {
            let mut chars = hex.chars();
            let r = chars.next()?.to_digit(16)? as u8;
            let g = chars.next()?.to_digit(16)? as u8;
            let b = chars.next()?.to_digit(16)? as u8;
            Some((r * 17, g * 17, b * 17))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some((r, g, b))
        }
        _ => None,
    }
}

pub fn to_hsl(color: &str) -> Option<Hsl> {
    let (r, g, b) = parse_hex(color)?;
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let lightness = (max + min) / 2.0;

    if delta < f64::EPSILON {
        return Some(Hsl {
            hue: 0.0,
            saturation: 0.0,
            lightness,
        });
    }

    let saturation = if lightness > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };

    let hue = if (max - r).abs() < f64::EPSILON {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if (max - g).abs() < f64::EPSILON {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    Some(Hsl {
        hue: hue.rem_euclid(360.0),
        saturation,
        lightness,
    })
}

/// Circular hue distance in degrees.
pub fn hue_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).abs() % 360.0;
    d.min(360.0 - d)
}

/// Colors light enough to vanish against a white widget background.
pub fn is_near_white(color: &str) -> bool {
    to_hsl(color).is_some_and(|hsl| hsl.lightness > 0.92)
}

/// Two palette entries count as distinguishable when they differ enough in
/// hue, or failing that, in lightness.
pub fn distinguishable(a: &str, b: &str) -> bool {
    let (Some(a), Some(b)) = (to_hsl(a), to_hsl(b)) else {
        return false;
    };
    hue_distance(a.hue, b.hue) >= 25.0 || (a.lightness - b.lightness).abs() >= 0.15
}
