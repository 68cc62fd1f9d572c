//! Region-of-interest geometry for annotations.
//!
//! Regions are expressed in normalized image coordinates: both axes run
//! from 0.0 (top/left) to 1.0 (bottom/right), so a region is independent
//! of the rendered image resolution. The backend stores the same JSON
//! shape in the annotation row's `region` column.
//!
//! CLI syntax:
//! - `rect:X,Y,W,H` - axis-aligned rectangle (origin + extent)
//! - `poly:X1,Y1;X2,Y2;X3,Y3[;...]` - closed polygon, three or more vertices

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SkymarkError;

static RECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rect:([^,]+),([^,]+),([^,]+),([^,]+)$")
        .unwrap_or_else(|e| panic!("Invalid rect regex: {e}"))
});

static POLY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^poly:(.+)$").unwrap_or_else(|e| panic!("Invalid poly regex: {e}"))
});

/// A single vertex in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A labeled region of interest on an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Region {
    /// Axis-aligned rectangle: origin plus extent.
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Closed polygon with at least three vertices.
    Polygon { points: Vec<Point> },
}

impl Region {
    /// Parse a region from its CLI syntax.
    ///
    /// # Errors
    ///
    /// Returns `SkymarkError::Invalid` if the syntax is unrecognized or the
    /// geometry fails validation.
    pub fn parse(input: &str) -> Result<Self, SkymarkError> {
        let input = input.trim();

        if let Some(caps) = RECT_RE.captures(input) {
            let x = parse_coord(&caps[1])?;
            let y = parse_coord(&caps[2])?;
            let width = parse_coord(&caps[3])?;
            let height = parse_coord(&caps[4])?;
            let region = Self::Rect {
                x,
                y,
                width,
                height,
            };
            region.validate()?;
            return Ok(region);
        }

        if let Some(caps) = POLY_RE.captures(input) {
            let mut points = Vec::new();
            for pair in caps[1].split(';') {
                let mut coords = pair.split(',');
                let (Some(x), Some(y), None) = (coords.next(), coords.next(), coords.next())
                else {
                    return Err(SkymarkError::Invalid(format!(
                        "polygon vertex '{pair}' must be 'x,y'"
                    )));
                };
                points.push(Point {
                    x: parse_coord(x)?,
                    y: parse_coord(y)?,
                });
            }
            let region = Self::Polygon { points };
            region.validate()?;
            return Ok(region);
        }

        Err(SkymarkError::Invalid(format!(
            "unrecognized region '{input}' (expected rect:x,y,w,h or poly:x1,y1;x2,y2;...)"
        )))
    }

    /// Validate that the geometry lies within the normalized image bounds.
    ///
    /// # Errors
    ///
    /// Returns `SkymarkError::Invalid` describing the first violation found.
    pub fn validate(&self) -> Result<(), SkymarkError> {
        match self {
            Self::Rect {
                x,
                y,
                width,
                height,
            } => {
                if *width <= 0.0 || *height <= 0.0 {
                    return Err(SkymarkError::Invalid(
                        "rectangle extent must be positive".to_string(),
                    ));
                }
                for (name, v) in [
                    ("x", *x),
                    ("y", *y),
                    ("x+width", x + width),
                    ("y+height", y + height),
                ] {
                    if !(0.0..=1.0).contains(&v) {
                        return Err(SkymarkError::Invalid(format!(
                            "rectangle {name} = {v} is outside [0, 1]"
                        )));
                    }
                }
                Ok(())
            }
            Self::Polygon { points } => {
                if points.len() < 3 {
                    return Err(SkymarkError::Invalid(
                        "polygon needs at least three vertices".to_string(),
                    ));
                }
                for p in points {
                    if !(0.0..=1.0).contains(&p.x) || !(0.0..=1.0).contains(&p.y) {
                        return Err(SkymarkError::Invalid(format!(
                            "polygon vertex ({}, {}) is outside [0, 1]",
                            p.x, p.y
                        )));
                    }
                }
                Ok(())
            }
        }
    }

    /// Short human-readable summary, e.g. `rect 0.10,0.20 0.30x0.40`.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Rect {
                x,
                y,
                width,
                height,
            } => format!("rect {x:.2},{y:.2} {width:.2}x{height:.2}"),
            Self::Polygon { points } => format!("poly ({} vertices)", points.len()),
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rect {
                x,
                y,
                width,
                height,
            } => write!(f, "rect:{x},{y},{width},{height}"),
            Self::Polygon { points } => {
                let body = points
                    .iter()
                    .map(|p| format!("{},{}", p.x, p.y))
                    .collect::<Vec<_>>()
                    .join(";");
                write!(f, "poly:{body}")
            }
        }
    }
}

impl std::str::FromStr for Region {
    type Err = SkymarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_coord(s: &str) -> Result<f64, SkymarkError> {
    let v: f64 = s
        .trim()
        .parse()
        .map_err(|_| SkymarkError::Invalid(format!("'{s}' is not a number")))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(SkymarkError::Invalid(format!("'{s}' is not finite")))
    }
}
