use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidBoundingBox {
    #[error("bounding box {field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("bounding box {field} must be non-negative, got {value}")]
    NegativeExtent { field: &'static str, value: f64 },
}

/// Axis-aligned face rectangle in image-pixel coordinates.
///
/// `left`/`top` may be negative when a face is clipped by the frame edge;
/// `width`/`height` are always finite and non-negative.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl BoundingBox {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Result<Self, InvalidBoundingBox> {
        for (field, value) in [
            ("left", left),
            ("top", top),
            ("width", width),
            ("height", height),
        ] {
            if !value.is_finite() {
                return Err(InvalidBoundingBox::NonFinite { field, value });
            }
        }
        if width < 0.0 {
            return Err(InvalidBoundingBox::NegativeExtent {
                field: "width",
                value: width,
            });
        }
        if height < 0.0 {
            return Err(InvalidBoundingBox::NegativeExtent {
                field: "height",
                value: height,
            });
        }
        Ok(Self {
            left,
            top,
            width,
            height,
        })
    }

    /// Builds a box from corner coordinates `(x1, y1, x2, y2)`.
    ///
    /// Inverted corners collapse to a zero extent rather than failing.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, InvalidBoundingBox> {
        Self::new(x1, y1, (x2 - x1).max(0.0), (y2 - y1).max(0.0))
    }

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn top(&self) -> f64 {
        self.top
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Scales width and height by `factor`, keeping the top-left corner.
    pub fn scaled(&self, factor: f64) -> Result<Self, InvalidBoundingBox> {
        Self::new(
            self.left,
            self.top,
            self.width * factor,
            self.height * factor,
        )
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Result<Self, InvalidBoundingBox> {
        Self::new(self.left + dx, self.top + dy, self.width, self.height)
    }
}
