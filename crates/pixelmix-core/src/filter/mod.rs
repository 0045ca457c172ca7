//! Single-image filters.
//!
//! A [`FilterRequest`] names a filter from the closed catalog and carries
//! loosely typed parameters. [`Filter::from_request`] validates it once
//! against the catalog and produces a [`Filter`] with typed fields; from
//! then on the engine only sees well-formed values.
//!
//! # Modules
//!
//! - `catalog` - Filter names and parameter schemas
//! - `params` - Requests and parameter validation
//! - `kernel` - Border indexing and separable correlation
//! - `smooth` - Box, Gaussian, median, bilateral and identity-kernel filters
//! - `morph` - Dilation and erosion
//! - `edge` - Sobel, Scharr and Laplacian

mod catalog;
mod edge;
mod kernel;
mod morph;
mod params;
mod smooth;

pub use catalog::{filter_catalog, Coercion, FilterKind, FilterSpec, ParamKind, ParameterSpec, FILTER_CATALOG};
pub use params::{FilterRequest, ParamValue};

use log::debug;

use crate::error::{Result, TransformError};
use crate::scope::{MatId, Scope};

/// Width and height of a rectangular kernel or structuring element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelSize {
    pub width: u32,
    pub height: u32,
}

impl KernelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A validated filter with typed parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Filter {
    NoFilter,
    Bilateral {
        diameter: i32,
        sigma_color: f64,
        sigma_space: f64,
    },
    Blur {
        ksize: KernelSize,
    },
    BoxFilter {
        ksize: KernelSize,
    },
    Dilate {
        ksize: KernelSize,
    },
    Erode {
        ksize: KernelSize,
    },
    GaussianBlur {
        ksize: KernelSize,
        sigma_x: f64,
        sigma_y: f64,
    },
    MedianBlur {
        ksize: u32,
    },
    Sobel {
        dx: u32,
        dy: u32,
        ksize: u32,
    },
    Scharr {
        dx: u32,
        dy: u32,
    },
    SepFilter2D {
        kernel_x: u32,
        kernel_y: u32,
    },
    Laplacian {
        ksize: u32,
    },
}

impl Filter {
    /// Validate a request against the catalog and convert it.
    ///
    /// # Errors
    ///
    /// - `TransformError::UnsupportedFilter` if the name is not in the catalog
    /// - `TransformError::InvalidParameter` if a parameter is unknown, of the
    ///   wrong type or outside its domain, or if a derivative filter is asked
    ///   for an invalid combination of orders
    pub fn from_request(request: &FilterRequest) -> Result<Self> {
        let kind: FilterKind = request.filter_name.parse()?;
        let p = params::resolve(kind.spec(), &request.parameters)?;
        let ksize_xy = || -> Result<KernelSize> { Ok(KernelSize::new(p.count("ksizeX")?, p.count("ksizeY")?)) };

        let filter = match kind {
            FilterKind::NoFilter => Filter::NoFilter,
            FilterKind::Bilateral => Filter::Bilateral {
                diameter: p.count("d")? as i32,
                sigma_color: p.number("sigmaColor")?,
                sigma_space: p.number("sigmaSpace")?,
            },
            FilterKind::Blur => Filter::Blur { ksize: ksize_xy()? },
            FilterKind::BoxFilter => Filter::BoxFilter { ksize: ksize_xy()? },
            FilterKind::Dilate => Filter::Dilate { ksize: ksize_xy()? },
            FilterKind::Erode => Filter::Erode { ksize: ksize_xy()? },
            FilterKind::GaussianBlur => Filter::GaussianBlur {
                ksize: ksize_xy()?,
                sigma_x: p.number("sigmaX")?,
                sigma_y: p.number("sigmaY")?,
            },
            FilterKind::MedianBlur => Filter::MedianBlur {
                ksize: p.count("ksize")?,
            },
            FilterKind::Sobel => {
                let (dx, dy) = (p.count("dx")?, p.count("dy")?);
                if dx + dy == 0 {
                    return Err(TransformError::invalid_parameter(
                        "dx",
                        format!("{dx} (dy = {dy})"),
                        "Sobel needs dx + dy > 0",
                    ));
                }
                Filter::Sobel {
                    dx,
                    dy,
                    ksize: p.select_count("ksize")?,
                }
            }
            FilterKind::Scharr => {
                let (dx, dy) = (p.count("dx")?, p.count("dy")?);
                if dx + dy != 1 {
                    return Err(TransformError::invalid_parameter(
                        "dx",
                        format!("{dx} (dy = {dy})"),
                        "Scharr needs exactly one of dx, dy set to 1",
                    ));
                }
                Filter::Scharr { dx, dy }
            }
            FilterKind::SepFilter2D => Filter::SepFilter2D {
                kernel_x: p.select_count("kernelX")?,
                kernel_y: p.select_count("kernelY")?,
            },
            FilterKind::Laplacian => Filter::Laplacian {
                ksize: p.select_count("ksize")?,
            },
        };
        Ok(filter)
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            Filter::NoFilter => FilterKind::NoFilter,
            Filter::Bilateral { .. } => FilterKind::Bilateral,
            Filter::Blur { .. } => FilterKind::Blur,
            Filter::BoxFilter { .. } => FilterKind::BoxFilter,
            Filter::Dilate { .. } => FilterKind::Dilate,
            Filter::Erode { .. } => FilterKind::Erode,
            Filter::GaussianBlur { .. } => FilterKind::GaussianBlur,
            Filter::MedianBlur { .. } => FilterKind::MedianBlur,
            Filter::Sobel { .. } => FilterKind::Sobel,
            Filter::Scharr { .. } => FilterKind::Scharr,
            Filter::SepFilter2D { .. } => FilterKind::SepFilter2D,
            Filter::Laplacian { .. } => FilterKind::Laplacian,
        }
    }

    /// Run the filter on an 8-bit matrix owned by `scope`.
    ///
    /// The result is a new matrix with the same shape as `src`; every
    /// working matrix in between is released before returning.
    pub fn apply(&self, scope: &mut Scope, src: MatId) -> Result<MatId> {
        debug!("applying {:?}", self);
        match *self {
            Filter::NoFilter => kernel::copy(scope, src),
            Filter::Bilateral {
                diameter,
                sigma_color,
                sigma_space,
            } => smooth::bilateral(scope, src, diameter, sigma_color, sigma_space),
            Filter::Blur { ksize } | Filter::BoxFilter { ksize } => smooth::box_blur(scope, src, ksize),
            Filter::Dilate { ksize } => morph::dilate(scope, src, ksize),
            Filter::Erode { ksize } => morph::erode(scope, src, ksize),
            Filter::GaussianBlur {
                ksize,
                sigma_x,
                sigma_y,
            } => smooth::gaussian_blur(scope, src, ksize, sigma_x, sigma_y),
            Filter::MedianBlur { ksize } => smooth::median_blur(scope, src, ksize),
            Filter::Sobel { dx, dy, ksize } => edge::sobel(scope, src, dx, dy, ksize),
            Filter::Scharr { dx, dy } => edge::scharr(scope, src, dx, dy),
            Filter::SepFilter2D { kernel_x, kernel_y } => {
                smooth::sep_filter_identity(scope, src, kernel_x, kernel_y)
            }
            Filter::Laplacian { ksize } => edge::laplacian(scope, src, ksize),
        }
    }
}

impl TryFrom<&FilterRequest> for Filter {
    type Error = TransformError;

    fn try_from(request: &FilterRequest) -> Result<Self> {
        Filter::from_request(request)
    }
}
