//! Tile schema: window size, overlap, and the derived step.
//!
//! The step is the distance between consecutive tile origins along one axis,
//! `window − 2·overlap`. A schema is only constructible when the step is
//! strictly positive in both axes, so every downstream consumer can rely on
//! the grid advancing.

use thiserror::Error;

/// Rejected tile/overlap combinations, reporting which axis collapsed and by
/// how much.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error(
        "Both width step ({width_step}) and height step ({height_step}) must be positive; \
         increase the window ({window_w}x{window_h}) or decrease the overlap \
         ({overlap_w}x{overlap_h})"
    )]
    BothSteps {
        window_w: u32,
        window_h: u32,
        overlap_w: u32,
        overlap_h: u32,
        width_step: i64,
        height_step: i64,
    },

    #[error(
        "Width step ({step}) must be positive; increase the window width ({window}) or \
         decrease the width overlap ({overlap})"
    )]
    WidthStep { window: u32, overlap: u32, step: i64 },

    #[error(
        "Height step ({step}) must be positive; increase the window height ({window}) or \
         decrease the height overlap ({overlap})"
    )]
    HeightStep { window: u32, overlap: u32, step: i64 },
}

/// An immutable tiling configuration in pixel units.
///
/// `step` is derived at construction and never set directly. The value is
/// plain and hashable so candidate schemas can be deduplicated or used as
/// map keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileSchema {
    window_w: u32,
    window_h: u32,
    overlap_w: u32,
    overlap_h: u32,
    step_w: u32,
    step_h: u32,
}

impl TileSchema {
    /// Builds a schema, rejecting any combination whose step
    /// (`window − 2·overlap`) is not strictly positive in both axes.
    pub fn new(
        window_w: u32,
        window_h: u32,
        overlap_w: u32,
        overlap_h: u32,
    ) -> Result<Self, SchemaError> {
        let step_w = window_w as i64 - 2 * overlap_w as i64;
        let step_h = window_h as i64 - 2 * overlap_h as i64;

        if step_w <= 0 && step_h <= 0 {
            return Err(SchemaError::BothSteps {
                window_w,
                window_h,
                overlap_w,
                overlap_h,
                width_step: step_w,
                height_step: step_h,
            });
        }
        if step_w <= 0 {
            return Err(SchemaError::WidthStep {
                window: window_w,
                overlap: overlap_w,
                step: step_w,
            });
        }
        if step_h <= 0 {
            return Err(SchemaError::HeightStep {
                window: window_h,
                overlap: overlap_h,
                step: step_h,
            });
        }

        Ok(Self {
            window_w,
            window_h,
            overlap_w,
            overlap_h,
            step_w: step_w as u32,
            step_h: step_h as u32,
        })
    }

    #[inline]
    pub fn window_w(&self) -> u32 {
        self.window_w
    }

    #[inline]
    pub fn window_h(&self) -> u32 {
        self.window_h
    }

    #[inline]
    pub fn overlap_w(&self) -> u32 {
        self.overlap_w
    }

    #[inline]
    pub fn overlap_h(&self) -> u32 {
        self.overlap_h
    }

    #[inline]
    pub fn step_w(&self) -> u32 {
        self.step_w
    }

    #[inline]
    pub fn step_h(&self) -> u32 {
        self.step_h
    }
}
