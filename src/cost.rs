//! Pairwise affinity between predicted track boxes and detections.

use ndarray::{Array2, ArrayView2};

use crate::bbox::{BBox, Ltrb};

/// Rows are tracks, columns are detections, entries are IoU in `[0, 1]`.
/// Higher is better: solvers maximize the total over the chosen pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix(Array2<f32>);

impl CostMatrix {
    pub fn iou(tracks: &[BBox<Ltrb>], detections: &[BBox<Ltrb>]) -> Self {
        Self(Array2::from_shape_fn(
            (tracks.len(), detections.len()),
            |(r, c)| tracks[r].iou(&detections[c]),
        ))
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.0.nrows()
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.0.ncols()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        self.0.get((row, col)).copied()
    }

    #[inline]
    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.0.view()
    }
}

impl From<Array2<f32>> for CostMatrix {
    fn from(m: Array2<f32>) -> Self {
        Self(m)
    }
}
