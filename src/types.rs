use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// A point in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a point from its coordinates
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An ordered set of 2D points stored as an `(n, 2)` matrix.
///
/// Cloning a dataset copies its storage, so a snapshot handed to a clustering
/// job never aliases data another job (or the working-set store) can mutate.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    data: Array2<f64>,
}

impl Dataset {
    /// Wrap an existing `(n, 2)` matrix.
    ///
    /// # Panics
    ///
    /// Panics if the matrix does not have exactly two columns.
    pub fn from_array(data: Array2<f64>) -> Self {
        assert_eq!(data.ncols(), 2, "dataset must have exactly 2 columns");
        Self { data }
    }

    /// Build a dataset from points, preserving their order
    pub fn from_points(points: &[Point]) -> Self {
        let mut data = Array2::zeros((points.len(), 2));
        for (i, p) in points.iter().enumerate() {
            data[[i, 0]] = p.x;
            data[[i, 1]] = p.y;
        }
        Self { data }
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    /// Whether the dataset holds no points
    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    /// Point at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn point(&self, index: usize) -> Point {
        Point::new(self.data[[index, 0]], self.data[[index, 1]])
    }

    /// Iterate over the points in order
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.data.outer_iter().map(|row| Point::new(row[0], row[1]))
    }

    /// Borrow the underlying `(n, 2)` matrix
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }
}

impl From<Vec<Point>> for Dataset {
    fn from(points: Vec<Point>) -> Self {
        Self::from_points(&points)
    }
}

/// A point tagged with the cluster it was assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusteredPoint {
    pub x: f64,
    pub y: f64,
    pub cluster: usize,
}

/// Outcome of clustering one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterResult {
    pub k: usize,
    pub iterations: usize,
    pub points: Vec<ClusteredPoint>,
}

/// One chart's entry in the aggregate response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    /// Label identifying what produced the result
    pub source: String,
    /// Wall-clock time spent clustering, in milliseconds
    pub delay: u64,
    pub result: ClusterResult,
}
