use nalgebra::{DMatrix, Matrix3, Point2, Vector3};

/// Denominators below this put the projected point at infinity
const W_EPSILON: f64 = 1e-10;

/// Projective transform from template pixels to source pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography(Matrix3<f64>);

impl Homography {
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    /// Wrap a matrix, scaled so that h33 = 1 when possible
    pub fn from_matrix(m: Matrix3<f64>) -> Option<Self> {
        if m.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let scale = if m[(2, 2)].abs() > W_EPSILON { m[(2, 2)] } else { m.norm() };
        if scale.abs() <= W_EPSILON {
            return None;
        }
        Some(Self(m / scale))
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    /// Map a template point into source space; `None` at or beyond infinity
    pub fn project(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let v = self.0 * Vector3::new(x, y, 1.0);
        if v[2].abs() <= W_EPSILON {
            return None;
        }
        let (u, w) = (v[0] / v[2], v[1] / v[2]);
        (u.is_finite() && w.is_finite()).then_some((u, w))
    }

    /// Corners (0,0), (0,h), (w,h), (w,0) of a `width` × `height` template
    pub fn project_corners(&self, width: u32, height: u32) -> Option<[(f64, f64); 4]> {
        let (w, h) = (width as f64, height as f64);
        Some([
            self.project(0.0, 0.0)?,
            self.project(0.0, h)?,
            self.project(w, h)?,
            self.project(w, 0.0)?,
        ])
    }

    /// Squared distance between the projection of `src` and `dst`
    pub fn reprojection_error_sq(&self, src: &Point2<f64>, dst: &Point2<f64>) -> f64 {
        match self.project(src.x, src.y) {
            Some((u, v)) => (u - dst.x).powi(2) + (v - dst.y).powi(2),
            None => f64::INFINITY,
        }
    }

    /// Least-squares fit by normalised DLT; needs at least four point pairs
    pub fn from_correspondences(src: &[Point2<f64>], dst: &[Point2<f64>]) -> Option<Self> {
        if src.len() != dst.len() || src.len() < 4 {
            return None;
        }
        let (ns, ts) = normalize_points_hartley(src)?;
        let (nd, td) = normalize_points_hartley(dst)?;

        // Pad to a square system so the null vector is always present in V^T
        let n = ns.len();
        let rows = (2 * n).max(9);
        let mut a = DMatrix::<f64>::zeros(rows, 9);
        for i in 0..n {
            let (x, y) = (ns[i].x, ns[i].y);
            let (u, v) = (nd[i].x, nd[i].y);
            let r = 2 * i;
            a[(r, 0)] = -x;
            a[(r, 1)] = -y;
            a[(r, 2)] = -1.0;
            a[(r, 6)] = u * x;
            a[(r, 7)] = u * y;
            a[(r, 8)] = u;
            a[(r + 1, 3)] = -x;
            a[(r + 1, 4)] = -y;
            a[(r + 1, 5)] = -1.0;
            a[(r + 1, 6)] = v * x;
            a[(r + 1, 7)] = v * y;
            a[(r + 1, 8)] = v;
        }

        let svd = a.svd(false, true);
        let vt = svd.v_t?;
        let smallest = svd.singular_values.imin();
        let h = vt.row(smallest);
        let hn = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);

        let td_inv = td.try_inverse()?;
        Self::from_matrix(td_inv * hn * ts)
    }
}

/// Translate to the centroid and scale to mean distance √2
fn normalize_points_hartley(pts: &[Point2<f64>]) -> Option<(Vec<Point2<f64>>, Matrix3<f64>)> {
    let n = pts.len() as f64;
    let mx = pts.iter().map(|p| p.x).sum::<f64>() / n;
    let my = pts.iter().map(|p| p.y).sum::<f64>() / n;
    let mean_dist = pts
        .iter()
        .map(|p| ((p.x - mx).powi(2) + (p.y - my).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    if mean_dist <= 1e-12 {
        return None;
    }

    let s = std::f64::consts::SQRT_2 / mean_dist;
    let t = Matrix3::new(s, 0.0, -s * mx, 0.0, s, -s * my, 0.0, 0.0, 1.0);
    let out = pts
        .iter()
        .map(|p| Point2::new(s * (p.x - mx), s * (p.y - my)))
        .collect();
    Some((out, t))
}
