/*!
Piecewise cubic Bezier curves in local space.

A [`Curve`] is an ordered list of [`Knot`]s. Segment `i` runs from knot `i` to knot `i + 1`
(and, for closed curves, from the last knot back to the first) with control points

```text
p0 = k[i].position
c1 = k[i].position     + k[i].tangent_out
c2 = k[i + 1].position + k[i + 1].tangent_in
p1 = k[i + 1].position
```

The global parameter `t ∈ [0, 1]` is normalized arc length: `t = 0.5` is halfway along the
curve by distance, regardless of how the knots are spaced. Each segment caches a small
arc-length table that is rebuilt whenever the knots change.

Degenerate curves (fewer than two knots, or a length below `MIN_CURVE_LENGTH`) never
divide by zero: evaluation and projection return the local origin with `t = 0`.
*/

use crate::{
    constants::{DIST_EPS, MIN_CURVE_LENGTH},
    math::{Vec3, normalize_or_zero, up},
};

/// Arc-length samples per segment.
const LENGTH_SAMPLES: usize = 32;

/// Coarse samples per segment before refining a nearest-point query.
const PICK_SAMPLES: usize = 16;

/// Golden-section iterations when refining a nearest-point query.
const PICK_REFINE_ITERATIONS: usize = 24;

/// How a knot's two tangents relate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TangentMode {
    /// `tangent_out == -tangent_in`.
    #[default]
    Mirrored,
    /// Lengths are independent; on insert the in-tangent is made collinear with (and
    /// opposite to) the out-tangent.
    Continuous,
}

/// A control point with relative in/out tangents, in curve-local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Knot {
    pub position: Vec3,
    pub tangent_in: Vec3,
    pub tangent_out: Vec3,
    pub mode: TangentMode,
}

impl Knot {
    /// Knot whose in-tangent mirrors `tangent_out`.
    pub fn mirrored(position: Vec3, tangent_out: Vec3) -> Self {
        Self {
            position,
            tangent_in: -tangent_out,
            tangent_out,
            mode: TangentMode::Mirrored,
        }
    }

    pub fn continuous(position: Vec3, tangent_in: Vec3, tangent_out: Vec3) -> Self {
        Self {
            position,
            tangent_in,
            tangent_out,
            mode: TangentMode::Continuous,
        }
    }

    /// Re-establish the tangent mode's constraint.
    fn constrained(mut self) -> Self {
        match self.mode {
            TangentMode::Mirrored => self.tangent_in = -self.tangent_out,
            TangentMode::Continuous => {
                let dir = normalize_or_zero(self.tangent_out);
                if dir != Vec3::zeros() {
                    self.tangent_in = -dir * self.tangent_in.norm();
                }
            }
        }
        self
    }
}

/// Position and frame of the curve at some parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveSample {
    pub position: Vec3,
    /// Unit direction of increasing `t` (zero on a degenerate curve).
    pub tangent: Vec3,
    /// Unit vector orthogonal to `tangent`, as close to +Y as possible.
    pub up: Vec3,
}

/// Result of projecting a point onto the curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NearestPoint {
    pub t: f32,
    pub distance: f32,
    pub position: Vec3,
}

#[derive(Clone, Debug, Default)]
struct SegmentTable {
    /// Cumulative arc length at `u = j / LENGTH_SAMPLES`, `j = 0..=LENGTH_SAMPLES`.
    arc: Vec<f32>,
}

impl SegmentTable {
    fn length(&self) -> f32 {
        self.arc.last().copied().unwrap_or(0.0)
    }

    /// Arc length at local parameter `u`.
    fn arc_at(&self, u: f32) -> f32 {
        let x = u.clamp(0.0, 1.0) * LENGTH_SAMPLES as f32;
        let j = (x.floor() as usize).min(LENGTH_SAMPLES - 1);
        let frac = x - j as f32;
        self.arc[j] + (self.arc[j + 1] - self.arc[j]) * frac
    }

    /// Local parameter at arc length `s`.
    fn u_at(&self, s: f32) -> f32 {
        let s = s.clamp(0.0, self.length());
        // First sample whose cumulative length reaches `s`.
        let j = self.arc.partition_point(|&a| a < s).clamp(1, LENGTH_SAMPLES);
        let (a0, a1) = (self.arc[j - 1], self.arc[j]);
        let frac = if a1 - a0 > DIST_EPS {
            (s - a0) / (a1 - a0)
        } else {
            0.0
        };
        ((j - 1) as f32 + frac) / LENGTH_SAMPLES as f32
    }
}

/// Ordered knots forming a continuous path, parameterized by normalized arc length.
#[derive(Clone, Debug, Default)]
pub struct Curve {
    knots: Vec<Knot>,
    closed: bool,
    tables: Vec<SegmentTable>,
    length: f32,
}

impl Curve {
    pub fn new(closed: bool) -> Self {
        Self {
            closed,
            ..Self::default()
        }
    }

    pub fn from_knots(knots: impl IntoIterator<Item = Knot>, closed: bool) -> Self {
        let mut curve = Self::new(closed);
        curve.knots = knots.into_iter().map(Knot::constrained).collect();
        curve.recompute();
        curve
    }

    pub fn knots(&self) -> &[Knot] {
        &self.knots
    }

    pub fn knot_count(&self) -> usize {
        self.knots.len()
    }

    pub fn closed(&self) -> bool {
        self.closed
    }

    pub fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
        self.recompute();
    }

    /// Cached total length.
    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn last_knot(&self) -> Option<&Knot> {
        self.knots.last()
    }

    /// Append a knot (authoring order is traversal order).
    pub fn add(&mut self, knot: Knot) {
        self.knots.push(knot.constrained());
        self.recompute();
    }

    /// Replace knot `index`. Returns `false` when out of range.
    pub fn set_knot(&mut self, index: usize, knot: Knot) -> bool {
        let Some(slot) = self.knots.get_mut(index) else {
            return false;
        };
        *slot = knot.constrained();
        self.recompute();
        true
    }

    /// Too few knots or too short to be traversed.
    pub fn is_degenerate(&self) -> bool {
        self.knots.len() < 2 || self.length < MIN_CURVE_LENGTH
    }

    fn segment_count(&self) -> usize {
        match self.knots.len() {
            0 | 1 => 0,
            n if self.closed => n,
            n => n - 1,
        }
    }

    fn control_points(&self, segment: usize) -> [Vec3; 4] {
        let a = &self.knots[segment];
        let b = &self.knots[(segment + 1) % self.knots.len()];
        [
            a.position,
            a.position + a.tangent_out,
            b.position + b.tangent_in,
            b.position,
        ]
    }

    fn recompute(&mut self) {
        let segments = self.segment_count();
        let mut tables = Vec::with_capacity(segments);
        let mut total = 0.0;

        for segment in 0..segments {
            let cps = self.control_points(segment);
            let mut arc = Vec::with_capacity(LENGTH_SAMPLES + 1);
            let mut acc = 0.0;
            let mut prev = cps[0];
            arc.push(0.0);
            for j in 1..=LENGTH_SAMPLES {
                let p = bezier_point(&cps, j as f32 / LENGTH_SAMPLES as f32);
                acc += (p - prev).norm();
                arc.push(acc);
                prev = p;
            }
            total += acc;
            tables.push(SegmentTable { arc });
        }

        self.tables = tables;
        self.length = total;
    }

    /// Segment index and local parameter for global `t`.
    fn locate(&self, t: f32) -> (usize, f32) {
        let last = self.tables.len() - 1;
        let mut remaining = t.clamp(0.0, 1.0) * self.length;
        for (i, table) in self.tables.iter().enumerate() {
            let len = table.length();
            if remaining <= len || i == last {
                return (i, table.u_at(remaining));
            }
            remaining -= len;
        }
        (last, 1.0)
    }

    /// Global `t` for a local parameter on `segment`.
    fn global_t(&self, segment: usize, u: f32) -> f32 {
        if self.length <= DIST_EPS {
            return 0.0;
        }
        let before: f32 = self.tables[..segment].iter().map(SegmentTable::length).sum();
        ((before + self.tables[segment].arc_at(u)) / self.length).clamp(0.0, 1.0)
    }

    /// Position, unit tangent and up vector at `t`.
    pub fn evaluate(&self, t: f32) -> CurveSample {
        if self.is_degenerate() {
            return CurveSample {
                position: Vec3::zeros(),
                tangent: Vec3::zeros(),
                up: up(),
            };
        }

        let (segment, u) = self.locate(t);
        let cps = self.control_points(segment);
        let tangent = segment_tangent(&cps, u);
        CurveSample {
            position: bezier_point(&cps, u),
            tangent,
            up: up_from_tangent(&tangent),
        }
    }

    pub fn evaluate_position(&self, t: f32) -> Vec3 {
        self.evaluate(t).position
    }

    pub fn evaluate_tangent(&self, t: f32) -> Vec3 {
        self.evaluate(t).tangent
    }

    pub fn evaluate_up(&self, t: f32) -> Vec3 {
        self.evaluate(t).up
    }

    /// Closest point on the curve to `point` (both local space).
    ///
    /// Coarsely samples every segment, then refines around the best sample with a
    /// golden-section search. Cost is linear in the number of knots.
    pub fn nearest_point(&self, point: &Vec3) -> NearestPoint {
        if self.is_degenerate() {
            return NearestPoint {
                t: 0.0,
                distance: 0.0,
                position: Vec3::zeros(),
            };
        }

        let mut best_segment = 0;
        let mut best_u = 0.0;
        let mut best_dist_sq = f32::INFINITY;

        for segment in 0..self.tables.len() {
            let cps = self.control_points(segment);
            for j in 0..=PICK_SAMPLES {
                let u = j as f32 / PICK_SAMPLES as f32;
                let d = (bezier_point(&cps, u) - point).norm_squared();
                if d < best_dist_sq {
                    best_dist_sq = d;
                    best_segment = segment;
                    best_u = u;
                }
            }
        }

        let cps = self.control_points(best_segment);
        let step = 1.0 / PICK_SAMPLES as f32;
        let u = refine(&cps, point, (best_u - step).max(0.0), (best_u + step).min(1.0));
        let position = bezier_point(&cps, u);

        NearestPoint {
            t: self.global_t(best_segment, u),
            distance: (position - point).norm(),
            position,
        }
    }
}

fn bezier_point(cps: &[Vec3; 4], u: f32) -> Vec3 {
    let mt = 1.0 - u;
    cps[0] * (mt * mt * mt)
        + cps[1] * (3.0 * mt * mt * u)
        + cps[2] * (3.0 * mt * u * u)
        + cps[3] * (u * u * u)
}

fn bezier_derivative(cps: &[Vec3; 4], u: f32) -> Vec3 {
    let mt = 1.0 - u;
    (cps[1] - cps[0]) * (3.0 * mt * mt)
        + (cps[2] - cps[1]) * (6.0 * mt * u)
        + (cps[3] - cps[2]) * (3.0 * u * u)
}

/// Unit tangent. Falls back to a finite difference where the derivative vanishes
/// (zero-length tangents at a knot), then to the chord.
fn segment_tangent(cps: &[Vec3; 4], u: f32) -> Vec3 {
    let d = normalize_or_zero(bezier_derivative(cps, u));
    if d != Vec3::zeros() {
        return d;
    }

    const H: f32 = 1.0e-3;
    let fd = normalize_or_zero(
        bezier_point(cps, (u + H).min(1.0)) - bezier_point(cps, (u - H).max(0.0)),
    );
    if fd != Vec3::zeros() {
        return fd;
    }

    normalize_or_zero(cps[3] - cps[0])
}

/// Up vector orthogonal to `tangent`, leaning toward +Y (or +Z on a vertical tangent).
fn up_from_tangent(tangent: &Vec3) -> Vec3 {
    let reference = if tangent.y.abs() > 0.999 { Vec3::z() } else { up() };
    let ortho = normalize_or_zero(reference - tangent * reference.dot(tangent));
    if ortho == Vec3::zeros() { up() } else { ortho }
}

/// Golden-section search for the closest local parameter in `[lo, hi]`.
fn refine(cps: &[Vec3; 4], point: &Vec3, mut lo: f32, mut hi: f32) -> f32 {
    const INV_PHI: f32 = 0.618_034;
    let dist = |u: f32| (bezier_point(cps, u) - point).norm_squared();

    let mut a = hi - (hi - lo) * INV_PHI;
    let mut b = lo + (hi - lo) * INV_PHI;
    let mut fa = dist(a);
    let mut fb = dist(b);

    for _ in 0..PICK_REFINE_ITERATIONS {
        if fa < fb {
            hi = b;
            b = a;
            fb = fa;
            a = hi - (hi - lo) * INV_PHI;
            fa = dist(a);
        } else {
            lo = a;
            a = b;
            fa = fb;
            b = lo + (hi - lo) * INV_PHI;
            fb = dist(b);
        }
    }

    // The bracket ends are candidates too (the true minimum may sit on a segment end).
    let mid = 0.5 * (lo + hi);
    [lo, mid, hi]
        .into_iter()
        .min_by(|x, y| dist(*x).total_cmp(&dist(*y)))
        .unwrap_or(mid)
}
