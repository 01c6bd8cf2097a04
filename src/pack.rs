//! Area-proportional circle packing for the keyword map.
//!
//! Every keyword is a leaf of one synthetic root. A leaf's area scales with its
//! weight, so its radius scales with `sqrt(weight)`. Leaves are placed
//! heaviest-first along a front chain (each new circle tangent to two chain
//! neighbours), the chain is wrapped in its minimal enclosing circle, and the
//! result is scaled into the canvas with a fixed margin on every side.
//!
//! The layout is a pure function of `(items, bounds, padding)`: no RNG seeded
//! from the clock, no hashing, and equal weights keep their input order, so the
//! same input always yields the same circles.

use tracing::{debug, warn};

use crate::error::GeometryInputError;
use crate::models::{Bounds, PackedCircle, WeightedItem};

/// Space kept clear on all four sides of the canvas.
pub const CANVAS_MARGIN: f64 = 20.0;

/// Re-pack passes used to converge the padding onto the final scale.
const PADDING_PASSES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Circle {
    x: f64,
    y: f64,
    r: f64,
}

impl Circle {
    fn with_radius(r: f64) -> Self {
        Self { x: 0.0, y: 0.0, r }
    }
}

/* -------------------------------------------------------------------------- */
/* Entry point                                                                */
/* -------------------------------------------------------------------------- */

/// Checks one item before layout. Failing items are dropped, not fatal.
pub fn validate_item(item: &WeightedItem) -> Result<(), GeometryInputError> {
    if item.label.trim().is_empty() {
        return Err(GeometryInputError::EmptyLabel);
    }
    if !item.weight.is_finite() {
        return Err(GeometryInputError::NonFiniteWeight {
            label: item.label.clone(),
        });
    }
    if item.weight <= 0.0 {
        return Err(GeometryInputError::NonPositiveWeight {
            label: item.label.clone(),
            weight: item.weight,
        });
    }
    Ok(())
}

/// Lays out `items` as non-overlapping circles inside `bounds`, at least
/// `padding` apart. Returns one circle per valid item, in input order.
pub fn pack(items: &[WeightedItem], bounds: Bounds, padding: f64) -> Vec<PackedCircle> {
    let mut valid: Vec<&WeightedItem> = Vec::with_capacity(items.len());
    for item in items {
        match validate_item(item) {
            Ok(()) => valid.push(item),
            Err(e) => warn!("Keyword dropped from layout - reason={}", e),
        }
    }

    if valid.is_empty() {
        debug!("Pack skipped - no valid items (input={})", items.len());
        return Vec::new();
    }

    // `!(x > 0)` also catches NaN
    if !(bounds.width > 0.0 && bounds.height > 0.0) || !bounds.width.is_finite() || !bounds.height.is_finite() {
        warn!(
            "Pack skipped - invalid bounds width={}, height={}",
            bounds.width, bounds.height
        );
        return Vec::new();
    }

    let padding = if padding.is_finite() && padding > 0.0 { padding } else { 0.0 };
    let margin = CANVAS_MARGIN.min(bounds.width / 4.0).min(bounds.height / 4.0);
    let half_extent = (bounds.width - 2.0 * margin).min(bounds.height - 2.0 * margin) / 2.0;

    // Heaviest first; `sort_by` is stable so equal weights keep input order.
    let mut order: Vec<usize> = (0..valid.len()).collect();
    order.sort_by(|&a, &b| valid[b].weight.total_cmp(&valid[a].weight));
    // Radii relative to the heaviest item, so the chain always packs at unit
    // scale whatever the magnitude of the weights.
    let heaviest = valid[order[0]].weight.sqrt();
    let base: Vec<f64> = order.iter().map(|&i| valid[i].weight.sqrt() / heaviest).collect();

    let mut circles: Vec<Circle> = base.iter().map(|&r| Circle::with_radius(r)).collect();
    let mut scale = half_extent / pack_siblings(&mut circles);

    // Padding is given in canvas units but the packing runs in weight units, so
    // inflate every radius by the padding expressed at the current scale and
    // re-pack until the scale settles.
    let mut inflate = 0.0;
    if padding > 0.0 {
        for _ in 0..PADDING_PASSES {
            inflate = padding / (2.0 * scale);
            circles = base.iter().map(|&r| Circle::with_radius(r + inflate)).collect();
            scale = half_extent / pack_siblings(&mut circles);
        }
    }

    // Centres sit at least scale * (r_i + r_j + 2 * inflate) apart, so taking
    // effective_padding / 2 off each scaled radius leaves that much gap.
    let smallest = base.iter().copied().fold(f64::INFINITY, f64::min);
    let room = scale * (smallest + inflate);
    let effective_padding = if padding < room {
        padding
    } else {
        warn!(
            "Padding reduced to keep every circle visible - requested={:.2}, applied={:.2}",
            padding,
            room
        );
        room
    };

    let cx = bounds.width / 2.0;
    let cy = bounds.height / 2.0;
    let mut placed: Vec<(usize, PackedCircle)> = order
        .iter()
        .zip(circles.iter())
        .zip(base.iter())
        .map(|((&idx, c), &r)| {
            (
                idx,
                PackedCircle {
                    item: valid[idx].clone(),
                    center_x: cx + scale * c.x,
                    center_y: cy + scale * c.y,
                    radius: scale * (r + inflate) - effective_padding / 2.0,
                },
            )
        })
        .collect();
    placed.sort_by_key(|(idx, _)| *idx);

    debug!(
        "Pack completed - items={}, dropped={}, scale={:.3}, padding={:.2}",
        placed.len(),
        items.len() - placed.len(),
        scale,
        effective_padding
    );

    placed.into_iter().map(|(_, c)| c).collect()
}

/* -------------------------------------------------------------------------- */
/* Front-chain sibling packing                                                */
/* -------------------------------------------------------------------------- */

/// Places `c` tangent to both `a` and `b`.
fn place(b: Circle, a: Circle, c: Circle) -> Circle {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let d2 = dx * dx + dy * dy;
    if d2 == 0.0 {
        return Circle { x: a.x + c.r, y: a.y, r: c.r };
    }

    let a2 = (a.r + c.r) * (a.r + c.r);
    let b2 = (b.r + c.r) * (b.r + c.r);
    if a2 > b2 {
        let x = (d2 + b2 - a2) / (2.0 * d2);
        let y = (b2 / d2 - x * x).max(0.0).sqrt();
        Circle {
            x: b.x - x * dx - y * dy,
            y: b.y - x * dy + y * dx,
            r: c.r,
        }
    } else {
        let x = (d2 + a2 - b2) / (2.0 * d2);
        let y = (a2 / d2 - x * x).max(0.0).sqrt();
        Circle {
            x: a.x + x * dx - y * dy,
            y: a.y + x * dy + y * dx,
            r: c.r,
        }
    }
}

/// Overlap test with a tolerance proportional to the pair, so tangent
/// placements are not reported as hits at any radius.
fn intersects(a: Circle, b: Circle) -> bool {
    let dr = (a.r + b.r) * (1.0 - 1e-9);
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

/// Squared distance from the origin to the weighted midpoint of a chain link.
fn score(a: Circle, b: Circle) -> f64 {
    let ab = a.r + b.r;
    let dx = (a.x * b.r + b.x * a.r) / ab;
    let dy = (a.y * b.r + b.y * a.r) / ab;
    dx * dx + dy * dy
}

/// Packs `circles` in slice order around the origin and returns the radius of
/// the enclosing circle, which is centred on the origin afterwards.
fn pack_siblings(circles: &mut [Circle]) -> f64 {
    let n = circles.len();
    if n == 0 {
        return 0.0;
    }

    circles[0].x = 0.0;
    circles[0].y = 0.0;
    if n == 1 {
        return circles[0].r;
    }

    circles[0].x = -circles[1].r;
    circles[1].x = circles[0].r;
    circles[1].y = 0.0;
    if n == 2 {
        return circles[0].r + circles[1].r;
    }

    circles[2] = place(circles[1], circles[0], circles[2]);

    // Circular doubly linked front chain over circle indices.
    let mut next = vec![0usize; n];
    let mut prev = vec![0usize; n];
    next[0] = 1;
    prev[2] = 1;
    next[1] = 2;
    prev[0] = 2;
    next[2] = 0;
    prev[1] = 0;

    let (mut a, mut b) = (0usize, 1usize);
    let mut i = 3;
    'pack: while i < n {
        circles[i] = place(circles[a], circles[b], circles[i]);
        let c = circles[i];

        // Closest intersecting chain circle, measured along the chain.
        let (mut j, mut k) = (next[b], prev[a]);
        let (mut sj, mut sk) = (circles[b].r, circles[a].r);
        loop {
            if sj <= sk {
                if intersects(circles[j], c) {
                    b = j;
                    next[a] = b;
                    prev[b] = a;
                    continue 'pack;
                }
                sj += circles[j].r;
                j = next[j];
            } else {
                if intersects(circles[k], c) {
                    a = k;
                    next[a] = b;
                    prev[b] = a;
                    continue 'pack;
                }
                sk += circles[k].r;
                k = prev[k];
            }
            if j == next[k] {
                break;
            }
        }

        prev[i] = a;
        next[i] = b;
        next[a] = i;
        prev[b] = i;
        b = i;

        let mut best = a;
        let mut best_score = score(circles[a], circles[next[a]]);
        let mut cursor = next[b];
        while cursor != b {
            let s = score(circles[cursor], circles[next[cursor]]);
            if s < best_score {
                best = cursor;
                best_score = s;
            }
            cursor = next[cursor];
        }
        a = best;
        b = next[a];
        i += 1;
    }

    let mut chain = vec![circles[b]];
    let mut cursor = next[b];
    while cursor != b {
        chain.push(circles[cursor]);
        cursor = next[cursor];
    }
    let e = enclose(&chain);

    for c in circles.iter_mut() {
        c.x -= e.x;
        c.y -= e.y;
    }
    e.r
}

/* -------------------------------------------------------------------------- */
/* Minimal enclosing circle                                                   */
/* -------------------------------------------------------------------------- */

/// Fixed-seed linear congruential generator; keeps the shuffle reproducible.
struct Lcg(u64);

impl Lcg {
    const A: u64 = 1_664_525;
    const C: u64 = 1_013_904_223;
    const M: u64 = 1 << 32;

    fn new() -> Self {
        Lcg(1)
    }

    fn next_f64(&mut self) -> f64 {
        self.0 = (Self::A * self.0 + Self::C) % Self::M;
        self.0 as f64 / Self::M as f64
    }
}

fn shuffle(circles: &mut [Circle], rng: &mut Lcg) {
    let mut m = circles.len();
    while m > 0 {
        let i = (rng.next_f64() * m as f64) as usize;
        m -= 1;
        circles.swap(m, i);
    }
}

fn enclose(circles: &[Circle]) -> Circle {
    let mut shuffled = circles.to_vec();
    shuffle(&mut shuffled, &mut Lcg::new());

    let mut basis: Vec<Circle> = Vec::new();
    let mut current: Option<Circle> = None;
    let mut i = 0;
    while i < shuffled.len() {
        let p = shuffled[i];
        if current.map_or(false, |e| encloses_weak(e, p)) {
            i += 1;
            continue;
        }
        match extend_basis(&basis, p) {
            Some(extended) => {
                basis = extended;
                current = Some(enclose_basis(&basis));
                i = 0;
            }
            None => {
                warn!("Enclosing circle fell back to centroid bound - circles={}", circles.len());
                return bounding_circle(circles);
            }
        }
    }

    current.unwrap_or_else(|| bounding_circle(circles))
}

fn extend_basis(basis: &[Circle], p: Circle) -> Option<Vec<Circle>> {
    if encloses_weak_all(p, basis) {
        return Some(vec![p]);
    }

    for &b in basis {
        if encloses_not(p, b) && encloses_weak_all(enclose_basis2(b, p), basis) {
            return Some(vec![b, p]);
        }
    }

    for i in 0..basis.len().saturating_sub(1) {
        for j in (i + 1)..basis.len() {
            let (bi, bj) = (basis[i], basis[j]);
            if encloses_not(enclose_basis2(bi, bj), p)
                && encloses_not(enclose_basis2(bi, p), bj)
                && encloses_not(enclose_basis2(bj, p), bi)
                && encloses_weak_all(enclose_basis3(bi, bj, p), basis)
            {
                return Some(vec![bi, bj, p]);
            }
        }
    }

    None
}

fn encloses_not(a: Circle, b: Circle) -> bool {
    let dr = a.r - b.r;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr < 0.0 || dr * dr < dx * dx + dy * dy
}

fn encloses_weak(a: Circle, b: Circle) -> bool {
    let dr = a.r - b.r + a.r.max(b.r).max(1.0) * 1e-9;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

fn encloses_weak_all(a: Circle, basis: &[Circle]) -> bool {
    basis.iter().all(|&b| encloses_weak(a, b))
}

fn enclose_basis(basis: &[Circle]) -> Circle {
    match basis {
        [a] => *a,
        [a, b] => enclose_basis2(*a, *b),
        [a, b, c] => enclose_basis3(*a, *b, *c),
        _ => bounding_circle(basis),
    }
}

fn enclose_basis2(a: Circle, b: Circle) -> Circle {
    let x21 = b.x - a.x;
    let y21 = b.y - a.y;
    let r21 = b.r - a.r;
    let l = (x21 * x21 + y21 * y21).sqrt();
    if l == 0.0 {
        return if a.r >= b.r { a } else { b };
    }
    Circle {
        x: (a.x + b.x + x21 / l * r21) / 2.0,
        y: (a.y + b.y + y21 / l * r21) / 2.0,
        r: (l + a.r + b.r) / 2.0,
    }
}

fn enclose_basis3(a: Circle, b: Circle, c: Circle) -> Circle {
    let (x1, y1, r1) = (a.x, a.y, a.r);
    let (x2, y2, r2) = (b.x, b.y, b.r);
    let (x3, y3, r3) = (c.x, c.y, c.r);
    let a2 = x1 - x2;
    let a3 = x1 - x3;
    let b2 = y1 - y2;
    let b3 = y1 - y3;
    let c2 = r2 - r1;
    let c3 = r3 - r1;
    let d1 = x1 * x1 + y1 * y1 - r1 * r1;
    let d2 = d1 - x2 * x2 - y2 * y2 + r2 * r2;
    let d3 = d1 - x3 * x3 - y3 * y3 + r3 * r3;
    let ab = a3 * b2 - a2 * b3;
    let xa = (b2 * d3 - b3 * d2) / (ab * 2.0) - x1;
    let xb = (b3 * c2 - b2 * c3) / ab;
    let ya = (a3 * d2 - a2 * d3) / (ab * 2.0) - y1;
    let yb = (a2 * c3 - a3 * c2) / ab;
    let qa = xb * xb + yb * yb - 1.0;
    let qb = 2.0 * (r1 + xa * xb + ya * yb);
    let qc = xa * xa + ya * ya - r1 * r1;
    let r = -(if qa.abs() > 1e-6 {
        (qb + (qb * qb - 4.0 * qa * qc).sqrt()) / (2.0 * qa)
    } else {
        qc / qb
    });
    Circle {
        x: x1 + xa + xb * r,
        y: y1 + ya + yb * r,
        r,
    }
}

/// Loose but always-valid bound: centroid plus the farthest reach.
fn bounding_circle(circles: &[Circle]) -> Circle {
    if circles.is_empty() {
        return Circle::with_radius(0.0);
    }
    let n = circles.len() as f64;
    let x = circles.iter().map(|c| c.x).sum::<f64>() / n;
    let y = circles.iter().map(|c| c.y).sum::<f64>() / n;
    let r = circles
        .iter()
        .map(|c| ((c.x - x).powi(2) + (c.y - y).powi(2)).sqrt() + c.r)
        .fold(0.0, f64::max);
    Circle { x, y, r }
}
