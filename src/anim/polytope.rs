//! Uniform polyhedra by Wythoff's kaleidoscopic construction, rendered with
//! an edge-function triangle rasterizer, a per-cell z-buffer, and a
//! Lambert-shaded glyph ramp.

use crate::context::{Animation, SimContext, StepResult};
use crate::sampler::WeightedSampler;
use std::collections::HashSet;
use std::f32::consts::PI;
use std::time::Duration;

#[derive(Clone, Copy, Debug)]
struct Vec3 {
    x: f32,
    y: f32,
    z: f32,
}

impl Vec3 {
    fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    fn add(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }

    fn sub(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }

    fn scale(self, k: f32) -> Vec3 {
        Vec3::new(self.x * k, self.y * k, self.z * k)
    }

    fn dot(self, o: Vec3) -> f32 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    fn cross(self, o: Vec3) -> Vec3 {
        Vec3::new(
            self.y * o.z - self.z * o.y,
            self.z * o.x - self.x * o.z,
            self.x * o.y - self.y * o.x,
        )
    }

    fn len2(self) -> f32 {
        self.dot(self)
    }

    fn normalize(self) -> Vec3 {
        let l = self.len2().sqrt();
        if l > 1e-9 {
            self.scale(1.0 / l)
        } else {
            Vec3::new(0.0, 0.0, 1.0)
        }
    }

    /// Mirror across the plane through the origin with unit normal `n`.
    fn reflect(self, n: Vec3) -> Vec3 {
        self.sub(n.scale(2.0 * self.dot(n)))
    }
}

/// Unit normals of the three Schwarz-triangle mirror planes with dihedral
/// angles pi/p (m0,m1), pi/q (m1,m2), pi/r (m0,m2).
fn mirror_normals(p: f32, q: f32, r: f32) -> [Vec3; 3] {
    let n0 = Vec3::new(1.0, 0.0, 0.0);
    let n1 = Vec3::new(-(PI / p).cos(), (PI / p).sin(), 0.0);
    let x = -(PI / r).cos();
    let y = (-(PI / q).cos() - n1.x * x) / n1.y;
    let z = (1.0 - x * x - y * y).max(0.0).sqrt();
    [n0, n1, Vec3::new(x, y, z)]
}

/// Vertices of the spherical fundamental triangle: each lies on two of the
/// mirror planes, on the interior side of the third.
fn triangle_vertices(mirrors: &[Vec3; 3]) -> [Vec3; 3] {
    let vertex = |a: usize, b: usize, inside: usize| {
        let v = mirrors[a].cross(mirrors[b]).normalize();
        if v.dot(mirrors[inside]) < 0.0 {
            v.scale(-1.0)
        } else {
            v
        }
    };
    [vertex(1, 2, 0), vertex(2, 0, 1), vertex(0, 1, 2)]
}

/// Closure of the seed point under reflection in the three mirrors.
fn orbit(seed: Vec3, mirrors: &[Vec3; 3]) -> Vec<Vec3> {
    let seed = seed.normalize();
    let mut pts = vec![seed];
    let mut queue = vec![seed];
    while let Some(p) = queue.pop() {
        for &n in mirrors {
            let r = p.reflect(n);
            if !pts.iter().any(|&q| q.sub(r).len2() < 1e-5) {
                pts.push(r);
                queue.push(r);
                // Largest reflection group here is icosahedral, order 120.
                if pts.len() >= 240 {
                    return pts;
                }
            }
        }
    }
    pts
}

fn orient(pts: &[Vec3], a: usize, b: usize, c: usize, d: usize) -> f32 {
    let n = pts[b].sub(pts[a]).cross(pts[c].sub(pts[a]));
    n.dot(pts[d].sub(pts[a]))
}

/// Gift-wrapped convex hull as outward-wound triangles. Coplanar faces come
/// back triangulated; the z-buffer does not care how.
fn hull_triangles(pts: &[Vec3]) -> Vec<[usize; 3]> {
    let n = pts.len();
    if n < 4 {
        return Vec::new();
    }
    const EPS: f32 = 1e-4;

    let pivot = |a: usize, b: usize| -> Option<usize> {
        let mut c = (0..n).find(|&k| k != a && k != b)?;
        for d in 0..n {
            if d != a && d != b && d != c && orient(pts, a, b, c, d) > EPS {
                c = d;
            }
        }
        Some(c)
    };

    // First face: wrap around edges out of an extreme point until one
    // supports a plane with every point on the inner side.
    let i0 = (0..n)
        .min_by(|&a, &b| pts[a].x.total_cmp(&pts[b].x))
        .unwrap_or(0);
    let mut first = None;
    for j in 0..n {
        if j == i0 {
            continue;
        }
        let Some(c) = pivot(i0, j) else { continue };
        if (0..n).all(|d| d == i0 || d == j || d == c || orient(pts, i0, j, c, d) <= EPS) {
            first = Some([i0, j, c]);
            break;
        }
    }
    let Some(mut face) = first else {
        return Vec::new();
    };
    // Wind the starting face outward; every later face inherits the winding
    // by wrapping reversed edges.
    let normal = pts[face[1]].sub(pts[face[0]]).cross(pts[face[2]].sub(pts[face[0]]));
    if normal.dot(pts[face[0]]) < 0.0 {
        face.swap(1, 2);
    }

    let mut faces = vec![face];
    let mut done: HashSet<(usize, usize)> = HashSet::new();
    let mut pending: Vec<(usize, usize)> = Vec::new();
    for e in [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])] {
        done.insert(e);
        pending.push((e.1, e.0));
    }

    while let Some((a, b)) = pending.pop() {
        if done.contains(&(a, b)) {
            continue;
        }
        let Some(c) = pivot(a, b) else { continue };
        faces.push([a, b, c]);
        for e in [(a, b), (b, c), (c, a)] {
            done.insert(e);
            if !done.contains(&(e.1, e.0)) {
                pending.push((e.1, e.0));
            }
        }
        if faces.len() > 4 * n {
            break;
        }
    }
    faces
}

const GROUPS: &[(&str, f32, f64)] = &[
    ("tetrahedral", 3.0, 1.0),
    ("octahedral", 4.0, 2.0),
    ("icosahedral", 5.0, 3.0),
];

const SEED_NAMES: [&str; 7] = [
    "vertex A",
    "vertex B",
    "vertex C",
    "edge AB",
    "edge BC",
    "edge CA",
    "center",
];

const RAMP: [char; 9] = ['·', ':', '-', '=', '+', '*', '#', '%', '@'];

struct Mesh {
    pts: Vec<Vec3>,
    faces: Vec<[usize; 3]>,
}

pub struct Polytope {
    mesh: Option<Mesh>,
    zbuf: Vec<f32>,
}

impl Polytope {
    pub fn new() -> Self {
        Self {
            mesh: None,
            zbuf: Vec::new(),
        }
    }

    fn setup(&mut self, ctx: &mut SimContext) {
        let mut groups = WeightedSampler::new();
        for (i, &(_, _, weight)) in GROUPS.iter().enumerate() {
            groups.put(i, weight);
        }
        // A variant index addresses the full group x seed table.
        let (gi, si) = match ctx.variant_in(GROUPS.len() * SEED_NAMES.len()) {
            Some(v) => (v / SEED_NAMES.len(), v % SEED_NAMES.len()),
            None => {
                let mut seeds = WeightedSampler::new();
                for i in 0..SEED_NAMES.len() {
                    // The vertex seeds give the regular solids; favor the
                    // busier truncated and omnitruncated forms slightly.
                    seeds.put(i, if i < 3 { 1.0 } else { 2.0 });
                }
                (*groups.sample(&mut ctx.rng), *seeds.sample(&mut ctx.rng))
            }
        };
        let (group_name, p, _) = GROUPS[gi];

        let mirrors = mirror_normals(p, 3.0, 2.0);
        let [v0, v1, v2] = triangle_vertices(&mirrors);
        let seed = match si {
            0 => v0,
            1 => v1,
            2 => v2,
            3 => v0.add(v1),
            4 => v1.add(v2),
            5 => v2.add(v0),
            _ => v0.add(v1).add(v2),
        };
        let pts = orbit(seed, &mirrors);
        let faces = hull_triangles(&pts);

        ctx.set_label(format!(
            "polytope: {} {} ({} vertices)",
            group_name,
            SEED_NAMES[si],
            pts.len()
        ));
        self.mesh = Some(Mesh { pts, faces });
    }

    fn render(&mut self, ctx: &mut SimContext) {
        let Some(mesh) = self.mesh.as_ref() else {
            return;
        };
        let (w, h) = (ctx.cols, ctx.rows);
        self.zbuf.clear();
        self.zbuf.resize(w * h, f32::INFINITY);
        ctx.canvas.clear();

        let t = ctx.frame as f32;
        let (sa, ca) = (t * 0.021).sin_cos();
        let (sb, cb) = (t * 0.013).sin_cos();
        let rotate = |p: Vec3| {
            // Yaw then pitch.
            let p = Vec3::new(p.x * ca + p.z * sa, p.y, -p.x * sa + p.z * ca);
            Vec3::new(p.x, p.y * cb - p.z * sb, p.y * sb + p.z * cb)
        };

        let aspect = (ctx.char_height / ctx.char_width).max(0.1);
        let scale = 0.9 * (h as f32 / 2.0).min(w as f32 / (2.0 * aspect));
        let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
        let project = |p: Vec3| {
            // Mild perspective; the camera sits at z = -2.6 looking in +z.
            let k = 2.2 / (2.6 + p.z);
            (cx + p.x * k * scale * aspect, cy + p.y * k * scale, p.z)
        };

        let light = Vec3::new(0.45, 0.6, -0.65).normalize();

        for &[a, b, c] in &mesh.faces {
            let (wa, wb, wc) = (rotate(mesh.pts[a]), rotate(mesh.pts[b]), rotate(mesh.pts[c]));
            let normal = wb.sub(wa).cross(wc.sub(wa)).normalize();
            if normal.z >= 0.0 {
                continue;
            }
            let shade = normal.dot(light).max(0.08);
            let glyph = RAMP[((shade * (RAMP.len() - 1) as f32).round() as usize).min(RAMP.len() - 1)];

            let (ax, ay, az) = project(wa);
            let (bx, by, bz) = project(wb);
            let (cx2, cy2, cz) = project(wc);

            let area = (bx - ax) * (cy2 - ay) - (by - ay) * (cx2 - ax);
            if area.abs() < 1e-6 {
                continue;
            }
            let x0 = ax.min(bx).min(cx2).floor().max(0.0) as usize;
            let x1 = (ax.max(bx).max(cx2).ceil() as usize).min(w.saturating_sub(1));
            let y0 = ay.min(by).min(cy2).floor().max(0.0) as usize;
            let y1 = (ay.max(by).max(cy2).ceil() as usize).min(h.saturating_sub(1));

            for py in y0..=y1 {
                for px in x0..=x1 {
                    let (fx, fy) = (px as f32 + 0.5, py as f32 + 0.5);
                    let w0 = (cx2 - bx) * (fy - by) - (cy2 - by) * (fx - bx);
                    let w1 = (ax - cx2) * (fy - cy2) - (ay - cy2) * (fx - cx2);
                    let w2 = (bx - ax) * (fy - ay) - (by - ay) * (fx - ax);
                    let inside = if area > 0.0 {
                        w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0
                    } else {
                        w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0
                    };
                    if !inside {
                        continue;
                    }
                    let z = (w0 * az + w1 * bz + w2 * cz) / area;
                    let zi = py * w + px;
                    if z < self.zbuf[zi] {
                        self.zbuf[zi] = z;
                        ctx.canvas.set(px, py, glyph);
                    }
                }
            }
        }
    }
}

impl Default for Polytope {
    fn default() -> Self {
        Self::new()
    }
}

impl Animation for Polytope {
    fn step(&mut self, ctx: &mut SimContext) -> StepResult {
        if ctx.frame == 0 || self.mesh.is_none() {
            self.setup(ctx);
        }
        self.render(ctx);
        StepResult::Continue(Duration::from_millis(33))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_angles_match_the_schwarz_triangle() {
        for &(_, p, _) in GROUPS {
            let [n0, n1, n2] = mirror_normals(p, 3.0, 2.0);
            assert!((n0.len2() - 1.0).abs() < 1e-5);
            assert!((n1.len2() - 1.0).abs() < 1e-5);
            assert!((n2.len2() - 1.0).abs() < 1e-5);
            assert!((n0.dot(n1) + (PI / p).cos()).abs() < 1e-5);
            assert!((n1.dot(n2) + (PI / 3.0).cos()).abs() < 1e-5);
            assert!((n0.dot(n2) + (PI / 2.0).cos()).abs() < 1e-5);
        }
    }

    #[test]
    fn orbit_sizes_match_the_reflection_groups() {
        // The interior seed has trivial stabilizer, so its orbit is the
        // whole group: orders 24, 48, 120.
        for (p, order) in [(3.0, 24), (4.0, 48), (5.0, 120)] {
            let mirrors = mirror_normals(p, 3.0, 2.0);
            let [v0, v1, v2] = triangle_vertices(&mirrors);
            let pts = orbit(v0.add(v1).add(v2), &mirrors);
            assert_eq!(pts.len(), order, "group p={p}");
            for pt in &pts {
                assert!((pt.len2() - 1.0).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn vertex_seed_recovers_the_octahedron() {
        let mirrors = mirror_normals(4.0, 3.0, 2.0);
        let [_, _, v2] = triangle_vertices(&mirrors);
        // v2 sits on the two mirrors meeting at pi/4; stabilizer order 8.
        assert_eq!(orbit(v2, &mirrors).len(), 6);
    }

    #[test]
    fn hull_of_octahedron_has_eight_outward_faces() {
        let pts = vec![
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, -1.0),
        ];
        let faces = hull_triangles(&pts);
        assert_eq!(faces.len(), 8);
        for &[a, b, c] in &faces {
            let n = pts[b].sub(pts[a]).cross(pts[c].sub(pts[a]));
            let centroid = pts[a].add(pts[b]).add(pts[c]).scale(1.0 / 3.0);
            assert!(n.dot(centroid) > 0.0, "face [{a},{b},{c}] wound inward");
        }
    }
}
