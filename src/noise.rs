//! Seeded lattice value noise with a multi-octave accumulator.
//!
//! Hash-based rather than gradient-based: each integer lattice corner hashes
//! to a value in [0,1], blended with a smoothstep fade. Cheap, deterministic,
//! and continuous, which is all the animations need.

fn hash_u32(mut x: u32) -> u32 {
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

fn hash2(x: i32, y: i32, seed: u32) -> u32 {
    hash_u32(seed ^ (x as u32).wrapping_mul(0x9e37_79b1) ^ (y as u32).wrapping_mul(0x85eb_ca6b))
}

fn hash3(x: i32, y: i32, z: i32, seed: u32) -> u32 {
    hash_u32(
        seed ^ (x as u32).wrapping_mul(0x9e37_79b1)
            ^ (y as u32).wrapping_mul(0x85eb_ca6b)
            ^ (z as u32).wrapping_mul(0xc2b2_ae35),
    )
}

fn hash4(x: i32, y: i32, z: i32, w: i32, seed: u32) -> u32 {
    hash_u32(
        seed ^ (x as u32).wrapping_mul(0x9e37_79b1)
            ^ (y as u32).wrapping_mul(0x85eb_ca6b)
            ^ (z as u32).wrapping_mul(0xc2b2_ae35)
            ^ (w as u32).wrapping_mul(0x27d4_eb2f),
    )
}

fn rand01(h: u32) -> f32 {
    ((h & 0x00ff_ffff) as f32) / 16_777_215.0
}

fn fade(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn value_noise2(x: f32, y: f32, seed: u32) -> f32 {
    let xi = x.floor() as i32;
    let yi = y.floor() as i32;
    let u = fade(x - xi as f32);
    let v = fade(y - yi as f32);

    let h00 = rand01(hash2(xi, yi, seed));
    let h10 = rand01(hash2(xi + 1, yi, seed));
    let h01 = rand01(hash2(xi, yi + 1, seed));
    let h11 = rand01(hash2(xi + 1, yi + 1, seed));

    lerp(lerp(h00, h10, u), lerp(h01, h11, u), v)
}

fn value_noise3(x: f32, y: f32, z: f32, seed: u32) -> f32 {
    let xi = x.floor() as i32;
    let yi = y.floor() as i32;
    let zi = z.floor() as i32;
    let u = fade(x - xi as f32);
    let v = fade(y - yi as f32);
    let w = fade(z - zi as f32);

    let corner = |dx: i32, dy: i32, dz: i32| rand01(hash3(xi + dx, yi + dy, zi + dz, seed));

    let x00 = lerp(corner(0, 0, 0), corner(1, 0, 0), u);
    let x10 = lerp(corner(0, 1, 0), corner(1, 1, 0), u);
    let x01 = lerp(corner(0, 0, 1), corner(1, 0, 1), u);
    let x11 = lerp(corner(0, 1, 1), corner(1, 1, 1), u);

    lerp(lerp(x00, x10, v), lerp(x01, x11, v), w)
}

fn value_noise4(x: f32, y: f32, z: f32, w: f32, seed: u32) -> f32 {
    let xi = x.floor() as i32;
    let yi = y.floor() as i32;
    let zi = z.floor() as i32;
    let wi = w.floor() as i32;
    let fu = fade(x - xi as f32);
    let fv = fade(y - yi as f32);
    let fw = fade(z - zi as f32);
    let ft = fade(w - wi as f32);

    let corner =
        |dx: i32, dy: i32, dz: i32, dw: i32| rand01(hash4(xi + dx, yi + dy, zi + dz, wi + dw, seed));

    let blend_w = |dw: i32| {
        let x00 = lerp(corner(0, 0, 0, dw), corner(1, 0, 0, dw), fu);
        let x10 = lerp(corner(0, 1, 0, dw), corner(1, 1, 0, dw), fu);
        let x01 = lerp(corner(0, 0, 1, dw), corner(1, 0, 1, dw), fu);
        let x11 = lerp(corner(0, 1, 1, dw), corner(1, 1, 1, dw), fu);
        lerp(lerp(x00, x10, fv), lerp(x01, x11, fv), fw)
    };

    let near = blend_w(0);
    let far = blend_w(1);
    lerp(near, far, ft)
}

/// Deterministic coherent-noise field for a fixed seed.
pub struct Noise {
    seed: u32,
}

impl Noise {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    /// One layer of noise in [-1, 1] at the given 2/3/4-dimensional point.
    fn layer(&self, coords: &[f32], seed: u32) -> f32 {
        let n = match *coords {
            [x, y] => value_noise2(x, y, seed),
            [x, y, z] => value_noise3(x, y, z, seed),
            [x, y, z, w] => value_noise4(x, y, z, w, seed),
            _ => panic!("noise arity {} unsupported (want 2, 3 or 4)", coords.len()),
        };
        n * 2.0 - 1.0
    }

    /// Multi-octave fractal sum. Layer `i` samples at
    /// `frequency * lacunarity^i` with amplitude `amplitude * gain^i`.
    ///
    /// The result is not normalized or clamped; its magnitude is bounded by
    /// the sum of per-octave amplitudes, and callers map it to their display
    /// range.
    pub fn fbm(
        &self,
        coords: &[f32],
        frequency: f32,
        amplitude: f32,
        octaves: u32,
        lacunarity: f32,
        gain: f32,
    ) -> f32 {
        let mut freq = frequency;
        let mut amp = amplitude;
        let mut sum = 0.0;
        let mut scaled = [0.0f32; 4];

        for i in 0..octaves {
            let seed = self.seed.wrapping_add(i.wrapping_mul(1013));
            for (s, &c) in scaled.iter_mut().zip(coords.iter()) {
                *s = c * freq;
            }
            sum += self.layer(&scaled[..coords.len()], seed) * amp;
            freq *= lacunarity;
            amp *= gain;
        }
        sum
    }
}
