use rand::Rng;

/// Discrete weighted distribution over arbitrary values.
///
/// Entries keep insertion order and cumulative weights are strictly
/// increasing, so a fixed random stream reproduces the same sequence of picks
/// for the same build order. Built once at animation start, append-only.
pub struct WeightedSampler<T> {
    entries: Vec<Entry<T>>,
    total: f64,
}

struct Entry<T> {
    value: T,
    cumulative: f64,
}

impl<T> WeightedSampler<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            total: 0.0,
        }
    }

    /// Append a value with the given weight. Chains.
    pub fn put(&mut self, value: T, weight: f64) -> &mut Self {
        self.total += weight;
        self.entries.push(Entry {
            value,
            cumulative: self.total,
        });
        self
    }

    /// Append with weight 1.
    pub fn put1(&mut self, value: T) -> &mut Self {
        self.put(value, 1.0)
    }

    /// Draw a value with probability proportional to its weight.
    ///
    /// Panics if the cumulative weights have drifted out of sync with the
    /// total (a programming error) or the sampler is empty.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> &T {
        let draw = rng.gen::<f64>() * self.total;
        for e in &self.entries {
            if draw < e.cumulative {
                return &e.value;
            }
        }
        panic!("weighted sampler cumulative weights inconsistent with total");
    }

    /// Draw a value uniformly, ignoring weights.
    pub fn uniform_sample<R: Rng>(&self, rng: &mut R) -> &T {
        &self.entries[rng.gen_range(0..self.entries.len())].value
    }

    /// The i-th inserted value.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index).map(|e| &e.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: PartialEq> WeightedSampler<T> {
    /// Index of the first entry equal to `value`, if any.
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.entries.iter().position(|e| &e.value == value)
    }
}

impl<T> Default for WeightedSampler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn put_get_roundtrip() {
        let mut s = WeightedSampler::new();
        s.put("a", 1.0).put("b", 3.0).put1("c");
        assert_eq!(s.len(), 3);
        assert_eq!(s.get(0), Some(&"a"));
        assert_eq!(s.get(1), Some(&"b"));
        assert_eq!(s.get(2), Some(&"c"));
        assert_eq!(s.get(3), None);
        assert_eq!(s.index_of(&"b"), Some(1));
        assert_eq!(s.index_of(&"z"), None);
    }

    #[test]
    fn index_of_roundtrips_unique_values() {
        let mut s = WeightedSampler::new();
        for v in 0..10 {
            s.put(v, (v + 1) as f64);
        }
        for i in 0..10 {
            assert_eq!(s.index_of(s.get(i).unwrap()), Some(i));
        }
    }

    #[test]
    fn weighted_draws_respect_ratio() {
        let mut s = WeightedSampler::new();
        s.put('a', 1.0).put('b', 3.0);
        let mut rng = StdRng::seed_from_u64(42);
        let mut b_count = 0usize;
        let n = 10_000;
        for _ in 0..n {
            if *s.sample(&mut rng) == 'b' {
                b_count += 1;
            }
        }
        // Expect ~7500 within a ±10% band.
        assert!(b_count > 6750 && b_count < 8250, "b drawn {b_count} times");
    }

    #[test]
    fn uniform_sample_ignores_weights() {
        let mut s = WeightedSampler::new();
        s.put('a', 1000.0).put('b', 0.001);
        let mut rng = StdRng::seed_from_u64(7);
        let mut b_count = 0usize;
        for _ in 0..10_000 {
            if *s.uniform_sample(&mut rng) == 'b' {
                b_count += 1;
            }
        }
        assert!(b_count > 4000 && b_count < 6000);
    }
}
