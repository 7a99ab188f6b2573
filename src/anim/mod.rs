//! The animation catalog: every simulation, with its rotation weight.

pub mod adhesion;
pub mod automata;
pub mod crystal;
pub mod flow;
pub mod fluid;
pub mod grayscott;
pub mod ising;
pub mod polytope;

use crate::context::Animation;
use crate::sampler::WeightedSampler;
use rand::Rng;

pub struct Entry {
    pub name: &'static str,
    pub build: fn() -> Box<dyn Animation>,
}

/// Named animation constructors with relative selection weights. The driver
/// draws from this between runs; a valid requested index short-circuits the
/// draw.
pub struct Catalog {
    entries: WeightedSampler<Entry>,
}

impl Catalog {
    pub fn standard() -> Self {
        let mut entries = WeightedSampler::new();
        entries
            .put(
                Entry {
                    name: "automata",
                    build: || Box::new(automata::Automata::new()),
                },
                3.0,
            )
            .put(
                Entry {
                    name: "grayscott",
                    build: || Box::new(grayscott::GrayScott::new()),
                },
                2.0,
            )
            .put(
                Entry {
                    name: "ising",
                    build: || Box::new(ising::Ising::new()),
                },
                1.5,
            )
            .put(
                Entry {
                    name: "adhesion",
                    build: || Box::new(adhesion::Adhesion::new()),
                },
                1.5,
            )
            .put(
                Entry {
                    name: "fluid",
                    build: || Box::new(fluid::Fluid::new()),
                },
                2.0,
            )
            .put(
                Entry {
                    name: "polytope",
                    build: || Box::new(polytope::Polytope::new()),
                },
                2.0,
            )
            .put(
                Entry {
                    name: "crystal",
                    build: || Box::new(crystal::Crystal::new()),
                },
                1.5,
            )
            .put(
                Entry {
                    name: "flow",
                    build: || Box::new(flow::Flow::new()),
                },
                2.0,
            );
        Self { entries }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        (0..self.entries.len()).filter_map(|i| self.entries.get(i).map(|e| e.name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn index_of_name(&self, name: &str) -> Option<usize> {
        (0..self.entries.len()).find(|&i| {
            self.entries.get(i).map(|e| e.name) == Some(name)
        })
    }

    /// A valid `index` wins; anything else falls back to a weighted draw.
    pub fn pick<R: Rng>(&self, rng: &mut R, index: Option<usize>) -> &Entry {
        match index.and_then(|i| self.entries.get(i)) {
            Some(entry) => entry,
            None => self.entries.sample(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn lookup_by_name_and_index_agree() {
        let catalog = Catalog::standard();
        assert!(!catalog.is_empty());
        for (i, name) in catalog.names().enumerate() {
            assert_eq!(catalog.index_of_name(name), Some(i));
            assert_eq!(catalog.get(i).map(|e| e.name), Some(name));
        }
        assert_eq!(catalog.index_of_name("no-such-animation"), None);
    }

    #[test]
    fn pick_prefers_valid_index() {
        let catalog = Catalog::standard();
        let mut rng = StdRng::seed_from_u64(3);
        let by_index = catalog.pick(&mut rng, Some(1));
        assert_eq!(Some(by_index.name), catalog.get(1).map(|e| e.name));
        // Out of range falls back to sampling instead of failing.
        let sampled = catalog.pick(&mut rng, Some(usize::MAX));
        assert!(catalog.index_of_name(sampled.name).is_some());
    }
}
