//! Lazy grid enumeration over a sweep space

use super::config::Configuration;
use super::error::{Result, SweepError};
use super::space::{ParameterValue, SweepSpace};

/// Exhaustive grid over a [`SweepSpace`].
///
/// Domains are expanded once at construction; configurations are produced
/// lazily by a mixed-radix counter, so the full Cartesian product is never
/// materialized. The first-added parameter varies slowest.
#[derive(Debug, Clone)]
pub struct GridSweep {
    axes: Vec<(String, Vec<ParameterValue>)>,
}

impl GridSweep {
    /// Expand `space` into grid axes.
    ///
    /// `n_points` controls how finely `Continuous` domains are sampled.
    /// A domain that expands to no values fails with
    /// [`SweepError::EmptyDomain`].
    pub fn new(space: &SweepSpace, n_points: usize) -> Result<Self> {
        let mut axes = Vec::with_capacity(space.len());
        for (name, domain) in space.iter() {
            let values = domain.grid_values(n_points);
            if values.is_empty() {
                return Err(SweepError::EmptyDomain(name.clone()));
            }
            axes.push((name.clone(), values));
        }
        Ok(Self { axes })
    }

    /// Total number of configurations in the grid
    pub fn len(&self) -> usize {
        self.axes.iter().map(|(_, v)| v.len()).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the grid from the start
    pub fn iter(&self) -> GridIter<'_> {
        GridIter { axes: &self.axes, index: vec![0; self.axes.len()], remaining: self.len() }
    }
}

impl<'a> IntoIterator for &'a GridSweep {
    type Item = Configuration;
    type IntoIter = GridIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Mixed-radix counter over the grid axes
pub struct GridIter<'a> {
    axes: &'a [(String, Vec<ParameterValue>)],
    index: Vec<usize>,
    remaining: usize,
}

impl Iterator for GridIter<'_> {
    type Item = Configuration;

    fn next(&mut self) -> Option<Configuration> {
        if self.remaining == 0 {
            return None;
        }
        let values = self
            .axes
            .iter()
            .zip(self.index.iter())
            .map(|((name, axis), &i)| (name.clone(), axis[i].clone()))
            .collect();
        self.remaining -= 1;

        // advance the counter, last axis fastest
        for pos in (0..self.index.len()).rev() {
            self.index[pos] += 1;
            if self.index[pos] < self.axes[pos].1.len() {
                break;
            }
            self.index[pos] = 0;
        }
        Some(Configuration::new(values))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for GridIter<'_> {}
