//! Enumeration of parameter combinations.
//!
//! The grid nests shape outermost, then particle count, then `lambda`, with
//! `c` varying fastest. Summary rows come out in exactly this order.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{grid_size, IntRange, RealRange, SweepConfig};

/// One point of the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterCombination {
    /// Number of particles in the system.
    pub particle_count: i64,
    /// Bias parameter.
    pub lambda: f64,
    /// Shortcut constant.
    pub c: f64,
    /// Shape selector.
    pub shape: i64,
}

impl fmt::Display for ParameterCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(particles={}, lambda={}, c={}, shape={})",
            self.particle_count, self.lambda, self.c, self.shape
        )
    }
}

/// Cartesian product of the configured ranges.
#[derive(Debug, Clone)]
pub struct SweepGrid {
    shapes: IntRange,
    particles: IntRange,
    lambda: RealRange,
    c: RealRange,
}

impl SweepGrid {
    /// Build the grid described by `config`.
    pub fn new(config: &SweepConfig) -> Self {
        Self {
            shapes: config.shapes,
            particles: config.particles,
            lambda: config.lambda,
            c: config.c,
        }
    }

    /// Total number of combinations.
    ///
    /// Saturates at `usize::MAX`; [`SweepConfig::validate`] rejects such grids.
    pub fn len(&self) -> usize {
        grid_size(&self.shapes, &self.particles, &self.lambda, &self.c).unwrap_or(usize::MAX)
    }

    /// Whether the grid has no combinations.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Combinations in enumeration order.
    pub fn iter(&self) -> SweepGridIter<'_> {
        SweepGridIter {
            grid: self,
            index: 0,
            len: self.len(),
        }
    }
}

impl<'a> IntoIterator for &'a SweepGrid {
    type Item = ParameterCombination;
    type IntoIter = SweepGridIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`SweepGrid`].
#[derive(Debug)]
pub struct SweepGridIter<'a> {
    grid: &'a SweepGrid,
    index: usize,
    len: usize,
}

impl Iterator for SweepGridIter<'_> {
    type Item = ParameterCombination;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.len {
            return None;
        }
        let g = self.grid;
        // Mixed-radix decode, c is the least significant digit.
        let mut rest = self.index;
        let c = rest % g.c.count();
        rest /= g.c.count();
        let lambda = rest % g.lambda.count();
        rest /= g.lambda.count();
        let particles = rest % g.particles.count();
        let shape = rest / g.particles.count();
        self.index += 1;

        Some(ParameterCombination {
            particle_count: g.particles.at(particles),
            lambda: g.lambda.at(lambda),
            c: g.c.at(c),
            shape: g.shapes.at(shape),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SweepGridIter<'_> {}
