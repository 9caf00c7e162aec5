//! Built-in visual patterns.
//!
//! A pattern is nothing more than a display name and a pair of GLSL ES 3.0
//! sources. Every vertex stage takes a `vec2 position` attribute and may
//! declare any of `time`, `resolution`, `u_speed`, `u_density` and `u_color`;
//! stages that leave one out simply ignore that setting.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    pub name: &'static str,
    pub vertex_source: &'static str,
    pub fragment_source: &'static str,
}

const MATRIX: Pattern = Pattern {
    name: "Matrix Digital Rain",
    vertex_source: include_str!("shaders/matrix.vert"),
    fragment_source: include_str!("shaders/soft_disc.frag"),
};

const VORTEX: Pattern = Pattern {
    name: "Cosmic Vortex",
    vertex_source: include_str!("shaders/vortex.vert"),
    fragment_source: include_str!("shaders/glow.frag"),
};

const AURORA: Pattern = Pattern {
    name: "Aurora Borealis",
    vertex_source: include_str!("shaders/aurora.vert"),
    fragment_source: include_str!("shaders/glow.frag"),
};

const GEOMETRIC: Pattern = Pattern {
    name: "Geometric Waves",
    vertex_source: include_str!("shaders/geometric.vert"),
    fragment_source: include_str!("shaders/hard_disc.frag"),
};

const GALAXY: Pattern = Pattern {
    name: "Particle Galaxy",
    vertex_source: include_str!("shaders/galaxy.vert"),
    fragment_source: include_str!("shaders/glow.frag"),
};

/// Ordered, immutable list of patterns. A pattern's identity is its index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRegistry {
    patterns: Vec<Pattern>,
}

impl PatternRegistry {
    pub fn new(patterns: Vec<Pattern>) -> Self {
        Self { patterns }
    }

    /// The five stock patterns, in navigation order.
    pub fn builtin() -> Self {
        Self::new(vec![MATRIX, VORTEX, AURORA, GEOMETRIC, GALAXY])
    }

    pub fn get(&self, index: usize) -> Result<&Pattern> {
        self.patterns.get(index).ok_or(Error::IndexOutOfRange {
            index,
            count: self.patterns.len(),
        })
    }

    pub fn count(&self) -> usize {
        self.patterns.len()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.patterns.iter().map(|p| p.name).collect()
    }

    /// Index after `index`, wrapping to the first pattern.
    pub fn next(&self, index: usize) -> usize {
        match self.count() {
            0 => 0,
            n => (index + 1) % n,
        }
    }

    /// Index before `index`, wrapping to the last pattern.
    pub fn previous(&self, index: usize) -> usize {
        match self.count() {
            0 => 0,
            n => (index % n + n - 1) % n,
        }
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
