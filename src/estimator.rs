//! Linear counting estimator allows to estimate number of distinct elements
//! added to it using a fixed-size bitmap of `m` cells, where `m` is the
//! `capacity` chosen at construction.
//!
//! # Data-structure design rationale
//!
//! ## Fixed memory footprint
//! Memory is `ceil(m / 64)` `u64` words plus a few machine words of header,
//! regardless of how many items (distinct or not) are added.
//! For `m = 60000` this is 7504 bytes of bitmap.
//!
//! ## Low latency
//! - Each item is hashed once and sets exactly one cell (`hash % m`).
//! - Number of unset cells is updated dynamically on every `false -> true`
//!   cell transition, so `estimate` never scans the bitmap.
//!
//! ## Accuracy
//! Estimate is computed with the linear counting formula:
//!
//! `n = -m * ln(u / m)`, where `u` is the number of unset cells.
//!
//! Accuracy degrades as the fill ratio approaches 100%. Keep the expected
//! number of distinct items per bitmap below ~50-70% of `m`. Once every cell
//! is set the formula is undefined and `estimate` returns `Error::Saturated`.
//!
//! Paper: https://dl.acm.org/doi/10.1145/78922.78925
use std::fmt::{Debug, Formatter};
use std::hash::{BuildHasher, BuildHasherDefault, Hash, Hasher};
use std::mem::{size_of, size_of_val};

use wyhash::WyHash;

use crate::error::{Error, Result};

/// Number of bitmap cells stored per word
const WORD_BITS: usize = u64::BITS as usize;

pub struct LinearCounter<H: Hasher + Default = WyHash> {
    /// Number of bitmap cells (`m`)
    capacity: usize,
    /// Number of cells still unset
    unset: usize,
    /// Bitmap cells packed into `u64` words
    words: Box<[u64]>,
    /// Zero-sized build hasher
    build_hasher: BuildHasherDefault<H>,
}

impl<H: Hasher + Default> LinearCounter<H> {
    /// Creates new `LinearCounter` with `capacity` unset cells
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity { capacity });
        }
        Ok(Self {
            capacity,
            unset: capacity,
            words: vec![0u64; capacity.div_ceil(WORD_BITS)].into_boxed_slice(),
            build_hasher: BuildHasherDefault::default(),
        })
    }

    /// Rebuild `LinearCounter` from raw bitmap words, validating them against `capacity`.
    pub fn from_words(capacity: usize, words: Vec<u64>) -> Result<Self> {
        let mut counter = Self::new(capacity)?;
        if words.len() != counter.words.len() {
            return Err(Error::InvalidBitmap {
                capacity,
                words: words.len(),
            });
        }
        // cells at or beyond `capacity` in the last word must never be set
        let tail = capacity % WORD_BITS;
        if tail != 0 && words[words.len() - 1] >> tail != 0 {
            return Err(Error::InvalidBitmap {
                capacity,
                words: words.len(),
            });
        }
        let set: usize = words.iter().map(|w| w.count_ones() as usize).sum();
        counter.unset = capacity - set;
        counter.words = words.into_boxed_slice();
        Ok(counter)
    }

    /// Add a string item, typically a user identifier
    #[inline]
    pub fn add(&mut self, item: &str) {
        self.insert(item);
    }

    /// Insert a hashable item into `LinearCounter`
    #[inline]
    pub fn insert<T: Hash + ?Sized>(&mut self, item: &T) {
        let mut hasher = self.build_hasher.build_hasher();
        item.hash(&mut hasher);
        let hash = hasher.finish();
        self.insert_hash(hash);
    }

    /// Insert hash into `LinearCounter`
    #[inline]
    pub fn insert_hash(&mut self, hash: u64) {
        let idx = (hash % self.capacity as u64) as usize;
        let word = &mut self.words[idx / WORD_BITS];
        let mask = 1u64 << (idx % WORD_BITS);
        self.unset -= usize::from(*word & mask == 0);
        *word |= mask;
    }

    /// Return cardinality estimate.
    ///
    /// Returns `0.0` for an empty bitmap and `Error::Saturated` once all cells are set.
    #[inline]
    pub fn estimate(&self) -> Result<f64> {
        if self.unset == self.capacity {
            return Ok(0.0);
        }
        if self.unset == 0 {
            return Err(Error::Saturated {
                capacity: self.capacity,
            });
        }
        let m = self.capacity as f64;
        Ok(-m * (self.unset as f64 / m).ln())
    }

    /// Estimate with exactly one unset cell, i.e. `m * ln(m)`.
    /// A saturated bitmap has seen at least about this many distinct items.
    #[inline]
    pub fn saturation_lower_bound(&self) -> f64 {
        let m = self.capacity as f64;
        m * m.ln()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn unset_count(&self) -> usize {
        self.unset
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.unset == self.capacity
    }

    #[inline]
    pub fn is_saturated(&self) -> bool {
        self.unset == 0
    }

    /// Share of cells set, in `[0.0, 1.0]`
    #[inline]
    pub fn fill_ratio(&self) -> f64 {
        (self.capacity - self.unset) as f64 / self.capacity as f64
    }

    /// Return underlying bitmap words
    #[inline]
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Return memory size of `LinearCounter`
    pub fn size_of(&self) -> usize {
        size_of::<Self>() + size_of_val(&*self.words)
    }
}

impl<H: Hasher + Default> Clone for LinearCounter<H> {
    fn clone(&self) -> Self {
        Self {
            capacity: self.capacity,
            unset: self.unset,
            words: self.words.clone(),
            build_hasher: BuildHasherDefault::default(),
        }
    }
}

impl<H: Hasher + Default> PartialEq for LinearCounter<H> {
    /// Compare linear counters
    fn eq(&self, rhs: &Self) -> bool {
        self.capacity == rhs.capacity && self.words == rhs.words
    }
}

impl<H: Hasher + Default> Debug for LinearCounter<H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.estimate() {
            Ok(estimate) => write!(
                f,
                "{{ capacity: {}, unset: {}, estimate: {:.2} }}",
                self.capacity, self.unset, estimate
            ),
            Err(_) => write!(
                f,
                "{{ capacity: {}, unset: {}, estimate: saturated }}",
                self.capacity, self.unset
            ),
        }
    }
}
