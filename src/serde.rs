//! # Serde module for LinearCounter
//!
//! This module provides serde-based (serialization and deserialization) features for
//! `LinearCounter`, so an open window's estimator can be snapshotted and restored.
//!
//! `LinearCounter` is serialized as a tuple `(capacity, words)`, where `words` holds the
//! bitmap packed into `u64` words. The unset cell counter is not serialized; it is
//! recomputed on deserialization after the words are validated against `capacity`.
//!
//! Window configuration and results derive serde traits directly in `window`.
use std::hash::Hasher;

use serde::de::Error;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize};

use crate::estimator::LinearCounter;

impl<H: Hasher + Default> Serialize for LinearCounter<H> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut tup = serializer.serialize_tuple(2)?;
        tup.serialize_element(&self.capacity())?;
        tup.serialize_element(self.words())?;
        tup.end()
    }
}

impl<'de, H: Hasher + Default> Deserialize<'de> for LinearCounter<H> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let (capacity, words): (usize, Vec<u64>) = Deserialize::deserialize(deserializer)?;
        LinearCounter::from_words(capacity, words).map_err(D::Error::custom)
    }
}
