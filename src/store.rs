//! Storage for sampled resolution values and the compressed output profile.
//!
//! The store keys records by the *exact* floating-point resolution value.
//! Deduplication of repeated midpoints relies on bitwise equality of the
//! computed values (geometric and arithmetic means may or may not recur
//! exactly). An epsilon-tolerant lookup would change which resolutions get
//! re-evaluated, so the exact-key semantics are deliberate.

use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Map key wrapping a resolution value with a total order.
///
/// Ordering is `f64::total_cmp`, so lookups are exact-bit-pattern equality.
#[derive(Debug, Clone, Copy)]
struct Resolution(f64);

impl PartialEq for Resolution {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for Resolution {}

impl PartialOrd for Resolution {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Resolution {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Outcome of one oracle evaluation: the partition and its scalar summary.
#[derive(Debug, Clone)]
pub struct BisectRecord<P> {
    pub partition: P,
    pub bisect_value: f64,
}

/// All resolution values sampled so far, keyed by exact value.
///
/// Lives for the duration of one scan; the final consumer reads it sorted
/// ascending by resolution.
#[derive(Debug, Clone)]
pub struct ProfileStore<P> {
    records: BTreeMap<Resolution, BisectRecord<P>>,
}

impl<P> Default for ProfileStore<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> ProfileStore<P> {
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exact-key membership test; see the module note on float equality.
    pub fn contains(&self, resolution: f64) -> bool {
        self.records.contains_key(&Resolution(resolution))
    }

    pub fn get(&self, resolution: f64) -> Option<&BisectRecord<P>> {
        self.records.get(&Resolution(resolution))
    }

    pub fn bisect_value_at(&self, resolution: f64) -> Option<f64> {
        self.get(resolution).map(|rec| rec.bisect_value)
    }

    /// Insert or overwrite the record at `resolution`.
    pub fn insert(&mut self, resolution: f64, record: BisectRecord<P>) {
        self.records.insert(Resolution(resolution), record);
    }

    /// Atomic get-or-insert: produce a record with `make` only when
    /// `resolution` is not already a key.
    ///
    /// Returns the stored record and whether it was inserted by this call.
    /// A failing `make` leaves the store untouched.
    pub fn get_or_try_insert_with<E, F>(
        &mut self,
        resolution: f64,
        make: F,
    ) -> Result<(&BisectRecord<P>, bool), E>
    where
        F: FnOnce() -> Result<BisectRecord<P>, E>,
    {
        use std::collections::btree_map::Entry;
        match self.records.entry(Resolution(resolution)) {
            Entry::Occupied(slot) => Ok((slot.into_mut(), false)),
            Entry::Vacant(slot) => Ok((slot.insert(make()?), true)),
        }
    }

    /// Records in ascending resolution order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &BisectRecord<P>)> {
        self.records.iter().map(|(key, rec)| (key.0, rec))
    }
}

impl<P: Clone> ProfileStore<P> {
    /// Repair violations of the non-increasing assumption relative to the
    /// record at `new_key`.
    ///
    /// For every other stored key `r`: a lower resolution showing a lower
    /// value than `new_key`, or a higher resolution showing a higher value,
    /// gets its record overwritten wholesale with the one at `new_key`.
    ///
    /// This is a local, one-shot repair seeded at the newly inserted key. It
    /// does not re-scan all pairs, so a later insertion can reintroduce a
    /// violation between two older keys that were never directly compared.
    /// Callers needing strict global monotonicity must post-process.
    pub fn enforce_monotonic(&mut self, new_key: f64) {
        let reference = match self.records.get(&Resolution(new_key)) {
            Some(rec) => rec.clone(),
            None => return,
        };
        let stale: Vec<Resolution> = self
            .records
            .iter()
            .filter(|(key, rec)| {
                if key.0 < new_key {
                    rec.bisect_value < reference.bisect_value
                } else if key.0 > new_key {
                    rec.bisect_value > reference.bisect_value
                } else {
                    false
                }
            })
            .map(|(key, _)| *key)
            .collect();
        for key in stale {
            self.records.insert(key, reference.clone());
        }
    }

    /// Collapse the store into the minimal stepwise representation.
    ///
    /// Walks entries ascending and drops every entry whose bisect value
    /// equals its predecessor's: the partition associated with the earlier
    /// key remains valid up to the next actual change.
    pub fn into_stepwise(self) -> StepwiseProfile<P> {
        let mut steps = Vec::with_capacity(self.records.len());
        let mut previous: Option<f64> = None;
        for (key, record) in self.records {
            let keep = previous != Some(record.bisect_value);
            previous = Some(record.bisect_value);
            if keep {
                steps.push(ProfileStep {
                    resolution: key.0,
                    bisect_value: record.bisect_value,
                    partition: record.partition,
                });
            }
        }
        StepwiseProfile { steps }
    }
}

/// One breakpoint of the compressed profile.
#[derive(Debug, Clone)]
pub struct ProfileStep<P> {
    pub resolution: f64,
    pub bisect_value: f64,
    pub partition: P,
}

/// The compressed scan result: breakpoints in ascending resolution order,
/// each valid up to the next breakpoint.
///
/// Bisect values are non-increasing in resolution on a best-effort basis
/// only (see [`ProfileStore::enforce_monotonic`]).
#[derive(Debug, Clone)]
pub struct StepwiseProfile<P> {
    steps: Vec<ProfileStep<P>>,
}

impl<P> StepwiseProfile<P> {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[ProfileStep<P>] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProfileStep<P>> {
        self.steps.iter()
    }

    /// The step governing `resolution`: the last breakpoint at or below it.
    ///
    /// Returns `None` below the first breakpoint.
    pub fn step_at(&self, resolution: f64) -> Option<&ProfileStep<P>> {
        let idx = self
            .steps
            .partition_point(|step| step.resolution <= resolution);
        idx.checked_sub(1).map(|i| &self.steps[i])
    }
}

impl<P> IntoIterator for StepwiseProfile<P> {
    type Item = ProfileStep<P>;
    type IntoIter = std::vec::IntoIter<ProfileStep<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}
