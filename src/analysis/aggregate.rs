use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::ingest::Observation;

/// Summed count and amount for one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub payment_count: i64,
    pub total_amount: i64,
}

impl Totals {
    pub const ZERO: Totals = Totals {
        payment_count: 0,
        total_amount: 0,
    };
}

/// Per-bucket totals across every country, ordered by bucket time.
#[derive(Debug, Default)]
pub struct BucketTotals {
    buckets: BTreeMap<DateTime<Utc>, Totals>,
}

impl BucketTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert-or-update: the first row for a bucket starts from zero.
    pub fn add(&mut self, obs: &Observation) {
        let slot = self.buckets.entry(obs.timestamp).or_insert(Totals::ZERO);
        slot.payment_count += obs.payment_count;
        slot.total_amount += obs.total_amount;
    }

    pub fn get(&self, t: &DateTime<Utc>) -> Option<Totals> {
        self.buckets.get(t).copied()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// One synthetic observation per bucket with an empty country label.
    pub fn into_observations(self) -> Vec<Observation> {
        self.buckets
            .into_iter()
            .map(|(timestamp, totals)| Observation {
                country_code: String::new(),
                timestamp,
                payment_count: totals.payment_count,
                total_amount: totals.total_amount,
            })
            .collect()
    }
}

impl<'a> FromIterator<&'a Observation> for BucketTotals {
    fn from_iter<I: IntoIterator<Item = &'a Observation>>(iter: I) -> Self {
        let mut totals = Self::new();
        for obs in iter {
            totals.add(obs);
        }
        totals
    }
}

/// Collapse all countries into a single series keyed by bucket.
pub fn across_countries(data: &[Observation]) -> Vec<Observation> {
    data.iter().collect::<BucketTotals>().into_observations()
}
