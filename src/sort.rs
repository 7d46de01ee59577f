//! Output ordering of content entries.
//!
//! Entries that are not cross-reference targets come first, then targets;
//! within each group entries are ordered by tag, compared byte by byte. The
//! sort is a Hoare-partition quicksort with a random pivot. The pivot RNG is
//! seeded from the configuration, so a given input always comes out in the
//! same order even though entries with equal keys are not kept stable.

use crate::types::Entry;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;

/// Sort `entries` in place and remap their `crossref` indices.
pub fn sort_entries(entries: &mut Vec<Entry>, seed: u64) {
    let mut order: Vec<usize> = (0..entries.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    {
        let compare = |a: usize, b: usize| compare_entries(&entries[a], &entries[b]);
        quicksort(&mut order, &compare, &mut rng);
    }

    let mut new_index = vec![0; order.len()];
    for (new, &old) in order.iter().enumerate() {
        new_index[old] = new;
    }
    let mut slots = std::mem::take(entries);
    *entries = order
        .iter()
        .map(|&old| std::mem::take(&mut slots[old]))
        .collect();
    for entry in entries.iter_mut() {
        entry.crossref = entry.crossref.map(|k| new_index[k]);
    }
}

/// Non-targets before targets, then by tag bytes.
pub fn compare_entries(a: &Entry, b: &Entry) -> Ordering {
    a.is_crossref_target
        .cmp(&b.is_crossref_target)
        .then_with(|| a.tag.as_bytes().cmp(b.tag.as_bytes()))
}

fn quicksort<F>(v: &mut [usize], compare: &F, rng: &mut StdRng)
where
    F: Fn(usize, usize) -> Ordering,
{
    if v.len() < 2 {
        return;
    }
    let pick = rng.gen_range(0..v.len());
    v.swap(0, pick);
    let split = partition(v, compare);
    let (low, high) = v.split_at_mut(split + 1);
    quicksort(low, compare, rng);
    quicksort(high, compare, rng);
}

/// Hoare partition around `v[0]`. Returns `j < v.len() - 1` such that
/// everything in `v[..=j]` sorts no later than everything in `v[j + 1..]`.
fn partition<F>(v: &mut [usize], compare: &F) -> usize
where
    F: Fn(usize, usize) -> Ordering,
{
    let pivot = v[0];
    let (mut i, mut j) = (0, v.len() - 1);
    loop {
        while compare(v[i], pivot) == Ordering::Less {
            i += 1;
        }
        while compare(v[j], pivot) == Ordering::Greater {
            j -= 1;
        }
        if i >= j {
            return j;
        }
        v.swap(i, j);
        i += 1;
        j -= 1;
    }
}
