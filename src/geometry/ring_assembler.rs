//! Joins coordinate chains that share endpoints into maximal chains.
//!
//! Chains are matched on exact coordinate equality. Every chain is used at most
//! once; when several chains meet at one endpoint the lowest-index one wins.

use std::collections::{BTreeSet, HashMap};

use log::trace;

use crate::data::Coordinate;

use super::is_closed;

type EndpointIndex = HashMap<Coordinate, BTreeSet<usize>>;

struct Endpoints {
    by_start: EndpointIndex,
    by_end: EndpointIndex,
}

impl Endpoints {
    fn new(chains: &[Vec<Coordinate>]) -> Self {
        let mut by_start: EndpointIndex = HashMap::new();
        let mut by_end: EndpointIndex = HashMap::new();
        for (id, chain) in chains.iter().enumerate() {
            if let (Some(first), Some(last)) = (chain.first(), chain.last()) {
                by_start.entry(*first).or_default().insert(id);
                by_end.entry(*last).or_default().insert(id);
            }
        }
        Endpoints { by_start, by_end }
    }

    fn consume(&mut self, id: usize, chain: &[Coordinate]) {
        if let (Some(first), Some(last)) = (chain.first(), chain.last()) {
            Self::remove(&mut self.by_start, first, id);
            Self::remove(&mut self.by_end, last, id);
        }
    }

    fn remove(index: &mut EndpointIndex, key: &Coordinate, id: usize) {
        if let Some(ids) = index.get_mut(key) {
            ids.remove(&id);
            if ids.is_empty() {
                index.remove(key);
            }
        }
    }

    fn first_starting_at(&self, key: &Coordinate) -> Option<usize> {
        self.by_start.get(key).and_then(|ids| ids.iter().next().copied())
    }

    fn first_ending_at(&self, key: &Coordinate) -> Option<usize> {
        self.by_end.get(key).and_then(|ids| ids.iter().next().copied())
    }
}

/// Merges `chains` into closed rings where possible. Chains that cannot be
/// closed are returned as the longest chain the greedy walk reached.
pub fn assemble_rings(chains: &[Vec<Coordinate>]) -> Vec<Vec<Coordinate>> {
    let mut endpoints = Endpoints::new(chains);
    let mut consumed = vec![false; chains.len()];
    let mut assembled = Vec::new();

    for seed_id in 0..chains.len() {
        if consumed[seed_id] || chains[seed_id].is_empty() {
            continue;
        }
        consumed[seed_id] = true;
        endpoints.consume(seed_id, &chains[seed_id]);
        let mut ring = chains[seed_id].clone();
        let mut joined = 1;

        while !is_closed(&ring) {
            let Some((id, step)) = next_step(&endpoints, &ring) else {
                break;
            };
            consumed[id] = true;
            endpoints.consume(id, &chains[id]);
            step.apply(&mut ring, &chains[id]);
            joined += 1;
        }

        trace!(chains = joined, closed = is_closed(&ring); "Assembled chain");
        assembled.push(ring);
    }

    assembled
}

enum Step {
    Append,
    AppendReversed,
    Prepend,
    PrependReversed,
}

impl Step {
    fn apply(&self, ring: &mut Vec<Coordinate>, chain: &[Coordinate]) {
        match self {
            Step::Append => ring.extend(chain.iter().skip(1).copied()),
            Step::AppendReversed => ring.extend(chain.iter().rev().skip(1).copied()),
            Step::Prepend => {
                let mut joined: Vec<Coordinate> = chain[..chain.len() - 1].to_vec();
                joined.append(ring);
                *ring = joined;
            }
            Step::PrependReversed => {
                let mut joined: Vec<Coordinate> = chain.iter().rev().take(chain.len() - 1).copied().collect();
                joined.append(ring);
                *ring = joined;
            }
        }
    }
}

fn next_step(endpoints: &Endpoints, ring: &[Coordinate]) -> Option<(usize, Step)> {
    let start = ring.first()?;
    let end = ring.last()?;
    if let Some(id) = endpoints.first_starting_at(end) {
        return Some((id, Step::Append));
    }
    if let Some(id) = endpoints.first_ending_at(end) {
        return Some((id, Step::AppendReversed));
    }
    if let Some(id) = endpoints.first_ending_at(start) {
        return Some((id, Step::Prepend));
    }
    if let Some(id) = endpoints.first_starting_at(start) {
        return Some((id, Step::PrependReversed));
    }
    None
}
