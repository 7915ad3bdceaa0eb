//! Net derivation
//!
//! Connections that share an endpoint are electrically one net. Groups are
//! ordered by the first appearance of any member, members likewise.

use std::collections::HashMap;

use petgraph::unionfind::UnionFind;

use crate::connections::{Connection, Endpoint};

pub fn derive_nets(connections: &[Connection]) -> Vec<Vec<Endpoint>> {
    let mut endpoints: Vec<&Endpoint> = Vec::new();
    let mut index: HashMap<&Endpoint, usize> = HashMap::new();

    for c in connections {
        for e in [&c.from, &c.to] {
            index.entry(e).or_insert_with(|| {
                endpoints.push(e);
                endpoints.len() - 1
            });
        }
    }

    let mut sets = UnionFind::<usize>::new(endpoints.len());
    for c in connections {
        sets.union(index[&c.from], index[&c.to]);
    }

    let mut group_of_root: HashMap<usize, usize> = HashMap::new();
    let mut nets: Vec<Vec<Endpoint>> = Vec::new();
    for (i, endpoint) in endpoints.iter().enumerate() {
        let root = sets.find(i);
        let group = *group_of_root.entry(root).or_insert_with(|| {
            nets.push(Vec::new());
            nets.len() - 1
        });
        nets[group].push((*endpoint).clone());
    }
    nets
}
