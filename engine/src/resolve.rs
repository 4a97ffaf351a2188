// Licensed under the Apache-2.0 license

//! Address-to-chain resolution.
//!
//! Each level's children are pre-sorted by `range.start` and pairwise
//! disjoint, so a binary search finds the unique candidate per level and the
//! descent costs `depth * log(branching)`. An address nobody models resolves
//! to an empty chain; an address inside a reserved placeholder resolves to a
//! chain ending in that placeholder. Neither is an error.

use crate::map::{MemoryMap, Node, NodeIdx};

impl MemoryMap {
    /// Resolve an address to its root-to-leaf chain of enclosing nodes.
    ///
    /// The last element is the most specific match. The chain is empty when
    /// the address falls outside every top-level range.
    pub fn resolve(&self, address: u64) -> Vec<&Node> {
        self.resolve_idx(address)
            .into_iter()
            .map(|idx| &self.nodes[idx])
            .collect()
    }

    /// Index form of [`MemoryMap::resolve`].
    pub fn resolve_idx(&self, address: u64) -> Vec<NodeIdx> {
        let mut chain = Vec::new();
        let mut level: &[NodeIdx] = &self.roots;
        while let Some(idx) = self.find_containing(level, address) {
            chain.push(idx);
            level = &self.nodes[idx].children;
        }
        chain
    }

    /// Binary-search one sibling set for the range containing `address`.
    /// Disjointness guarantees at most one match: the candidate is the last
    /// sibling starting at or below the address.
    fn find_containing(&self, level: &[NodeIdx], address: u64) -> Option<NodeIdx> {
        let pos = level.partition_point(|&idx| self.nodes[idx].range.start <= address);
        let candidate = level[pos.checked_sub(1)?];
        self.nodes[candidate]
            .range
            .contains(address)
            .then_some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use crate::map::{MemoryMap, NodeKind};
    use chipmap_schema::node::{RawKind, RawNode};

    fn raw(id: &str, start: &str, end: &str, children: Vec<RawNode>) -> RawNode {
        RawNode {
            id: id.to_string(),
            name: id.to_uppercase(),
            start: start.to_string(),
            end: end.to_string(),
            kind: Some(if children.is_empty() {
                RawKind::Region
            } else {
                RawKind::Block
            }),
            children,
            ..Default::default()
        }
    }

    fn sample() -> MemoryMap {
        MemoryMap::build(&[
            raw(
                "low",
                "0x0000 0000",
                "0x0FFF FFFF",
                vec![
                    raw("low_a", "0x0000 0000", "0x0000 FFFF", vec![]),
                    raw("low_b", "0x0800 0000", "0x0807 FFFF", vec![]),
                ],
            ),
            raw(
                "high",
                "0x4000 0000",
                "0x4FFF FFFF",
                vec![raw(
                    "bus",
                    "0x4000 0000",
                    "0x4000 7FFF",
                    vec![raw("periph", "0x4000 0400", "0x4000 07FF", vec![])],
                )],
            ),
        ])
        .unwrap()
    }

    fn chain_ids(map: &MemoryMap, address: u64) -> Vec<String> {
        map.resolve(address).iter().map(|n| n.id.clone()).collect()
    }

    #[test]
    fn resolves_to_deepest_match() {
        let map = sample();
        assert_eq!(chain_ids(&map, 0x4000_0400), ["high", "bus", "periph"]);
        assert_eq!(chain_ids(&map, 0x4000_07FF), ["high", "bus", "periph"]);
    }

    #[test]
    fn stops_where_children_stop_modeling() {
        let map = sample();
        // Inside the bus but between its children.
        assert_eq!(chain_ids(&map, 0x4000_0000), ["high", "bus"]);
        // Inside the block but past the bus.
        assert_eq!(chain_ids(&map, 0x4000_8000), ["high"]);
    }

    #[test]
    fn boundary_addresses_are_inclusive() {
        let map = sample();
        assert_eq!(chain_ids(&map, 0x0000_0000), ["low", "low_a"]);
        assert_eq!(chain_ids(&map, 0x0000_FFFF), ["low", "low_a"]);
        assert_eq!(chain_ids(&map, 0x0001_0000), ["low"]);
    }

    #[test]
    fn unmodeled_addresses_resolve_empty() {
        let map = sample();
        // Gap between the two top-level ranges.
        assert!(map.resolve(0x2000_0000).is_empty());
        // Above the highest modeled end.
        assert!(map.resolve(0x5000_0000).is_empty());
    }

    #[test]
    fn reserved_leaf_is_a_normal_result() {
        let map = MemoryMap::build(&[RawNode {
            id: "hole".to_string(),
            name: "Reserved".to_string(),
            start: "0x6000 0000".to_string(),
            end: "0x9FFF FFFF".to_string(),
            kind: Some(RawKind::Reserved),
            ..Default::default()
        }])
        .unwrap();
        let chain = map.resolve(0x7000_0000);
        assert_eq!(chain.len(), 1);
        assert!(matches!(chain[0].kind, NodeKind::Reserved));
    }
}
