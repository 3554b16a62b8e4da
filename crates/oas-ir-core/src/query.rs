//! Queries over compiled node sequences.
//!
//! Both functions share one pre-order traversal: a node is checked before its
//! payload, and descent covers object property chains and
//! `additionalProperties`, array item chains, and union / intersection /
//! tuple member lists, in declaration order. Each node is visited once.

use crate::ir::{NodeKind, SchemaNode};

/// Collect every node of the given kind, at any depth.
pub fn find_all<'a>(nodes: &'a [SchemaNode], kind: NodeKind) -> Vec<&'a SchemaNode> {
    let mut found = Vec::new();
    collect(nodes, kind, &mut found);
    found
}

/// The first node of the given kind in traversal order, at any depth.
pub fn find_first<'a>(nodes: &'a [SchemaNode], kind: NodeKind) -> Option<&'a SchemaNode> {
    for node in nodes {
        if node.kind() == kind {
            return Some(node);
        }

        let nested = match node {
            SchemaNode::Object(object) => object
                .properties
                .values()
                .find_map(|chain| find_first(chain, kind))
                .or_else(|| find_first(&object.additional_properties, kind)),
            SchemaNode::Array(array) => find_first(&array.items, kind),
            SchemaNode::Union(members)
            | SchemaNode::Intersection(members)
            | SchemaNode::Tuple(members) => find_first(members, kind),
            _ => None,
        };

        if nested.is_some() {
            return nested;
        }
    }

    None
}

fn collect<'a>(nodes: &'a [SchemaNode], kind: NodeKind, found: &mut Vec<&'a SchemaNode>) {
    for node in nodes {
        if node.kind() == kind {
            found.push(node);
        }

        match node {
            SchemaNode::Object(object) => {
                for chain in object.properties.values() {
                    collect(chain, kind, found);
                }
                collect(&object.additional_properties, kind, found);
            }
            SchemaNode::Array(array) => collect(&array.items, kind, found),
            SchemaNode::Union(members)
            | SchemaNode::Intersection(members)
            | SchemaNode::Tuple(members) => collect(members, kind, found),
            _ => {}
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
