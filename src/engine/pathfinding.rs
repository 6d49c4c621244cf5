// Pathfinding over the discovered jump-gate graph

use crate::models::system_symbol_of;
use std::collections::{HashMap, HashSet, VecDeque};

/// Derived, cached map from system symbol to its gate connections.
/// Rebuilt incrementally as new gates are resolved.
#[derive(Debug, Default, Clone)]
pub struct JumpGraph {
    edges: HashMap<String, HashSet<String>>,
    // System symbol -> the gate waypoint symbol inside that system
    gates: HashMap<String, String>,
}

impl JumpGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resolved gate and its connections (gate waypoint symbols).
    /// Edges are registered in both directions.
    pub fn insert_connections(
        &mut self,
        system: &str,
        gate_waypoint: &str,
        connected_waypoints: &[String],
    ) {
        self.gates
            .insert(system.to_string(), gate_waypoint.to_string());
        for waypoint in connected_waypoints {
            let neighbor = system_symbol_of(waypoint);
            self.gates.insert(neighbor.clone(), waypoint.clone());
            self.edges
                .entry(system.to_string())
                .or_default()
                .insert(neighbor.clone());
            self.edges
                .entry(neighbor)
                .or_default()
                .insert(system.to_string());
        }
    }

    pub fn contains(&self, system: &str) -> bool {
        self.edges.contains_key(system)
    }

    pub fn gate_waypoint(&self, system: &str) -> Option<&String> {
        self.gates.get(system)
    }

    pub fn neighbors(&self, system: &str) -> impl Iterator<Item = &String> {
        self.edges.get(system).into_iter().flatten()
    }

    /// Breadth-first shortest path between two systems, inclusive of both
    /// endpoints. Returns None when no route exists over discovered gates.
    pub fn find_shortest_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        if from == to {
            return Some(vec![from.to_string()]);
        }
        let mut visited: HashSet<&str> = HashSet::new();
        let mut parents: HashMap<&str, &str> = HashMap::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        visited.insert(from);
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            for neighbor in self.neighbors(current) {
                if !visited.insert(neighbor.as_str()) {
                    continue;
                }
                parents.insert(neighbor.as_str(), current);
                if neighbor == to {
                    // Walk parents back to the start
                    let mut path = vec![neighbor.to_string()];
                    let mut node = current;
                    loop {
                        path.push(node.to_string());
                        match parents.get(node) {
                            Some(parent) => node = parent,
                            None => break,
                        }
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(neighbor);
            }
        }
        None
    }

    /// Layer-by-layer frontier expansion from `start`. Collects every system
    /// matching `filter` at the first hop-distance where any match exists,
    /// then stops expanding. The start system itself is never returned.
    pub fn closest_gate_systems<F>(&self, start: &str, filter: F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(start);
        let mut layer: Vec<&str> = vec![start];

        while !layer.is_empty() {
            let mut next_layer: Vec<&str> = Vec::new();
            for system in &layer {
                for neighbor in self.neighbors(system) {
                    if visited.insert(neighbor.as_str()) {
                        next_layer.push(neighbor.as_str());
                    }
                }
            }
            let matches: Vec<String> = next_layer
                .iter()
                .filter(|s| filter(s))
                .map(|s| s.to_string())
                .collect();
            if !matches.is_empty() {
                return matches;
            }
            layer = next_layer;
        }
        Vec::new()
    }
}
