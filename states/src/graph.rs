use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{Debug, Formatter},
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TopologyError<T>
where
    T: Debug,
{
    #[error("Cycle detected in dependency graph, from {:?}", .0)]
    CycleDetected(DepRoute<T>),
    #[error("Duplicate edge detected in dependency graph, from {:?} to {:?}", .0.route[0], .0.route[1])]
    DuplicateEdge(DepRoute<T>),
}

pub struct DepRoute<T> {
    // first means the start node, last means the end node
    route: Vec<T>,
}

impl<T> Debug for DepRoute<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let Some((last, rest)) = self.route.split_last() else {
            return write!(f, "[]");
        };
        for item in rest {
            write!(f, "{item:?} -> ")?;
        }
        write!(f, "{last:?}")
    }
}

/// Directed dependency graph, edges point from a dependency to its dependent.
#[derive(Debug)]
pub struct Graph<Node, Edge = ()>
where
    Node: Debug + PartialEq + Copy + Ord,
    Edge: Debug + PartialEq,
{
    routes: Vec<(Node, Edge, Node)>,
}

impl<Node, Edge> Default for Graph<Node, Edge>
where
    Node: Debug + PartialEq + Copy + Ord,
    Edge: Debug + PartialEq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Node, Edge> Graph<Node, Edge>
where
    Node: Debug + PartialEq + Copy + Ord,
    Edge: Debug + PartialEq,
{
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            routes: Vec::with_capacity(capacity),
        }
    }

    pub fn route_to(&mut self, from: Node, to: Node, via: Edge) {
        self.routes.push((from, via, to));
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Nodes with a direct edge from `node`.
    pub fn dependents(&self, node: Node) -> BTreeSet<Node> {
        self.routes
            .iter()
            .filter(|(from, _, _)| *from == node)
            .map(|(_, _, to)| *to)
            .collect()
    }

    fn cal_in_out(&self) -> BTreeMap<Node, (usize, usize)> {
        let mut in_out = BTreeMap::<Node, (usize, usize)>::new();

        for (from, _via, to) in &self.routes {
            in_out.entry(*from).or_insert((0, 0)).1 += 1;
            in_out.entry(*to).or_insert((0, 0)).0 += 1;
        }

        in_out
    }

    pub fn topology_sort(&mut self) -> Result<(), TopologyError<Node>> {
        let mut in_out = self.cal_in_out();

        while !in_out.is_empty() {
            if let Some((&node, _)) = in_out.iter().find(|(_, deg)| deg.0 == 0) {
                in_out.remove(&node);

                for connected in self.direct_connected_nodes(node)? {
                    if let Some(entry) = in_out.get_mut(&connected) {
                        entry.0 -= 1;
                    }
                }
            } else {
                let keys: Vec<Node> = in_out.keys().copied().collect();
                let route = self.find_cycle(&keys).unwrap_or_default();
                return Err(TopologyError::CycleDetected(DepRoute { route }));
            }
        }

        Ok(())
    }

    fn find_cycle(&self, nodes: &[Node]) -> Option<Vec<Node>> {
        // Iterative DFS over the nodes left after the topological pass
        let mut visited = BTreeSet::new();
        let mut path_set = BTreeSet::new();
        let mut path = Vec::new();
        let mut stack: Vec<(Node, std::vec::IntoIter<Node>)> = Vec::new();

        let neighbors_in = |node: Node| {
            self.dependents(node)
                .into_iter()
                .filter(|n| nodes.contains(n))
                .collect::<Vec<_>>()
                .into_iter()
        };

        for &start_node in nodes {
            if visited.contains(&start_node) {
                continue;
            }

            stack.push((start_node, neighbors_in(start_node)));
            visited.insert(start_node);
            path_set.insert(start_node);
            path.push(start_node);

            while let Some((current_node, neighbors)) = stack.last_mut() {
                if let Some(neighbor) = neighbors.next() {
                    if path_set.contains(&neighbor) {
                        if let Some(pos) = path.iter().position(|&x| x == neighbor) {
                            let mut cycle = path[pos..].to_vec();
                            cycle.push(neighbor);
                            return Some(cycle);
                        }
                    } else if !visited.contains(&neighbor) {
                        visited.insert(neighbor);
                        path_set.insert(neighbor);
                        path.push(neighbor);
                        stack.push((neighbor, neighbors_in(neighbor)));
                    }
                } else {
                    let node_to_remove = *current_node;
                    stack.pop();
                    path_set.remove(&node_to_remove);
                    path.pop();
                }
            }
        }
        None
    }

    fn direct_connected_nodes(&self, node: Node) -> Result<BTreeSet<Node>, TopologyError<Node>> {
        let mut collected = BTreeSet::new();

        for (from, _via, to) in &self.routes {
            if from == &node && !collected.insert(*to) {
                return Err(TopologyError::DuplicateEdge(DepRoute {
                    route: vec![node, *to],
                }));
            }
        }

        Ok(collected)
    }
}
