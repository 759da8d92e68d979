use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use algobench_core::{Graph, InputType, ParamError, ParamValue, Params, PayloadEntry};

use super::{Algorithm, Output, DIJKSTRA};
use crate::error::AlgorithmError;

/// Declared input that sizes the generated graph.
pub const NODES_INPUT: &str = "number of nodes";
pub const SOURCE: &str = "source";
pub const TARGET: &str = "target";
pub const GRAPH: &str = "graph";

const MIN_WEIGHT: i64 = 1;
const MAX_WEIGHT: i64 = 100;

/// Priority queue entry; reversed ordering turns `BinaryHeap` into a min-heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct State {
    distance: u64,
    node: usize,
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .cmp(&self.distance)
            .then_with(|| self.node.cmp(&other.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest distance from `from` to `to` over an adjacency matrix.
///
/// `graph[u][v] > 0` is an edge u→v of that weight. Returns `None` when `to`
/// is unreachable or either index is outside the matrix.
pub fn shortest_distance(graph: &Graph, from: usize, to: usize) -> Option<u64> {
    let n = graph.len();
    if from >= n || to >= n {
        return None;
    }

    let mut dist = vec![u64::MAX; n];
    let mut heap = BinaryHeap::new();
    dist[from] = 0;
    heap.push(State { distance: 0, node: from });

    while let Some(State { distance, node }) = heap.pop() {
        if node == to {
            return Some(distance);
        }
        if distance > dist[node] {
            continue;
        }
        for (next, &weight) in graph[node].iter().enumerate().take(n) {
            if weight <= 0 {
                continue;
            }
            let candidate = distance.saturating_add(weight as u64);
            if candidate < dist[next] {
                dist[next] = candidate;
                heap.push(State { distance: candidate, node: next });
            }
        }
    }

    None
}

/// Complete undirected graph on `nodes` vertices with weights drawn from `[1, 100]`.
pub fn generate_graph<R: Rng + ?Sized>(nodes: usize, rng: &mut R) -> Graph {
    let mut graph = vec![vec![0i64; nodes]; nodes];
    for i in 0..nodes {
        for j in (i + 1)..nodes {
            let weight = rng.gen_range(MIN_WEIGHT..=MAX_WEIGHT);
            graph[i][j] = weight;
            graph[j][i] = weight;
        }
    }
    graph
}

/// Single-pair shortest path over a generated weighted graph.
pub struct Dijkstra {
    max_nodes: usize,
    seed: Option<u64>,
}

impl Dijkstra {
    pub fn new(max_nodes: usize) -> Self {
        Self { max_nodes, seed: None }
    }

    /// Fix the graph generator seed (reproducible setups).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn node_index(params: &Params, name: &str, nodes: usize) -> Result<usize, AlgorithmError> {
        let raw = params.int(name)?;
        usize::try_from(raw)
            .ok()
            .filter(|i| *i < nodes)
            .ok_or_else(|| {
                AlgorithmError::InvalidInput(format!("{name} {raw} is outside a graph of {nodes} nodes"))
            })
    }
}

impl Algorithm for Dijkstra {
    fn name(&self) -> &str {
        DIJKSTRA
    }

    fn run(&self, params: &Params) -> Result<Output, AlgorithmError> {
        let graph = params.graph(GRAPH)?;
        let from = Self::node_index(params, SOURCE, graph.len())?;
        let to = Self::node_index(params, TARGET, graph.len())?;
        shortest_distance(graph, from, to)
            .map(Output::Distance)
            .ok_or(AlgorithmError::Unreachable { from, to })
    }

    fn setup(&self, payload: &[PayloadEntry]) -> Result<Vec<PayloadEntry>, AlgorithmError> {
        let entry = payload
            .iter()
            .find(|e| e.name == NODES_INPUT)
            .ok_or_else(|| ParamError::Missing(NODES_INPUT.to_string()))?;
        let requested = entry.value.as_int().ok_or_else(|| ParamError::WrongType {
            name: NODES_INPUT.to_string(),
            expected: "integer",
        })?;
        if requested < 1 {
            return Err(AlgorithmError::InvalidInput(format!(
                "{NODES_INPUT} must be at least 1, got {requested}"
            )));
        }
        let nodes = requested as usize;
        if nodes > self.max_nodes {
            return Err(AlgorithmError::InvalidInput(format!(
                "{NODES_INPUT} {nodes} exceeds the limit of {}",
                self.max_nodes
            )));
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let graph = generate_graph(nodes, &mut rng);
        debug!(nodes, "Generated complete graph for Dijkstra");

        let mut extended = payload.to_vec();
        extended.push(PayloadEntry::synthetic(SOURCE, InputType::Integer, ParamValue::Int(0)));
        extended.push(PayloadEntry::synthetic(
            TARGET,
            InputType::Integer,
            ParamValue::Int(nodes as i64 - 1),
        ));
        extended.push(PayloadEntry::synthetic(GRAPH, InputType::List, ParamValue::Graph(graph)));
        Ok(extended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Graph {
        vec![
            vec![0, 4, 0, 0, 0, 0, 0, 8, 0],
            vec![4, 0, 8, 0, 0, 0, 0, 11, 0],
            vec![0, 8, 0, 7, 0, 4, 0, 0, 2],
            vec![0, 0, 7, 0, 9, 14, 0, 0, 0],
            vec![0, 0, 0, 9, 0, 10, 0, 0, 0],
            vec![0, 0, 4, 14, 10, 0, 2, 0, 0],
            vec![0, 0, 0, 0, 0, 2, 0, 1, 6],
            vec![8, 11, 0, 0, 0, 0, 1, 0, 7],
            vec![0, 0, 2, 0, 0, 0, 6, 7, 0],
        ]
    }

    fn nodes_entry(value: &str) -> PayloadEntry {
        PayloadEntry {
            input_id: Some(uuid::Uuid::new_v4()),
            name: NODES_INPUT.into(),
            input_type: InputType::Integer,
            value: ParamValue::Text(value.into()),
        }
    }

    #[test]
    fn fixture_shortest_path_is_21() {
        let params = Params::new()
            .with(SOURCE, ParamValue::Int(0))
            .with(TARGET, ParamValue::Int(4))
            .with(GRAPH, ParamValue::Graph(fixture()));
        let out = Dijkstra::new(100).run(&params).unwrap();
        assert_eq!(out, Output::Distance(21));
    }

    #[test]
    fn fixture_other_targets() {
        let g = fixture();
        assert_eq!(shortest_distance(&g, 0, 0), Some(0));
        assert_eq!(shortest_distance(&g, 0, 8), Some(14));
        assert_eq!(shortest_distance(&g, 0, 6), Some(9));
    }

    #[test]
    fn unreachable_target_is_an_error() {
        let params = Params::new()
            .with(SOURCE, ParamValue::Int(0))
            .with(TARGET, ParamValue::Int(1))
            .with(GRAPH, ParamValue::Graph(vec![vec![0, 0], vec![5, 0]]));
        let err = Dijkstra::new(10).run(&params).unwrap_err();
        assert!(matches!(err, AlgorithmError::Unreachable { from: 0, to: 1 }));
    }

    #[test]
    fn out_of_range_target_is_invalid_input() {
        let params = Params::new()
            .with(SOURCE, ParamValue::Int(0))
            .with(TARGET, ParamValue::Int(9))
            .with(GRAPH, ParamValue::Graph(fixture()));
        let err = Dijkstra::new(10).run(&params).unwrap_err();
        assert!(matches!(err, AlgorithmError::InvalidInput(_)), "got {err:?}");
    }

    #[test]
    fn generated_graph_is_complete_and_symmetric() {
        let mut rng = StdRng::seed_from_u64(7);
        let g = generate_graph(6, &mut rng);
        for i in 0..6 {
            assert_eq!(g[i][i], 0);
            for j in 0..6 {
                assert_eq!(g[i][j], g[j][i]);
                if i != j {
                    assert!((MIN_WEIGHT..=MAX_WEIGHT).contains(&g[i][j]));
                }
            }
        }
    }

    #[test]
    fn setup_appends_synthetic_entries_without_touching_input() {
        let payload = vec![nodes_entry("5")];
        let extended = Dijkstra::new(100).with_seed(1).setup(&payload).unwrap();

        assert_eq!(payload.len(), 1);
        assert_eq!(extended.len(), 4);
        assert_eq!(extended[0], payload[0]);

        let names: Vec<&str> = extended[1..].iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec![SOURCE, TARGET, GRAPH]);
        assert!(extended[1..].iter().all(PayloadEntry::is_synthetic));
        assert_eq!(extended[1].value, ParamValue::Int(0));
        assert_eq!(extended[2].value, ParamValue::Int(4));
        assert_eq!(extended[3].input_type, InputType::List);
        assert_eq!(extended[3].value.as_graph().map(Vec::len), Some(5));
    }

    #[test]
    fn seeded_setup_is_reproducible() {
        let payload = vec![nodes_entry("8")];
        let a = Dijkstra::new(100).with_seed(42).setup(&payload).unwrap();
        let b = Dijkstra::new(100).with_seed(42).setup(&payload).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn setup_then_run_finds_a_path() {
        let extended = Dijkstra::new(100).with_seed(3).setup(&[nodes_entry("12")]).unwrap();
        let params = Params::from_payload(&extended).unwrap();
        let out = Dijkstra::new(100).run(&params).unwrap();
        // Direct edge 0→11 bounds the distance by the max weight.
        assert!(matches!(out, Output::Distance(d) if (1..=100).contains(&d)));
    }

    #[test]
    fn setup_rejects_bad_node_counts() {
        let dijkstra = Dijkstra::new(50);
        assert!(matches!(
            dijkstra.setup(&[nodes_entry("0")]),
            Err(AlgorithmError::InvalidInput(_))
        ));
        assert!(matches!(
            dijkstra.setup(&[nodes_entry("51")]),
            Err(AlgorithmError::InvalidInput(_))
        ));
        assert!(matches!(
            dijkstra.setup(&[]),
            Err(AlgorithmError::Param(ParamError::Missing(_)))
        ));
    }
}
