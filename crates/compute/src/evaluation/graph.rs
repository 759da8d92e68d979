//! Structural criteria computed from the synthesized `graph` input alone.

use algobench_core::Graph;

use super::{EvaluationContext, Evaluator, Measurement, COUNT_EDGES, COUNT_NODES, DETECT_CYCLE};
use crate::algorithms::dijkstra::GRAPH;
use crate::algorithms::Algorithm;
use crate::error::EvaluationError;

pub struct CountNodes;

impl Evaluator for CountNodes {
    fn name(&self) -> &str {
        COUNT_NODES
    }

    fn evaluate(
        &self,
        _algorithm: &dyn Algorithm,
        ctx: &EvaluationContext<'_>,
    ) -> Result<Measurement, EvaluationError> {
        let graph = ctx.params.graph(GRAPH)?;
        Ok(Measurement::new(graph.len().to_string(), Some("node(s)")))
    }
}

pub struct CountEdges;

impl Evaluator for CountEdges {
    fn name(&self) -> &str {
        COUNT_EDGES
    }

    fn evaluate(
        &self,
        _algorithm: &dyn Algorithm,
        ctx: &EvaluationContext<'_>,
    ) -> Result<Measurement, EvaluationError> {
        let graph = ctx.params.graph(GRAPH)?;
        let edges = graph.iter().flatten().filter(|w| **w > 0).count();
        Ok(Measurement::new(edges.to_string(), Some("edge(s)")))
    }
}

pub struct DetectCycle;

impl Evaluator for DetectCycle {
    fn name(&self) -> &str {
        DETECT_CYCLE
    }

    fn evaluate(
        &self,
        _algorithm: &dyn Algorithm,
        ctx: &EvaluationContext<'_>,
    ) -> Result<Measurement, EvaluationError> {
        let graph = ctx.params.graph(GRAPH)?;
        let verdict = if has_cycle(graph) {
            "Cycle detected"
        } else {
            "No cycle detected"
        };
        Ok(Measurement::new(verdict, None))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Directed cycle check: `graph[u][v] > 0` is an edge u→v.
///
/// Depth-first search with an explicit stack; an edge into a node still on
/// the current path is a back-edge, hence a cycle.
pub fn has_cycle(graph: &Graph) -> bool {
    let n = graph.len();
    let mut marks = vec![Mark::Unvisited; n];

    for root in 0..n {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        // (node, next neighbour to inspect)
        let mut stack = vec![(root, 0usize)];
        marks[root] = Mark::OnStack;

        while let Some(&(node, start)) = stack.last() {
            let row = &graph[node];
            let limit = row.len().min(n);
            let mut cursor = start;
            let mut child = None;

            while cursor < limit {
                let v = cursor;
                cursor += 1;
                if row[v] <= 0 {
                    continue;
                }
                match marks[v] {
                    Mark::OnStack => return true,
                    Mark::Unvisited => {
                        child = Some(v);
                        break;
                    }
                    Mark::Done => {}
                }
            }

            match child {
                Some(v) => {
                    if let Some(top) = stack.last_mut() {
                        top.1 = cursor;
                    }
                    marks[v] = Mark::OnStack;
                    stack.push((v, 0));
                }
                None => {
                    marks[node] = Mark::Done;
                    stack.pop();
                }
            }
        }
    }

    false
}
