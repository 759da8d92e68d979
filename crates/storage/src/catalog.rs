//! Built-in catalog: the algorithms, inputs and criteria shipped with the service.
//!
//! Identifiers are fixed so the in-memory store and the SQL seed migration agree.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use algobench_core::{Algorithm, AlgorithmId, Criteria, CriteriaId, Input, InputType};

pub const DIJKSTRA_ID: AlgorithmId = Uuid::from_u128(0x0192919b_2501_91c1_d4bb_c71b4c0785d5);
pub const FACTORIAL_ID: AlgorithmId = Uuid::from_u128(0x0192919b_2501_2fea_a93d_5d5541c4002b);
pub const FIBONACCI_ID: AlgorithmId = Uuid::from_u128(0x0195316b_d5ca_431a_8d95_f3f65e3ec1dd);

pub const NODES_INPUT_ID: Uuid = Uuid::from_u128(0x0192919b_2501_59d0_d088_50be8a4e5ae6);
pub const EDGES_INPUT_ID: Uuid = Uuid::from_u128(0x0192919b_2501_3c8d_b7ad_8c470d1bfba6);
pub const FACTORIAL_INPUT_ID: Uuid = Uuid::from_u128(0x0192919b_2501_585f_1492_4f5d22c98267);
pub const FIBONACCI_INPUT_ID: Uuid = Uuid::from_u128(0x0195316d_80fc_40c2_b3ca_44a90d8c6851);

pub const RUNNING_TIME_ID: CriteriaId = Uuid::from_u128(0x001fe2d3_09a5_4bc0_b891_45d475a4b1bc);
pub const MEMORY_CONSUME_ID: CriteriaId = Uuid::from_u128(0xf6465865_d1a3_496c_82b7_5d7d67adf927);
pub const SETUP_TIME_ID: CriteriaId = Uuid::from_u128(0x92771dd3_811d_43d3_ad9a_adc2a2c672db);
pub const COUNT_NODES_ID: CriteriaId = Uuid::from_u128(0x3b1f6a52_8c0e_4d7a_9e21_5f4c2d8a1b01);
pub const COUNT_EDGES_ID: CriteriaId = Uuid::from_u128(0x3b1f6a52_8c0e_4d7a_9e21_5f4c2d8a1b02);
pub const DETECT_CYCLE_ID: CriteriaId = Uuid::from_u128(0x3b1f6a52_8c0e_4d7a_9e21_5f4c2d8a1b03);

/// Algorithms, criteria and bindings to seed a store with.
pub struct Catalog {
    pub algorithms: Vec<(Algorithm, Vec<Input>)>,
    pub criteria: Vec<Criteria>,
    pub bindings: Vec<(AlgorithmId, CriteriaId)>,
}

fn seeded_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 18, 21, 8, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn algorithm(id: AlgorithmId, name: &str, description: &str, source: &str) -> Algorithm {
    Algorithm {
        algorithm_id: id,
        name: name.to_string(),
        description: Some(description.to_string()),
        source: Some(source.to_string()),
        enabled: true,
        created_at: seeded_at(),
        updated_at: seeded_at(),
    }
}

fn input(id: Uuid, algorithm_id: AlgorithmId, name: &str, description: &str) -> Input {
    Input {
        input_id: id,
        algorithm_id,
        name: name.to_string(),
        input_type: InputType::Integer,
        description: Some(description.to_string()),
        enabled: true,
    }
}

fn criteria(id: CriteriaId, name: &str, description: &str) -> Criteria {
    Criteria {
        criteria_id: id,
        name: name.to_string(),
        description: Some(description.to_string()),
        enabled: true,
    }
}

pub fn builtin_catalog() -> Catalog {
    let algorithms = vec![
        (
            algorithm(
                DIJKSTRA_ID,
                "Dijkstra",
                "Shortest path between two nodes of a weighted graph.",
                "https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm",
            ),
            vec![
                input(NODES_INPUT_ID, DIJKSTRA_ID, "number of nodes", "number of nodes to build a random graph"),
                input(EDGES_INPUT_ID, DIJKSTRA_ID, "number of edges", "number of edges to build a random graph"),
            ],
        ),
        (
            algorithm(
                FACTORIAL_ID,
                "Factorial",
                "Product of a positive integer and every positive integer below it.",
                "https://en.wikipedia.org/wiki/Factorial",
            ),
            vec![input(FACTORIAL_INPUT_ID, FACTORIAL_ID, "factorial number", "number to calculate factorial")],
        ),
        (
            algorithm(
                FIBONACCI_ID,
                "Fibonacci sequence",
                "Series where each number is the sum of the two preceding ones, starting from 0 and 1.",
                "https://en.wikipedia.org/wiki/Fibonacci_sequence",
            ),
            vec![input(
                FIBONACCI_INPUT_ID,
                FIBONACCI_ID,
                "fibonacci number",
                "number to calculate fibonacci sequence",
            )],
        ),
    ];

    let criteria = vec![
        criteria(RUNNING_TIME_ID, "Running Time", "Time taken by one run of the algorithm."),
        criteria(MEMORY_CONSUME_ID, "Memory Consume", "Peak process memory while the algorithm runs."),
        criteria(SETUP_TIME_ID, "Setup Time", "Time taken to build the derived inputs before running."),
        criteria(COUNT_NODES_ID, "Count Nodes", "Number of nodes in the generated graph."),
        criteria(COUNT_EDGES_ID, "Count Edges", "Number of directed edges in the generated graph."),
        criteria(DETECT_CYCLE_ID, "Detect Cycle", "Whether the generated graph contains a directed cycle."),
    ];

    let mut bindings: Vec<(AlgorithmId, CriteriaId)> = [
        RUNNING_TIME_ID,
        MEMORY_CONSUME_ID,
        SETUP_TIME_ID,
        COUNT_NODES_ID,
        COUNT_EDGES_ID,
        DETECT_CYCLE_ID,
    ]
    .into_iter()
    .map(|c| (DIJKSTRA_ID, c))
    .collect();
    for algorithm_id in [FACTORIAL_ID, FIBONACCI_ID] {
        bindings.push((algorithm_id, RUNNING_TIME_ID));
        bindings.push((algorithm_id, MEMORY_CONSUME_ID));
    }

    Catalog {
        algorithms,
        criteria,
        bindings,
    }
}
