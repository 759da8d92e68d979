//! Checks caller-supplied values against an algorithm's declared inputs.

use std::collections::BTreeMap;

use algobench_core::{ExecutionId, Input, InputId, InputType, Payload, SubmittedInput};

/// Outcome of validating one submission.
#[derive(Debug, Clone, Default)]
pub struct PayloadCheck {
    /// Supplied entries that matched a declared input, in submission order.
    accepted: Vec<SubmittedInput>,
    /// Names of declared inputs that were missing or had a malformed value.
    problems: Vec<String>,
}

impl PayloadCheck {
    /// Valid only when every declared input received a well-formed value.
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn problems(&self) -> &[String] {
        &self.problems
    }

    pub fn accepted(&self) -> &[SubmittedInput] {
        &self.accepted
    }

    /// Payload rows to persist; empty when the check failed.
    pub fn into_payload(self, execution_id: ExecutionId) -> Vec<Payload> {
        if !self.is_valid() {
            return Vec::new();
        }
        self.accepted
            .into_iter()
            .map(|s| Payload::new(execution_id, s.input_id, s.value))
            .collect()
    }
}

/// Whether `raw` is a well-formed value for `input_type`.
///
/// Only booleans and numbers are checked; every other type is accepted verbatim.
pub fn value_fits(input_type: &InputType, raw: &str) -> bool {
    let trimmed = raw.trim();
    match input_type {
        InputType::Boolean => matches!(trimmed.to_lowercase().as_str(), "true" | "false"),
        InputType::Integer => trimmed.parse::<i64>().is_ok(),
        InputType::Float => trimmed.parse::<f64>().is_ok(),
        _ => true,
    }
}

/// Validate `submitted` against the declared `inputs`.
///
/// Entries for undeclared input ids are ignored. One malformed value rejects
/// the whole submission, as does any declared input left without a value.
pub fn validate_payload(inputs: &[Input], submitted: &[SubmittedInput]) -> PayloadCheck {
    let declared: BTreeMap<InputId, &Input> = inputs.iter().map(|i| (i.input_id, i)).collect();
    let mut supplied: BTreeMap<InputId, bool> = inputs.iter().map(|i| (i.input_id, false)).collect();
    let mut check = PayloadCheck::default();

    for entry in submitted {
        let Some(input) = declared.get(&entry.input_id) else {
            continue;
        };
        if value_fits(&input.input_type, &entry.value) {
            supplied.insert(input.input_id, true);
            check.accepted.push(entry.clone());
        } else {
            check
                .problems
                .push(format!("'{}' is not a valid {}", input.name, input.input_type.as_str()));
        }
    }

    for (id, ok) in supplied {
        if !ok {
            if let Some(input) = declared.get(&id) {
                if !check.problems.iter().any(|p| p.starts_with(&format!("'{}'", input.name))) {
                    check.problems.push(format!("'{}' is missing", input.name));
                }
            }
        }
    }

    check
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn input(name: &str, input_type: &str) -> Input {
        Input {
            input_id: Uuid::new_v4(),
            algorithm_id: Uuid::nil(),
            name: name.to_string(),
            input_type: InputType::parse(input_type),
            description: None,
            enabled: true,
        }
    }

    fn supply(input: &Input, value: &str) -> SubmittedInput {
        SubmittedInput {
            input_id: input.input_id,
            value: value.to_string(),
        }
    }

    #[test]
    fn all_declared_inputs_present_is_valid() {
        let n = input("n", "integer");
        let flag = input("flag", "boolean");
        let ratio = input("ratio", "float");
        let label = input("label", "string");
        let check = validate_payload(
            &[n.clone(), flag.clone(), ratio.clone(), label.clone()],
            &[
                supply(&n, " 12 "),
                supply(&flag, " TRUE"),
                supply(&ratio, "0.5"),
                supply(&label, "anything at all"),
            ],
        );
        assert!(check.is_valid(), "{:?}", check.problems());
        assert_eq!(check.accepted().len(), 4);
    }

    #[test]
    fn unknown_entries_are_ignored() {
        let n = input("n", "integer");
        let stray = SubmittedInput {
            input_id: Uuid::new_v4(),
            value: "junk".into(),
        };
        let check = validate_payload(&[n.clone()], &[stray, supply(&n, "3")]);
        assert!(check.is_valid());

        let exec = Uuid::new_v4();
        let rows = check.into_payload(exec);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].input_id, n.input_id);
        assert_eq!(rows[0].input_value, "3");
    }

    #[test]
    fn missing_input_rejects_everything() {
        let a = input("a", "integer");
        let b = input("b", "integer");
        let check = validate_payload(&[a.clone(), b], &[supply(&a, "1")]);
        assert!(!check.is_valid());
        assert_eq!(check.problems(), ["'b' is missing"]);
        assert!(check.into_payload(Uuid::new_v4()).is_empty());
    }

    #[test]
    fn malformed_values_are_rejected() {
        let n = input("n", "int");
        let flag = input("flag", "bool");
        let ratio = input("ratio", "float");
        assert!(!validate_payload(&[n.clone()], &[supply(&n, "1.5")]).is_valid());
        assert!(!validate_payload(&[flag.clone()], &[supply(&flag, "yes")]).is_valid());
        assert!(!validate_payload(&[ratio.clone()], &[supply(&ratio, "half")]).is_valid());
    }

    #[test]
    fn one_bad_value_spoils_a_later_good_one() {
        let n = input("n", "integer");
        let check = validate_payload(&[n.clone()], &[supply(&n, "x"), supply(&n, "4")]);
        assert!(!check.is_valid());
        assert_eq!(check.problems(), ["'n' is not a valid integer"]);
    }

    #[test]
    fn structured_types_are_not_checked() {
        let graph = input("graph", "list");
        assert!(validate_payload(&[graph.clone()], &[supply(&graph, "[[0,1],[1,0]]")]).is_valid());
        assert!(value_fits(&InputType::parse("matrix"), "whatever"));
    }
}
