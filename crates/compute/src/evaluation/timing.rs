use std::time::Instant;

use super::{format_decimal, EvaluationContext, Evaluator, Measurement, RUNNING_TIME, SETUP_TIME};
use crate::algorithms::Algorithm;
use crate::error::EvaluationError;

const SECONDS: &str = "secs";

/// Wall-clock time of one `run` call.
pub struct RunningTime;

impl Evaluator for RunningTime {
    fn name(&self) -> &str {
        RUNNING_TIME
    }

    fn evaluate(
        &self,
        algorithm: &dyn Algorithm,
        ctx: &EvaluationContext<'_>,
    ) -> Result<Measurement, EvaluationError> {
        let start = Instant::now();
        algorithm.run(ctx.params)?;
        let elapsed = start.elapsed().as_secs_f64();
        Ok(Measurement::new(format_decimal(elapsed), Some(SECONDS)))
    }
}

/// Wall-clock time of the algorithm's setup hook over the stored payload.
pub struct SetupTime;

impl Evaluator for SetupTime {
    fn name(&self) -> &str {
        SETUP_TIME
    }

    fn evaluate(
        &self,
        algorithm: &dyn Algorithm,
        ctx: &EvaluationContext<'_>,
    ) -> Result<Measurement, EvaluationError> {
        let start = Instant::now();
        let extended = algorithm.setup(ctx.payload)?;
        let elapsed = start.elapsed().as_secs_f64();
        let added = extended.len().saturating_sub(ctx.payload.len());
        Ok(Measurement::new(format_decimal(elapsed), Some(SECONDS))
            .with_message(format!("{added} synthetic input(s)")))
    }
}

#[cfg(test)]
mod tests {
    use algobench_core::{InputType, ParamValue, Params, PayloadEntry};

    use super::*;
    use crate::algorithms::{Dijkstra, Factorial};

    #[test]
    fn running_time_reports_non_negative_seconds() {
        let params = Params::new().with("factorial number", ParamValue::Int(5));
        let ctx = EvaluationContext { payload: &[], params: &params };
        let m = RunningTime.evaluate(&Factorial, &ctx).unwrap();

        assert_eq!(m.unit.as_deref(), Some("secs"));
        let secs: f64 = m.value.as_deref().unwrap().parse().unwrap();
        assert!(secs >= 0.0);
        assert_eq!(m.value.as_deref().unwrap().split('.').nth(1).map(str::len), Some(7));
    }

    #[test]
    fn running_time_propagates_algorithm_failure() {
        let params = Params::new();
        let ctx = EvaluationContext { payload: &[], params: &params };
        let err = RunningTime.evaluate(&Factorial, &ctx).unwrap_err();
        assert!(matches!(err, EvaluationError::Algorithm(_)));
    }

    #[test]
    fn setup_time_counts_synthetic_entries() {
        let payload = vec![PayloadEntry {
            input_id: Some(uuid::Uuid::new_v4()),
            name: "number of nodes".into(),
            input_type: InputType::Integer,
            value: ParamValue::Text("4".into()),
        }];
        let params = Params::new();
        let ctx = EvaluationContext { payload: &payload, params: &params };
        let m = SetupTime.evaluate(&Dijkstra::new(10).with_seed(9), &ctx).unwrap();

        assert_eq!(m.unit.as_deref(), Some("secs"));
        assert_eq!(m.message.as_deref(), Some("3 synthetic input(s)"));
    }
}
