//! The scalar product job: inputs, submission and reporting.

use std::{process::ExitCode, sync::Arc};

use log::{error, info};
use mpc_controller::{
    Controller, ControllerConfiguration, ControllerError, ErrorRecord, ParseError,
    SystemController, Value, ValueMap,
};

/// Protection domain the inputs are secret-shared in.
pub(crate) const PROTECTION_DOMAIN: &str = "pd_shared3p";

/// Precompiled bytecode run on the servers.
pub(crate) const PROGRAM: &str = "scalar_product.sb";

pub(crate) const ARG_A: &str = "a";
pub(crate) const ARG_B: &str = "b";
pub(crate) const RESULT: &str = "c";

/// Ways the job can fail once logging is up.
#[derive(Debug, thiserror::Error)]
pub(crate) enum DemoError {
    #[error("Missing '{0}' result value.")]
    MissingResult(&'static str),
    #[error("Failed to cast '{name}' to appropriate type: {err}")]
    Decode { name: &'static str, err: ParseError },
    #[error(transparent)]
    Controller(#[from] ControllerError),
}

/// The two input vectors, A = -5..4 and B = 0..9.
pub(crate) fn input_vectors() -> (Vec<i64>, Vec<i64>) {
    ((-5..5).collect(), (0..10).collect())
}

pub(crate) fn format_vector(label: &str, values: &[i64]) -> String {
    let elements: String = values.iter().map(|v| format!("{v} ")).collect();
    format!("Vector {label}: [ {elements}]")
}

/// Wrap both vectors as `int64` values of the protection domain.
pub(crate) fn build_arguments(a: &[i64], b: &[i64]) -> ValueMap {
    let mut arguments = ValueMap::new();
    arguments.insert(
        ARG_A.to_string(),
        Arc::new(Value::from_scalars(PROTECTION_DOMAIN, a)),
    );
    arguments.insert(
        ARG_B.to_string(),
        Arc::new(Value::from_scalars(PROTECTION_DOMAIN, b)),
    );
    arguments
}

pub(crate) fn fetch_result(results: &ValueMap) -> Result<i64, DemoError> {
    let value = results
        .get(RESULT)
        .ok_or(DemoError::MissingResult(RESULT))?;
    value
        .get_value::<i64>()
        .map_err(|err| DemoError::Decode { name: RESULT, err })
}

/// Submit the job and decode its result.
pub(crate) fn compute<C: Controller>(
    controller: &mut C,
    a: &[i64],
    b: &[i64],
) -> Result<i64, DemoError> {
    let arguments = build_arguments(a, b);
    info!("Submitting {PROTECTION_DOMAIN} arguments and running bytecode on the servers");
    let results = controller.run_code(PROGRAM, &arguments)?;
    fetch_result(&results)
}

/// Log a failure, one line per worker failure and per chained cause.
pub(crate) fn log_failure(err: &DemoError) {
    match err {
        DemoError::Controller(ControllerError::Workers(workers)) => {
            error!("Multiple exceptions caught:");
            for failure in &workers.failures {
                for record in failure.error.chain() {
                    error!(" {}: {}", failure.worker, record);
                }
            }
        }
        DemoError::Controller(err) => {
            let messages: Vec<_> = ErrorRecord::from_error(err)
                .chain()
                .map(|record| record.message.clone())
                .collect();
            error!("Caught exception: {}", messages.join(": "));
        }
        err => error!("{err}"),
    }
}

/// Run the demo against the servers of `config`.
pub(crate) fn run(config: &ControllerConfiguration) -> ExitCode {
    info!("This is a stand alone MPC application demo");
    info!("It privately computes the scalar product of the following two vectors");

    let (a, b) = input_vectors();
    assert_eq!(a.len(), b.len(), "input vectors must have equal length");
    info!("{}", format_vector("A", &a));
    info!("{}", format_vector("B", &b));

    // the session is dropped, and its connections closed, before reporting
    let outcome = SystemController::connect(config)
        .map_err(DemoError::from)
        .and_then(|mut controller| compute(&mut controller, &a, &b));

    match outcome {
        Ok(c) => {
            info!("The computed scalar product is: {c}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log_failure(&err);
            ExitCode::FAILURE
        }
    }
}
