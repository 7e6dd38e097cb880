/// A callable evaluation model that maps an input record to an output record.
///
/// Implementations are expected to be pure and deterministic: the same input
/// must produce bit-identical output, with no side effects. Undefined output
/// quantities are represented as `NaN`, which is a meaningful value rather
/// than an error. A model should only return `Err` for inputs outside the
/// domain it claims to support.
pub trait Model {
    type Input;
    type Output;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Calls the model with the given input.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// A captured input/output pair from a model call.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<I, O> {
    pub input: I,
    pub output: O,
}

impl<I, O> Snapshot<I, O> {
    /// Creates a new snapshot from input and output values.
    pub fn new(input: I, output: O) -> Self {
        Self { input, output }
    }
}
