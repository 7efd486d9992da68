use thiserror::Error;

pub type Result<T> = std::result::Result<T, GenError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenError {
    #[error("invalid variable descriptor '{descriptor}': {reason}")]
    InvalidDescriptor { descriptor: String, reason: String },

    #[error("at least one state variable is required")]
    NoVariables,

    #[error("{count} state variables requested but at most {max} are supported")]
    TooManyVariables { count: usize, max: usize },

    /// The builder could not connect an enclave without breaking solvability.
    /// Generation has to be restarted with a different random sequence.
    #[error("unable to reach enclave {enclave}: {reason}")]
    Unsatisfiable { enclave: String, reason: String },
}

impl GenError {
    /// Errors caused by the request itself, detected before any enclave is created
    pub fn is_input_error(&self) -> bool {
        !matches!(self, GenError::Unsatisfiable { .. })
    }
}
