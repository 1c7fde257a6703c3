use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("network compilation failed: {0}")]
    Network(#[from] notejam_network::NetworkError),

    // Unreachable through `Assembler::assemble` itself: the typed
    // wiring only lets a unit see outputs of units already built. The
    // graph's topological check still reports it for hand-built refs.
    #[error(
        "stack '{stack}' references output '{output}' of '{upstream}', which is not constructed yet"
    )]
    DependencyUnavailable {
        stack: String,
        upstream: String,
        output: String,
    },

    #[error("failed to encode resource specification: {0}")]
    Spec(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AssemblyError>;
