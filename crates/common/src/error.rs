use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A rate that is zero, negative, or whose log weight is not finite.
    #[error("Invalid rate {rate} for {origin} -> {destination}: rates must be strictly positive.")]
    InvalidRate {
        origin: String,
        destination: String,
        rate: String,
    },

    /// Query for a currency or an edge that is not in the graph.
    #[error("{0} not found in exchange graph.")]
    NotFound(String),

    /// The detector ran out of relaxation passes before it could certify a result.
    #[error("Detection incomplete: relaxation budget of {0} passes exhausted.")]
    BudgetExceeded(usize),

    /// Significant digits outside the range a scaled decimal can represent.
    #[error("Precision of {0} significant digits is out of range (1..=28).")]
    InvalidPrecision(u32),

    /// Indicates a structural inconsistency found while building or walking a snapshot.
    #[error("Graph structure is invalid or inconsistent.")]
    InvalidGraph,

    /// Failed to trace the full cycle path, usually due to broken predecessor chains.
    #[error("Cycle path reconstruction failed due to broken predecessor chain.")]
    CycleReconstructionFailed,
}
