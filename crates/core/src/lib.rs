pub mod csr;
pub mod currency;
pub mod diagnostics;
pub mod graph;
pub mod solver;
pub mod traits;

pub use csr::GraphCSR;
pub use currency::Currency;
pub use graph::ExchangeGraph;
pub use solver::{BellmanFordSolver, DetectorConfig};
pub use traits::CycleDetector;
