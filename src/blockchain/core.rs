// core.rs splits responsibilities into submodules: block linkage and the
// append protocol live in `chain`, whole-chain checks in `validation`.
pub mod chain;
pub mod validation;

pub use chain::*;
pub use validation::*;
