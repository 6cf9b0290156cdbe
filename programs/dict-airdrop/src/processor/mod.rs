mod claim;
mod initialize_distribution;
mod queries;
mod withdraw;

pub use claim::*;
pub use initialize_distribution::*;
pub use queries::*;
pub use withdraw::*;
