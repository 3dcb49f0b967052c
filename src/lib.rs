pub mod correlate;
pub mod dataset;
pub mod direction;
mod error;
pub mod gkma;
pub mod gpumd_out;
pub mod hnemd;
pub mod integrate;
pub mod math;
pub mod parser;
pub mod units;

pub use dataset::{Dataset, Field, Fields};
pub use direction::{parse_directions, Direction};
pub use error::{KappaError, KappaResult};
pub use gkma::{get_gkma_kappa, GkmaError, GkmaOutput, GkmaParams, OutputOptions, TAU_KEY};
pub use hnemd::hnemd_spectral_kappa;
pub use integrate::{cumtrapz, running_average};
