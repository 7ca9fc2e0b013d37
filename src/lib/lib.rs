pub mod em;
pub mod error;
pub mod fit;
pub mod model;
pub mod observation;

pub use error::EmError;
pub use fit::{run, run_with_settings, EmFit, EmSettings, History};
pub use model::{Coin, Parameters};
pub use observation::{Observation, ObservationSet};
