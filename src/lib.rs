#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod analysis;
pub mod eos;
pub mod error;
pub mod loader;
pub mod params;
pub mod rates;
pub mod sample;
pub mod trend;
pub mod units;
pub mod window;

pub use analysis::{analyze, Analysis, AnalysisResult};
pub use error::Error;

pub type Result<T> = ::std::result::Result<T, Error>;
