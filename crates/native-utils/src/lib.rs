pub mod audio;
pub mod device;
mod error;
pub mod recorder;

pub use error::AudioError;
