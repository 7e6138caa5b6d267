pub mod candidate;
pub mod interval;
pub mod transcript;
pub mod window;

pub use candidate::*;
pub use interval::*;
pub use transcript::*;
pub use window::*;
