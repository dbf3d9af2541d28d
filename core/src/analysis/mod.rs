pub use constraints::*;
pub use observation::*;

mod constraints;
mod observation;
