pub mod alert;
pub mod enums;
pub mod history;
pub mod observation;
pub mod profile;

pub use alert::*;
pub use enums::*;
pub use history::*;
pub use observation::*;
pub use profile::*;
