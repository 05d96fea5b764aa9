mod backend;
pub use backend::*;

mod batch;
pub use batch::*;

mod measure;
pub use measure::*;

mod tap;
pub use tap::*;
