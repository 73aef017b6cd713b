pub mod computed;
pub mod formatter;
pub mod path;
pub mod template;

pub use computed::*;
pub use formatter::*;
pub use path::*;
pub use template::*;
