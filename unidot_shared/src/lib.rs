mod color;

pub use color::*;

pub use chrono;
pub use float_cmp;
pub use indoc;
pub use log;
pub use maplit;
pub use pathdiff;
pub use thiserror;
pub use walkdir;
