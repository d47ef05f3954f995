pub mod patch_parser;

pub use patch_parser::{PatchPath, SubAttributeFilter};
