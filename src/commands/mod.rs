pub mod parse;
pub mod patterns;
pub mod output;

pub use parse::run_parse;
pub use patterns::run_patterns;
