mod parse_mode;

pub use parse_mode::parse_mode;
