pub mod password;
pub mod reading_parser;
