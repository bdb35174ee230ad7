pub mod command;
pub mod count;
pub mod detect;
pub mod reader_args;
pub mod split;
