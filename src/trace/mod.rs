mod formatter;

pub use formatter::RunFormatter;
