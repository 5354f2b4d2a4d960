use std::{
    error::Error,
    fmt::{Display, Formatter},
};

/// Result type used throughout the crate.
pub type FieldTraceResult<T> = Result<T, Box<dyn Error>>;

/// A fatal condition that isn't tied to a specific input column.
#[derive(Debug, Clone, Copy)]
pub struct FieldTraceError {
    pub msg: &'static str,
}

impl Display for FieldTraceError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.msg)
    }
}

impl Error for FieldTraceError {}

/// The input table is missing one or more of the required columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub missing: Vec<&'static str>,
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "trace is missing required column(s): {} (need lat, lon, time in ms)",
            self.missing.join(", ")
        )
    }
}

impl Error for SchemaError {}
