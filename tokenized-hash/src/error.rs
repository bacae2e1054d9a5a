use displaydoc::Display;
use thiserror::Error;

#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    /// parsing error : {0}
    ParsingError(String),
    /// wrong hash size: expected {expected} bytes, got {got}
    WrongSize { expected: usize, got: usize },
}
