//! Error types for the renderer and its host bindings.

use std::fmt;

use crate::gpu::ShaderStage;

/// Errors raised by renderer operations.
///
/// None of these ever escape the frame loop. Operations that fail leave the
/// renderer in the state it had before the call.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A shader stage failed to compile; carries the compiler log.
    ShaderCompile { stage: ShaderStage, log: String },
    /// The two stages compiled but did not link; carries the linker log.
    ProgramLink { log: String },
    /// The host cannot provide a WebGL2 context.
    ContextUnavailable(String),
    /// A pattern index outside the registry.
    IndexOutOfRange { index: usize, count: usize },
    /// The context refused to allocate an object (program, buffer, ...).
    ResourceCreation(&'static str),
    /// A color setting that is neither a sentinel nor `#rrggbb`.
    InvalidColor(String),
    /// Reading the drawing buffer back failed.
    PixelReadback(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ShaderCompile { stage, log } => {
                write!(f, "{} shader compile error: {}", stage, log)
            }
            Error::ProgramLink { log } => write!(f, "program link error: {}", log),
            Error::ContextUnavailable(reason) => {
                write!(f, "graphics context unavailable: {}", reason)
            }
            Error::IndexOutOfRange { index, count } => write!(
                f,
                "pattern index {} out of range (registry has {} patterns)",
                index, count
            ),
            Error::ResourceCreation(what) => write!(f, "failed to create {}", what),
            Error::InvalidColor(input) => write!(f, "invalid color value {:?}", input),
            Error::PixelReadback(reason) => write!(f, "failed to read pixels: {}", reason),
        }
    }
}

impl std::error::Error for Error {}

impl From<Error> for wasm_bindgen::JsValue {
    fn from(e: Error) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
