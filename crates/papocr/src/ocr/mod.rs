pub mod engine;
pub mod params;

pub use engine::{classify_exit, EngineError, OcrEngine, OcrMyPdfEngine};
pub use params::{construct_parameters, ParameterRequest, ParameterSet};
