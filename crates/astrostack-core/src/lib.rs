pub mod consts;
pub mod error;
pub mod frame;
pub mod io;
pub mod detection;
pub mod align;
pub mod resample;
pub mod stack;
pub mod postprocess;
pub mod filters;
pub mod pipeline;
