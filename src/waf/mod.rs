// 403 bypass techniques

pub mod bypass;

pub use bypass::{BypassStrategy, BypassTechnique, HeaderBypass, PathBypass};
