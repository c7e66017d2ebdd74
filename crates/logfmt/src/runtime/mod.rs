//! Runtime module — CLI lifecycle: arguments, boot, run.

pub mod args;
pub mod boot;
pub mod run;
