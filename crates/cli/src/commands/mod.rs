//! CLI Commands

pub mod normalize;
pub mod publish;
pub mod run;
