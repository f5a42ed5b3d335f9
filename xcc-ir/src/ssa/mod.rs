//! SSA construction from the AST

pub mod constructor;
pub mod translation;

pub use constructor::{GraphConstructor, Variable};
pub use translation::{translate_program, SsaTranslation};

#[cfg(test)]
mod tests;
