//! Language-model oracle implementations for Maestro.
//!
//! All providers implement the `maestro_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
