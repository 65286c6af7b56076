//! Integration tests for the prompt assembly pipeline

mod assembler_pipeline;
mod backend_selection;
mod profile_loading;
pub mod test_utils;
