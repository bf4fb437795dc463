//! Integration tests for the learning path synthesis engine

mod cli_commands;
mod flow_synthesis;
mod progress_observability;
mod test_utils;
