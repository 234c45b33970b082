#[path = "../common/mod.rs"]
mod common;

mod command_tests;
mod ssh_tests;
