//! Command line tests

mod config_tests;
