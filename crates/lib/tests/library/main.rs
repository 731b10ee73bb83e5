//! End-to-end tests of depbuild-lib runs against local HTTP mirrors.

mod common;
mod run_tests;
