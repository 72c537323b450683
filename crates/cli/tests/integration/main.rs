mod common;
mod compile_tests;
mod plan_tests;
