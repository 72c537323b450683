mod common;
mod compile_tests;
mod scheduler_tests;
