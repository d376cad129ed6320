mod fixtures;
mod integration_tests;
