mod io_tests;
mod mutation_tests;
