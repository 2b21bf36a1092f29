// firewatch_sim/src/lib.rs

// This prelude is for convenience for other files WITHIN the firewatch_sim crate
// and for integration tests.
pub mod prelude;

// Command-line definitions shared by the binary.
pub mod cli;

// Everything that talks to the outside world: bus, config, agent tasks.
pub mod simulation;
