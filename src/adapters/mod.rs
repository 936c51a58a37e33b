// Adapters layer: concrete implementations for external systems.
// Local storage lives under config/cli.rs next to the CLI configuration.

pub mod ingest;
