// Domain layer: core models, ports (interfaces) and pure services.
// Services never touch the filesystem; adapters feed them decoded tables.

pub mod model;
pub mod ports;

pub mod services;
