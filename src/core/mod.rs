// ─── Server Launcher Core ───
// Builds launch commands for a modular application server and supervises the
// spawned process.
//
// Architecture:
//   core/
//     java/     : Runtime discovery + capability cache
//     launch/   : Argument model, topology builders, spawner, lifecycle
//     settings  : JSON launch defaults
//     messages  : Localizable diagnostic text
//     error     : Crate-wide error type

pub mod error;
pub mod java;
pub mod launch;
pub mod messages;
pub mod settings;
