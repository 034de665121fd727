//! Application surface for the prairie simulation: the TCP viewer server
//! shared by the `prairie` binary and its tests.

pub mod viewer;

pub use viewer::start_viewer;
