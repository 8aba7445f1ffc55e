// Server module entry point
// Listener setup, the accept loop, per-connection serving and signals

pub mod connection;
pub mod listener;
pub mod signal;
pub mod stream;

// `loop` is a keyword, so the module is exposed as server_loop
#[path = "loop.rs"]
pub mod server_loop;

pub use listener::bind;
pub use server_loop::run;
pub use signal::shutdown_signal;
