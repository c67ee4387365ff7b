//! Backend worker thread that runs catalog calls off the UI thread.

pub mod commands;
pub mod runtime;
