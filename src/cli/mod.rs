mod args;
mod clarify;
mod commands;
mod config_cmd;
mod render;

pub use args::Cli;

#[cfg(test)]
mod tests;
