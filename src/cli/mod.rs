//! CLI module - Command-line interface for Comicshelf
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Comicshelf - browse the Marvel catalog and keep a shelf of favorites
#[derive(Parser)]
#[command(name = "comicshelf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server (default)
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Fetch one catalog page from the comic API and print it
    Fetch {
        /// Zero-based catalog offset
        #[arg(default_value = "0")]
        offset: u32,
    },

    /// Manage user accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create an account. The password is read from stdin.
    Add {
        username: String,
        email: String,
        identification: String,
    },
}

pub use commands::*;
