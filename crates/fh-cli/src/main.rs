//! fanhub - threaded comments for fan community posts
//!
//! ## Quick Start
//!
//! ```bash
//! # Comment on a post
//! fanhub comments add --post mv-teaser --author bunny --text "the choreo!!"
//!
//! # Reply to a comment
//! fanhub comments reply --post mv-teaser --parent <ID> --author tokki --text "same"
//!
//! # Show the thread
//! fanhub comments list --post mv-teaser
//! ```

mod commands;

fn main() {
    if let Err(err) = commands::run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
