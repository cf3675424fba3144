//! # imgsim CLI
//!
//! Command-line interface for the image similarity engine.
//!
//! ## Usage
//! ```bash
//! imgsim compare a.jpg b.jpg --method phash
//! imgsim compare https://example.com/a.jpg b.jpg --method orb --output json
//! imgsim stats
//! ```

mod cli;

use image_similarity::Result;

fn main() -> Result<()> {
    cli::run()
}
