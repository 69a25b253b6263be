//! Output generation.
//!
//! # Submodules
//!
//! - [`markdown`]: Derives the post filename from its frontmatter title and
//!   writes the Markdown file
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── 2025-05-06-new-ai-model-beats-benchmark.md
//! └── 2025-05-07-ai-research-update.md
//! ```

pub mod markdown;
