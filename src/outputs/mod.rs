//! Output generation for scraped articles.
//!
//! # Submodules
//!
//! - [`json`]: Saves articles as JSON under a namespace, resolving slug collisions
//! - [`indexes`]: Maintains the per-namespace `index.md`
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── public/
//! │   ├── index.md
//! │   └── some-article.json
//! └── alice/
//!     ├── index.md
//!     ├── real-title.json
//!     └── real-title-2.json
//! ```

pub mod indexes;
pub mod json;
