//! Files written under the output directory.
//!
//! # Submodules
//!
//! - [`json`]: the persisted run and per-hero records; also the
//!   [`RunStore`](crate::orchestrator::RunStore) the orchestrator resumes from
//! - [`report`]: Markdown summary of a run (`report` command)
//! - [`sql`]: standalone SQL import script (`sql` command)
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── heroes-data.json
//! ├── individual-heroes/
//! │   └── {slug}.json
//! ├── report.md
//! └── heroes-import.sql
//! ```

pub mod json;
pub mod report;
pub mod sql;
