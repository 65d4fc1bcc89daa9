//! Discovery of command and plugin manifests in a project tree.
//!
//! # Layout
//!
//! ```text
//! project/
//! ├── tools/
//! │   ├── deploy.command.json
//! │   └── lint.command.json
//! ├── plugins/
//! │   └── audit.plugin.json
//! └── target/            (ignored)
//! ```

mod loader;
mod walker;

pub use loader::{
    classify, discover, find_manifests, Candidate, DiscoveryConfig, DiscoveryReport, ManifestKind,
};
pub use walker::walk;
