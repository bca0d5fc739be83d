// Infrastructure implementations: filesystem stages backing the ports.

pub mod engine;
pub mod manifest;
pub mod merger;
pub mod mirror;
pub mod staging;

pub use engine::SynInstrumentationEngine;
pub use manifest::ManifestAugmenter;
pub use merger::SuffixPatchMerger;
pub use mirror::FsTreeMirror;
pub use staging::StagingArea;
