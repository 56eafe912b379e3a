// mod.rs - Character datatypes and alignments

pub mod alignment;
pub mod datatype;
pub mod loaders;

pub use alignment::{load_labels, load_partitions, Alignment, Partition, SitePatterns};
pub use datatype::{CharacterDataType, MISSING_CHARS};
