// mod.rs - Alignment file loaders

pub mod delimited;
pub mod fasta;
