pub mod scratch;

pub use scratch::ScratchFiles;
