pub mod allocator;
pub mod normalizer;
pub mod parser;

pub use allocator::AllocationEngine;
pub use parser::ReceiptParser;
