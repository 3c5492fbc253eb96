pub mod assignment;
pub mod item;
pub mod person;
pub mod summary;

pub use assignment::{AssignmentIssue, AssignmentValidation, ItemAssignment};
pub use item::{remove_line_item, LineItem};
pub use person::Person;
pub use summary::{BillSummary, ParsedReceipt};
