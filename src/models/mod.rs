pub mod frame;
pub mod site;
pub mod site_records;
pub mod timestamp;

pub use frame::{Column, Frame};
pub use site::SiteLabel;
pub use site_records::SiteRecords;
