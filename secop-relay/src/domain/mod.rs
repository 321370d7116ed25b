pub mod date;

pub use date::{is_valid_date, previous_business_day, DateResolver, DateSpec};
