pub mod clean;
pub mod release_date;

pub use clean::{clean_records, write_clean_csv, MIN_REVIEWS};
pub use release_date::parse_release_date;
