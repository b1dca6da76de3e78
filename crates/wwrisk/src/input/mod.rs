//! Raw wastewater records and the sources that supply them.

mod sample;
mod source;

pub use sample::{
    RawSample, is_missing_value, parse_number, parse_sample_date, split_fips_list,
};
pub use source::{
    CsvRecordSource, FallbackSource, InMemorySource, JsonRecordSource, RecordQuery, RecordSource,
};
