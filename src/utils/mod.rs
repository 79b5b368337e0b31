mod drug_list;
mod errors;
mod io_utils;
mod readers;
mod unphased;
mod util;

pub use drug_list::{normalize_drug_names, parse_drug_list};
pub use errors::InputError;
pub use io_utils::create_writer;
pub use readers::{
    check_variant_bytes, open_table_reader, read_variant_file, DEFAULT_MAX_FILE_SIZE,
};
pub use unphased::UnphasedCall;
pub use util::{handle_error_and_exit, optional_cell, split_list, Result};
