pub type Result<T> = std::result::Result<T, String>;

pub fn handle_error_and_exit(err: String) -> ! {
    log::error!("{}", err);
    std::process::exit(1);
}

/// Splits a `;`-separated table cell into its items, treating `.` as empty.
pub fn split_list(cell: &str) -> Vec<String> {
    if cell == "." {
        return Vec::new();
    }
    cell.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

pub fn optional_cell(cell: &str) -> Option<String> {
    match cell.trim() {
        "" | "." => None,
        value => Some(value.to_string()),
    }
}
