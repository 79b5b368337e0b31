mod write_json;

pub use write_json::JsonWriter;
