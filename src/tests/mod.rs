mod aliases;
mod helper;
mod invalid_json;
