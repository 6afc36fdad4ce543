use std::fs;

fn main() {
    // Validate default config at compile time
    let config_path = "src/default_config.toml";
    println!("cargo:rerun-if-changed={}", config_path);

    let content = fs::read_to_string(config_path).expect("Failed to read default_config.toml");

    let table = match content.parse::<toml::Table>() {
        Ok(table) => table,
        Err(e) => panic!("Invalid default_config.toml: {}", e),
    };

    // Thresholds must be positive integers
    if let Some(segment) = table.get("segment").and_then(|v| v.as_table()) {
        for key in ["items_per_part", "min_list_items", "min_thirds_nodes"] {
            if let Some(value) = segment.get(key) {
                match value.as_integer() {
                    Some(n) if n > 0 => {}
                    _ => panic!("default_config.toml: segment.{} must be a positive integer", key),
                }
            }
        }
    }
}
