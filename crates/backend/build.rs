use std::env;
use std::fs;
use std::path::Path;

/// Copies config.toml and the SQL migrations next to the built binary.
fn main() {
    println!("cargo:rerun-if-changed=../../config.toml");
    println!("cargo:rerun-if-changed=../../migrations");

    let out_dir = env::var("OUT_DIR").unwrap();
    let profile = env::var("PROFILE").unwrap();

    // OUT_DIR looks like target/<profile>/build/backend-xxx/out
    let target_dir = Path::new(&out_dir)
        .ancestors()
        .find(|p| p.ends_with(&profile))
        .expect("Could not find target profile directory");

    let workspace_root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("Could not find workspace root");

    let source_config = workspace_root.join("config.toml");
    if source_config.exists() {
        fs::copy(&source_config, target_dir.join("config.toml"))
            .unwrap_or_else(|e| panic!("Failed to copy config.toml: {}", e));
    } else {
        println!(
            "cargo:warning=config.toml not found at {:?}, using default config",
            source_config
        );
    }

    let source_migrations = workspace_root.join("migrations");
    if source_migrations.is_dir() {
        let dest = target_dir.join("migrations");
        fs::create_dir_all(&dest)
            .unwrap_or_else(|e| panic!("Failed to create migrations dir: {}", e));
        for entry in fs::read_dir(&source_migrations).expect("Could not read migrations") {
            let path = entry.expect("Bad migrations entry").path();
            if path.extension().map(|e| e == "sql").unwrap_or(false) {
                if let Some(name) = path.file_name() {
                    fs::copy(&path, dest.join(name))
                        .unwrap_or_else(|e| panic!("Failed to copy {:?}: {}", path, e));
                }
            }
        }
    }
}
