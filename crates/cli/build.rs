use std::env;
use std::fs;
use std::path::PathBuf;

/// Version from a `VERSION` file at the repository root, if it looks like one.
fn version_file() -> Option<(PathBuf, String)> {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").ok()?);
    let path = manifest_dir.parent()?.parent()?.join("VERSION");
    let version = fs::read_to_string(&path).ok()?.trim().to_string();
    version
        .chars()
        .next()
        .filter(char::is_ascii_digit)
        .map(|_| (path, version))
}

fn main() {
    let cargo_version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());

    let version = match version_file() {
        Some((path, version)) => {
            println!("cargo:rerun-if-changed={}", path.display());
            if version != cargo_version {
                println!(
                    "cargo:warning=Using version {version} from VERSION file (Cargo.toml has {cargo_version})"
                );
            }
            version
        }
        None => cargo_version,
    };

    println!("cargo:rustc-env=CONTROLPATH_VERSION={version}");
}
