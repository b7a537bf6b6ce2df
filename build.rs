use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;

// Fingerprint of static/ used to bust the stylesheet cache across deploys.
fn hash_dir(dir: &Path, hasher: &mut DefaultHasher) {
    let mut files: Vec<_> = fs::read_dir(dir)
        .expect("static/ directory should exist")
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    for path in files {
        path.file_name().hash(hasher);
        fs::read(&path).expect("static file should be readable").hash(hasher);
    }
}

fn main() {
    println!("cargo:rerun-if-changed=static/");
    println!("cargo:rerun-if-changed=migrations/");

    let mut hasher = DefaultHasher::new();
    hash_dir(Path::new("static"), &mut hasher);

    let hash = format!("{:016x}", hasher.finish());
    println!("cargo:rustc-env=STATIC_HASH={}", &hash[..8]);
}
