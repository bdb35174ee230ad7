fn main() {
    // Writes built.rs (package version, git hash, dirty state) into OUT_DIR for --version.
    built::write_built_file().expect("Failed to acquire build-time information");
}
