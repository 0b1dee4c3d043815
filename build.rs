fn main() {
    // docs.rs has no toolchain for the vendored boolector, skip building it
    if std::env::var("DOCS_RS").is_ok() {
        println!("cargo:rustc-env=BOOLECTOR_NO_VENDOR=1");
    }
}
