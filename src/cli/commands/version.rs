//! Version command implementation

/// Version string printed by `version`
pub fn version_string() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

pub fn run() {
    println!("{}", version_string());
}
