// Build provenance shown by `mapbridge version --extended`.
const PROVENANCE: &[(&str, &str)] = &[
    ("TARGET", "MAPBRIDGE_BUILD_TARGET"),
    ("PROFILE", "MAPBRIDGE_BUILD_PROFILE"),
];

fn main() {
    for (cargo_var, exported) in PROVENANCE {
        if let Ok(value) = std::env::var(cargo_var) {
            println!("cargo:rustc-env={exported}={value}");
        }
        println!("cargo:rerun-if-env-changed={cargo_var}");
    }
}
