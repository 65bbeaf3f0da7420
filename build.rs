/// Build script for orbsim
/// Embeds version metadata shown by `orbsim version`

fn main() {
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-changed=.git/HEAD");

    if let Ok(version) = std::env::var("CARGO_PKG_VERSION") {
        println!("cargo:rustc-env=ORBSIM_VERSION={version}");
    }

    // Absent outside a git checkout; the version line then omits the hash.
    if let Ok(output) = std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
    {
        if output.status.success() {
            if let Ok(hash) = String::from_utf8(output.stdout) {
                println!("cargo:rustc-env=ORBSIM_GIT_HASH={}", hash.trim());
            }
        }
    }
}
