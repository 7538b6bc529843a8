use std::process::Command;

/// `git <args>` trimmed stdout, or `None` outside a checkout.
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-changed=../../.git/index");

    let revision = git(&["describe", "--always", "--dirty", "--abbrev=7"])
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=TMATCH_REVISION={revision}");

    for (var, fallback) in [("TARGET", "unknown"), ("PROFILE", "unknown")] {
        let value = std::env::var(var).unwrap_or_else(|_| fallback.to_string());
        println!("cargo:rustc-env=TMATCH_{var}={value}");
    }
}
