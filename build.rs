//! Build script for ffwrap
//!
//! Handles:
//! 1. Compiling the C accessor shim via `cc`
//! 2. Locating and linking the FFmpeg libraries

use std::env;
use std::path::{Path, PathBuf};

fn main() {
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();

    let ffmpeg_dir = find_ffmpeg_dir(&target_os);

    compile_accessors(&ffmpeg_dir);
    link_ffmpeg(&ffmpeg_dir);

    println!("cargo:rerun-if-changed=src/ffi/accessors.c");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=FFMPEG_DIR");
}

/// Locate the FFmpeg installation prefix.
///
/// Resolution order: `FFMPEG_DIR` env var, pkg-config, common install paths.
fn find_ffmpeg_dir(target_os: &str) -> PathBuf {
    if let Ok(dir) = env::var("FFMPEG_DIR") {
        return PathBuf::from(dir);
    }

    #[cfg(unix)]
    {
        if let Ok(output) = std::process::Command::new("pkg-config")
            .args(["--variable=prefix", "libavcodec"])
            .output()
        {
            if output.status.success() {
                let prefix = String::from_utf8_lossy(&output.stdout);
                let path = PathBuf::from(prefix.trim());
                if path.exists() {
                    return path;
                }
            }
        }
    }

    let common_paths = match target_os {
        "macos" => vec![
            "/opt/homebrew", // Apple Silicon Homebrew
            "/usr/local",    // Intel Homebrew / manual install
            "/opt/local",    // MacPorts
        ],
        "linux" => vec!["/usr", "/usr/local", "/opt/ffmpeg"],
        "windows" => vec!["C:\\ffmpeg", "C:\\Program Files\\ffmpeg"],
        _ => vec![],
    };

    for path in common_paths {
        let p = PathBuf::from(path);
        if p.join("include/libavcodec/avcodec.h").exists() {
            return p;
        }
    }

    println!(
        "cargo:warning=FFmpeg not found. Set FFMPEG_DIR environment variable or install FFmpeg."
    );
    PathBuf::from("/usr/local")
}

/// Compile the C accessor shim that reads/writes version-sensitive struct fields.
fn compile_accessors(ffmpeg_dir: &Path) {
    let mut build = cc::Build::new();
    build
        .file("src/ffi/accessors.c")
        .include(ffmpeg_dir.join("include"))
        .warnings(true);

    // pkg-config may report extra include dirs (split installs on some distros)
    #[cfg(unix)]
    {
        if let Ok(output) = std::process::Command::new("pkg-config")
            .args(["--cflags-only-I", "libavcodec"])
            .output()
        {
            if output.status.success() {
                for flag in String::from_utf8_lossy(&output.stdout).split_whitespace() {
                    if let Some(dir) = flag.strip_prefix("-I") {
                        build.include(dir);
                    }
                }
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        build.flag("-Wno-deprecated-declarations");
    }

    build.compile("ffwrap_accessors");
}

/// Link the FFmpeg libraries dynamically. Order matters: avformat depends on
/// avcodec, which depends on avutil.
fn link_ffmpeg(ffmpeg_dir: &Path) {
    let lib_dir = ffmpeg_dir.join("lib");
    if lib_dir.exists() {
        println!("cargo:rustc-link-search=native={}", lib_dir.display());
    }

    for lib in ["avformat", "avcodec", "avutil"] {
        println!("cargo:rustc-link-lib={}", lib);
    }
}
