use std::{env, path::PathBuf};

/// Help `ffmpeg-sys-next` find FFmpeg on Windows, where there is no
/// pkg-config. Other targets need nothing from this script.
fn main() {
    for variable in ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_DYNAMIC", "VCPKGRS_TRIPLET"] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows") || env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Some(vcpkg_root) = env::var_os("VCPKG_ROOT") else {
        println!("cargo:warning=framegrab: set FFMPEG_DIR (or VCPKG_ROOT) so FFmpeg can be found on Windows.");
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let candidate = PathBuf::from(vcpkg_root).join("installed").join(&triplet);
    if !candidate.exists() {
        println!(
            "cargo:warning=framegrab: no vcpkg FFmpeg for triplet {triplet} under {}.",
            candidate.display()
        );
        return;
    }

    println!(
        "cargo:warning=framegrab: found vcpkg FFmpeg at {0}; set FFMPEG_DIR={0} to silence this.",
        candidate.display()
    );
    if env::var_os("VCPKGRS_DYNAMIC").is_none() {
        println!("cargo:warning=framegrab: set VCPKGRS_DYNAMIC=1 for dynamic vcpkg FFmpeg builds.");
    }
}
