use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=build.rs");

    // host builds (tests) link normally
    if env::var("CARGO_CFG_TARGET_ARCH").as_deref() != Ok("riscv32") {
        return Ok(());
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("cargo always sets OUT_DIR"));
    let link_dir = PathBuf::from("src/arch/link");

    // Put the linker scripts somewhere the linker can find them
    println!("cargo:rustc-link-search={}", out_dir.display());
    for entry in fs::read_dir(link_dir)? {
        let entry = entry?;
        println!("cargo:rerun-if-changed={}", entry.path().display());
        fs::copy(entry.path(), out_dir.join(entry.file_name()))?;
    }

    // set "-C link-arg=-Tlink.ld" argument when linking to use the custom linker script
    println!("cargo:rustc-link-arg-bins=-Tlink.ld");
    Ok(())
}
