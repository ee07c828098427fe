use std::path::PathBuf;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=grammar.js");
    println!("cargo:rerun-if-changed=src/parser.c");
    println!("cargo:rerun-if-changed=build.rs");

    // Regenerate parser.c when the tree-sitter CLI is around; the checked-in
    // parser is used otherwise.
    match Command::new("tree-sitter").arg("generate").output() {
        Ok(output) if !output.status.success() => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            println!("cargo:warning=tree-sitter generate failed: {}", stderr);
        }
        Ok(_) => {}
        Err(e) => {
            println!(
                "cargo:warning=tree-sitter command not found, using the checked-in parser.c: {}",
                e
            );
        }
    }

    let dir: PathBuf = ["src"].iter().collect();

    let mut build = cc::Build::new();
    build.include(&dir);
    build.file(dir.join("parser.c"));
    build.warnings(false);

    build.compile("tree-sitter-yaral");
}
