//! C API のヘッダーファイル (include/emsg_id3.h) を生成する
fn main() {
    println!("cargo::rerun-if-changed=src");
    println!("cargo::rerun-if-changed=../../Cargo.toml");

    let version = root_package_version();
    println!("cargo::rustc-env=SHIGUREDO_EMSG_ID3_VERSION={version}");

    cbindgen::Builder::new()
        .with_crate(env!("CARGO_MANIFEST_DIR"))
        .with_language(cbindgen::Language::C)
        .with_cpp_compat(true)
        .with_include_version(true)
        .with_include_guard("SHIGUREDO_EMSG_ID3_H")
        .with_header(format!(
            "/* shiguredo_emsg_id3 {version}: EMSG / ID3 timed metadata extraction */"
        ))
        .with_documentation(true)
        .with_no_includes()
        .with_sys_include("stdint.h")
        .with_sys_include("stddef.h")
        .generate()
        .expect("Failed to generate C bindings")
        .write_to_file("include/emsg_id3.h");
}

/// ルートの Cargo.toml の [package] テーブルにある version を返す
///
/// 依存クレートの version 指定を拾わないように、他のテーブルの行は見ない
fn root_package_version() -> String {
    let root_cargo_toml = include_str!("../../Cargo.toml");
    let mut in_package = false;
    for line in root_cargo_toml.lines().map(str::trim) {
        if line.starts_with('[') {
            in_package = line == "[package]";
            continue;
        }
        if !in_package {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            if key.trim() == "version" {
                return value.trim().trim_matches('"').to_owned();
            }
        }
    }
    panic!("version not found in [package] of the root Cargo.toml");
}
