fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var_os("PROTOC").is_none() {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }
    println!("cargo:rerun-if-changed=proto/check.proto");
    tonic_build::configure()
        .build_server(false)
        .build_client(true)
        .compile(&["proto/check.proto"], &["proto/"])?;
    Ok(())
}
