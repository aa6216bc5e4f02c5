//! Generates the `transit_realtime` bindings from the vendored GTFS Realtime schema.

const SCHEMA: &str = "proto/gtfs-realtime.proto";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed={SCHEMA}");

    // prost-build finds protoc through PROTOC; use the vendored binary so the
    // build does not depend on a system install.
    let protoc_path = protoc_bin_vendored::protoc_bin_path()?;
    unsafe {
        std::env::set_var("PROTOC", protoc_path);
    }

    prost_build::Config::new().compile_protos(&[SCHEMA], &["proto/"])?;

    Ok(())
}
