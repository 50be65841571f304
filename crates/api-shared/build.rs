//! Build script for the `api-shared` crate.
//!
//! Compiles `risk.proto` into the message types both servers speak. Each message also derives
//! serde and utoipa so the REST server can take and return it as JSON and document it in
//! OpenAPI. Every message is `#[serde(default)]`: a JSON body may leave out any field, which
//! then reads as absent the same way an unset proto3 field does.
//!
//! The descriptor set written to `OUT_DIR` backs gRPC reflection.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let proto_file = std::path::Path::new(manifest_dir).join("risk.proto");
    let proto_include_root = std::path::Path::new(manifest_dir);

    println!("cargo:rerun-if-changed={}", proto_file.display());
    tonic_build::configure()
        .build_server(true)
        .build_client(false)
        .type_attribute(
            ".",
            "#[derive(serde::Serialize, serde::Deserialize, utoipa::ToSchema)]",
        )
        .type_attribute(".", "#[serde(default)]")
        .file_descriptor_set_path(
            std::path::Path::new(&std::env::var("OUT_DIR")?).join("proto_descriptor.bin"),
        )
        .compile_protos(std::slice::from_ref(&proto_file), &[proto_include_root])?;

    Ok(())
}
