fn main() -> Result<(), Box<dyn std::error::Error>> {
    // The gRPC bindings for proto/fedlink.proto are committed under
    // src/protocol/ and kept in sync by hand. Regenerating requires protoc;
    // install it and uncomment below:
    //
    // tonic_build::configure()
    //     .build_server(true)
    //     .build_client(true)
    //     .out_dir("src/protocol/generated")
    //     .compile(&["proto/fedlink.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/fedlink.proto");
    Ok(())
}
