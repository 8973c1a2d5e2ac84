fn main() {
    use protox::prost::Message;

    let out_dir = std::path::PathBuf::from(std::env::var("OUT_DIR").unwrap());
    let file_descriptor_set = protox::compile(["proto/lodestone.proto"], ["proto/"])
        .expect("failed to compile proto/lodestone.proto");

    let descriptor_set_path = out_dir.join("lodestone_descriptor.bin");
    std::fs::write(&descriptor_set_path, file_descriptor_set.encode_to_vec())
        .expect("failed to write file descriptor set");

    tonic_build::configure()
        .file_descriptor_set_path(descriptor_set_path)
        .compile_fds(file_descriptor_set)
        .expect("failed to generate code from proto/lodestone.proto");
}
