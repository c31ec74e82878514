fn main() {
    // Secrets baked into the image as a fallback when NVS holds none.
    println!("cargo:rerun-if-env-changed=PULSENODE_SECRETS");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
