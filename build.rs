//! Retrieves information about the version of the engine from Git and the build
//! environment so that the binary can identify how it was built.

fn main() -> shadow_rs::SdResult<()> {
    shadow_rs::new()
}
