//! Retrieves information about the version of the planner from Git and the
//! build environment. This information can be accessed at runtime by the
//! binary.

fn main() -> shadow_rs::SdResult<()> {
    shadow_rs::new()
}
