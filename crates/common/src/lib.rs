//! Shared plumbing for the json-mock binaries: logging setup, the admin
//! side listener and small wire types.

pub mod admin_http;
pub mod types;
pub mod utils;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(serde_json::to_value(&h).unwrap()["status"], "ok");
    }
}
