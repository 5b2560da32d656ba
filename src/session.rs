//! Session report payload.

use crate::identity::ClientIdentity;

/// Form body for the session endpoint.
///
/// Values are inserted verbatim, without URL escaping; the server parses this
/// exact shape.
pub fn session_form_body(identity: &ClientIdentity) -> String {
    format!(
        "AppID={}&AppVersion={}&DeviceID={}",
        identity.app_id, identity.app_version, identity.device_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_body() {
        let identity = ClientIdentity::new(
            "https://collect.example.org/",
            "refraktions",
            "2.1",
            "0B3C7E7A-1F6D-4B44-9E55-7A0C9C3E1D20",
        );

        assert_eq!(
            session_form_body(&identity),
            "AppID=refraktions&AppVersion=2.1&DeviceID=0B3C7E7A-1F6D-4B44-9E55-7A0C9C3E1D20"
        );
    }

    #[test]
    fn test_values_are_not_escaped() {
        let identity = ClientIdentity::new("http://x/", "my app", "1.0 beta", "a&b");
        assert_eq!(
            session_form_body(&identity),
            "AppID=my app&AppVersion=1.0 beta&DeviceID=a&b"
        );
    }
}
