//! Group credentials and the topic/command derivations built on them.

use std::fmt;

use crate::corrade::codec::KeyValues;

/// Corrade command used to speak in group chat.
const TELL_COMMAND: &str = "tell";

/// Corrade entity addressed by group chat commands.
const GROUP_ENTITY: &str = "group";

/// Group name and shared password configured in Corrade.
#[derive(Clone, PartialEq, Eq)]
pub struct GroupCredential {
    group_name: String,
    password: String,
}

impl GroupCredential {
    pub fn new(group_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            password: password.into(),
        }
    }

    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    /// MQTT topic carrying group chat in both directions.
    pub fn topic(&self) -> String {
        format!("{}/{}/group", self.group_name, self.password)
    }

    /// Build the encoded `tell` command that says `message` in group chat.
    pub fn tell_group(&self, message: &str) -> String {
        let command: KeyValues = [
            ("command", TELL_COMMAND),
            ("group", self.group_name.as_str()),
            ("password", self.password.as_str()),
            ("entity", GROUP_ENTITY),
            ("message", message),
        ]
        .into_iter()
        .collect();
        command.encode()
    }
}

impl fmt::Debug for GroupCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupCredential")
            .field("group_name", &self.group_name)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corrade::codec::decode;

    #[test]
    fn test_topic() {
        let credential = GroupCredential::new("MyGroup", "secret");
        assert_eq!(credential.topic(), "MyGroup/secret/group");
    }

    #[test]
    fn test_tell_group_field_order() {
        let credential = GroupCredential::new("MyGroup", "secret");
        assert_eq!(
            credential.tell_group("hi"),
            "command=tell&group=MyGroup&password=secret&entity=group&message=hi"
        );
    }

    #[test]
    fn test_tell_group_decodes() {
        let credential = GroupCredential::new("My Group", "p&ss");
        let values = decode(credential.tell_group("Bob#0001 [Discord]: yo").as_bytes()).unwrap();

        assert_eq!(values.get("command"), Some("tell"));
        assert_eq!(values.get("group"), Some("My Group"));
        assert_eq!(values.get("password"), Some("p&ss"));
        assert_eq!(values.get("entity"), Some("group"));
        assert_eq!(values.get("message"), Some("Bob#0001 [Discord]: yo"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let credential = GroupCredential::new("MyGroup", "secret");
        let debug = format!("{:?}", credential);
        assert!(debug.contains("MyGroup"));
        assert!(!debug.contains("secret"));
    }
}
