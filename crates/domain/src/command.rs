//! Cloud command bodies posted to `/v1.1/devices/{id}/commands`.

use serde::{Deserialize, Serialize};

/// Whether the command is a built-in one or a user-defined button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    #[default]
    Command,
    Customize,
}

/// JSON body of a device command request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCommand {
    pub command: String,
    pub parameter: String,
    pub command_type: CommandType,
}

impl DeviceCommand {
    /// A built-in command that takes no argument.
    #[must_use]
    pub fn simple(command: impl Into<String>) -> Self {
        Self::with_parameter(command, "default")
    }

    /// A built-in command with an argument.
    #[must_use]
    pub fn with_parameter(command: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            parameter: parameter.into(),
            command_type: CommandType::Command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_with_vendor_field_names() {
        let command = DeviceCommand::with_parameter("setPosition", "up;60");
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "command": "setPosition",
                "parameter": "up;60",
                "commandType": "command",
            })
        );
    }

    #[test]
    fn should_use_default_parameter_for_simple_commands() {
        let command = DeviceCommand::simple("turnOn");
        assert_eq!(command.parameter, "default");
        assert_eq!(command.command_type, CommandType::Command);
    }
}
