use bustrack::protocol::*;
use bustrack::CrowdLevel;

#[test]
fn test_protocol_handler_creation() {
    let handler = ProtocolHandler::new();
    assert_eq!(*handler.stats(), ProtocolStats::default());
}

#[test]
fn test_command_parsing_unit_variant() {
    let mut handler = ProtocolHandler::new();

    let ping_json = r#"{"id":123,"timestamp":1000,"command_type":"Ping"}"#;
    let command = handler.parse_command(ping_json).unwrap();
    assert_eq!(command.id, 123);
    assert_eq!(command.timestamp, 1000);
    assert_eq!(command.command_type, CommandType::Ping);
    assert_eq!(handler.stats().commands_parsed, 1);
}

#[test]
fn test_command_parsing_driver_commands() {
    let mut handler = ProtocolHandler::new();

    let start_json = serde_json::json!({
        "id": 7,
        "timestamp": 2000,
        "command_type": {"StartBusSimulation": {"driver_id": "driver-1", "route_id": "route_1"}}
    })
    .to_string();
    let command = handler.parse_command(&start_json).unwrap();
    assert_eq!(
        command.command_type,
        CommandType::StartBusSimulation {
            driver_id: "driver-1".to_string(),
            route_id: "route_1".to_string(),
        }
    );

    let crowd_json = serde_json::json!({
        "id": 8,
        "timestamp": 2100,
        "command_type": {"UpdateCrowdLevel": {"driver_id": "driver-1", "level": "high"}}
    })
    .to_string();
    let command = handler.parse_command(&crowd_json).unwrap();
    if let CommandType::UpdateCrowdLevel { driver_id, level } = command.command_type {
        assert_eq!(driver_id, "driver-1");
        assert_eq!(level, CrowdLevel::High);
    } else {
        panic!("Expected UpdateCrowdLevel command type");
    }
}

#[test]
fn test_command_parsing_rejects_bad_input() {
    let mut handler = ProtocolHandler::new();

    assert_eq!(handler.parse_command("not json"), Err(ProtocolError::InvalidJson));
    assert_eq!(
        handler.parse_command(r#"{"id":1,"timestamp":1,"command_type":"Teleport"}"#),
        Err(ProtocolError::InvalidJson)
    );
    let unknown_level = serde_json::json!({
        "id": 1,
        "timestamp": 1,
        "command_type": {"UpdateCrowdLevel": {"driver_id": "d", "level": "packed"}}
    })
    .to_string();
    assert_eq!(handler.parse_command(&unknown_level), Err(ProtocolError::InvalidJson));

    let oversized = format!(
        r#"{{"id":1,"timestamp":1,"command_type":{{"StopBusSimulation":{{"driver_id":"{}"}}}}}}"#,
        "x".repeat(MAX_COMMAND_SIZE)
    );
    assert_eq!(handler.parse_command(&oversized), Err(ProtocolError::MessageTooLarge));
    assert_eq!(handler.stats().parse_failures, 4);
}

#[test]
fn test_command_validation() {
    let handler = ProtocolHandler::new();

    assert!(handler.validate_command(&Command::new(1, CommandType::GetLiveBuses)).is_ok());
    assert_eq!(
        handler.validate_command(&Command::new(0, CommandType::GetLiveBuses)),
        Err(ProtocolError::InvalidCommand)
    );

    // Empty driver ids are the registry's business, not the protocol's
    let empty_driver = Command::new(
        2,
        CommandType::StopBusSimulation {
            driver_id: String::new(),
        },
    );
    assert!(handler.validate_command(&empty_driver).is_ok());
}

#[test]
fn test_response_serialization() {
    let mut handler = ProtocolHandler::new();

    let response = handler.create_response(42, ResponseStatus::Success, None);
    let json = handler.serialize_response(&response).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["id"], 42);
    assert_eq!(value["status"], "Success");
    assert!(value.get("message").is_none());
    assert!(value.get("data").is_none());

    let data = handler.create_data_response(43, serde_json::json!([1, 2, 3]));
    let json = handler.serialize_response(&data).unwrap();
    let parsed: CommandResponse = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.data, Some(serde_json::json!([1, 2, 3])));
    assert_eq!(handler.stats().responses_serialized, 2);
}

#[test]
fn test_parse_error_response() {
    let handler = ProtocolHandler::new();
    let response = handler.create_parse_error_response(ProtocolError::InvalidJson);

    assert_eq!(response.id, 0);
    assert_eq!(response.status, ResponseStatus::ParseError);
    assert!(response.message.unwrap().contains("Invalid JSON format"));
}
