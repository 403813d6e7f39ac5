use std::path::Path;

use crate::error::Error;

/// Example GB to NI movement used by the create and update routes.
const EXAMPLE_MOVEMENT: &str = r#"{
    "direction": "GB_TO_NI",
    "isUnaccompanied": false,
    "vehicleRegNum": "TEST DEF",
    "plannedCrossing": {
        "routeId": "1",
        "localDateTimeOfDeparture": "2021-08-11T10:58"
    },
    "customsDeclarations": [
        {
            "customsDeclarationId": "0GB689223596000-SE119404",
            "sAndSMasterRefNum": "20GB01I0XLM976S001"
        },
        {
            "customsDeclarationId": "0GB689223596000-SE119405",
            "sAndSMasterRefNum": "20GB01I0XLM976S002"
        }
    ],
    "transitDeclarations": [
        {
            "transitDeclarationId": "10GB00002910B75BE5",
            "isTSAD": true
        },
        {
            "transitDeclarationId": "10GB00002910B75BE6",
            "sAndSMasterRefNum": "20GB01I0XLM976S004",
            "isTSAD": false
        }
    ]
}"#;

/// The bundled example movement payload.
#[must_use]
pub fn example_movement() -> serde_json::Value {
    serde_json::from_str(EXAMPLE_MOVEMENT).unwrap_or(serde_json::Value::Null)
}

/// Load a replacement movement payload from a JSON file.
///
/// # Errors
///
/// Returns [`Error::Config`] if the file cannot be read or is not JSON.
pub fn load_movement(path: &Path) -> Result<serde_json::Value, Error> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&raw).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
}
