//! Uniform response envelope.

// self
use crate::_prelude::*;

/// JSON envelope returned by every endpoint: `{success, data, message?, description?, errors?}`.
///
/// `success` follows the status class. Rejections only carry the stable reason code and a fixed
/// description, never internal error text.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ApiResponse {
	/// HTTP status for the outer layer; not part of the body.
	#[serde(skip)]
	pub status: u16,
	/// `true` for 2xx statuses.
	pub success: bool,
	/// Payload items.
	pub data: Vec<serde_json::Value>,
	/// Short machine-friendly message.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	/// Human-readable description.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Field-level or auxiliary error strings.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub errors: Vec<String>,
}
impl ApiResponse {
	/// Wraps a handler payload.
	///
	/// An object's `message`, `description`, and `errors` members are lifted into the envelope;
	/// the rest of a non-empty object becomes the single `data` item. Arrays become `data`.
	pub fn new(status: u16, payload: serde_json::Value) -> Self {
		let mut response = Self {
			status,
			success: (200..300).contains(&status),
			data: Vec::new(),
			message: None,
			description: None,
			errors: Vec::new(),
		};

		match payload {
			serde_json::Value::Array(items) => response.data = items,
			serde_json::Value::Object(mut map) => {
				response.message = map.remove("message").and_then(into_string);
				response.description = map.remove("description").and_then(into_string);
				response.errors = match map.remove("errors") {
					Some(serde_json::Value::Array(items)) =>
						items.into_iter().filter_map(into_string).collect(),
					_ => Vec::new(),
				};

				if !map.is_empty() {
					response.data.push(serde_json::Value::Object(map));
				}
			},
			serde_json::Value::Null => {},
			other => response.data.push(other),
		}

		response
	}

	/// `200 OK` with a serializable payload.
	pub fn ok<T>(payload: &T) -> Result<Self, serde_json::Error>
	where
		T: ?Sized + Serialize,
	{
		Ok(Self::new(200, serde_json::to_value(payload)?))
	}

	/// Rejection for an error category.
	pub fn rejection(kind: ErrorKind) -> Self {
		Self {
			status: kind.http_status(),
			success: false,
			data: Vec::new(),
			message: Some(kind.as_str().to_owned()),
			description: Some(kind.description().to_owned()),
			errors: Vec::new(),
		}
	}

	/// `403 Forbidden` for an authenticated subject lacking `role`.
	pub fn forbidden(role: &str) -> Self {
		Self {
			status: 403,
			success: false,
			data: Vec::new(),
			message: Some("forbidden".into()),
			description: Some(format!("The `{role}` role is required.")),
			errors: Vec::new(),
		}
	}

	/// `401 Unauthorized` for a request without a bearer token.
	pub fn missing_token() -> Self {
		Self {
			status: 401,
			success: false,
			data: Vec::new(),
			message: Some("missing_token".into()),
			description: Some("An `Authorization: Bearer` header is required.".into()),
			errors: Vec::new(),
		}
	}
}
impl From<&Error> for ApiResponse {
	fn from(e: &Error) -> Self {
		Self::rejection(e.kind())
	}
}

fn into_string(value: serde_json::Value) -> Option<String> {
	match value {
		serde_json::Value::String(s) => Some(s),
		serde_json::Value::Null => None,
		other => Some(other.to_string()),
	}
}
