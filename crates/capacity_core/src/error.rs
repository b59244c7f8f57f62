use thiserror::Error;

/// Closed catalog of user-facing messages. Each entry carries a static
/// code/message/param triple resolved when the error is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TechnicalMessage {
    InternalError,
    InvalidRequest,
    InvalidParameters,
    MissingRequiredParam,
    CapacityNameTooLong,
    CapacityDescriptionTooLong,
    CapacityCreated,
    CapacityAlreadyExists,
    TechnologiesNotFound,
    ErrorTechnologyAdapter,
    ListTechnologiesIsTooShort,
    ListTechnologiesIsTooLong,
    SomeCapabilitiesNotFound,
    AssignCapabilitiesOk,
    DeleteCapabilitiesOk,
    ErrorCreatingCapacity,
}

impl TechnicalMessage {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InternalError => "500",
            Self::InvalidRequest => "400",
            Self::InvalidParameters => "400",
            Self::MissingRequiredParam => "400",
            Self::CapacityNameTooLong => "400",
            Self::CapacityDescriptionTooLong => "400",
            Self::CapacityCreated => "201",
            Self::CapacityAlreadyExists => "400",
            Self::TechnologiesNotFound => "404",
            Self::ErrorTechnologyAdapter => "500",
            Self::ListTechnologiesIsTooShort => "404",
            Self::ListTechnologiesIsTooLong => "404",
            Self::SomeCapabilitiesNotFound => "404",
            Self::AssignCapabilitiesOk => "200",
            Self::DeleteCapabilitiesOk => "200",
            Self::ErrorCreatingCapacity => "500",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::InternalError => "Something went wrong, please try again",
            Self::InvalidRequest => "Bad Request, please verify data",
            Self::InvalidParameters => "Bad Parameters, please verify data",
            Self::MissingRequiredParam => "Missing required parameters, please verify data",
            Self::CapacityNameTooLong => "The capacity name is too long",
            Self::CapacityDescriptionTooLong => "The capacity description is too long",
            Self::CapacityCreated => "Capacity created successfully",
            Self::CapacityAlreadyExists => "The capacity already exists",
            Self::TechnologiesNotFound => {
                "Some of the technologies to be registered were not found, please verify data"
            }
            Self::ErrorTechnologyAdapter => {
                "Something went wrong with the technology adapter, please try again"
            }
            Self::ListTechnologiesIsTooShort => "The list of technologies is too short",
            Self::ListTechnologiesIsTooLong => "The list of technologies exceeds the allowed limit",
            Self::SomeCapabilitiesNotFound => "Some of the capabilities were not found",
            Self::AssignCapabilitiesOk => "Capabilities assigned successfully",
            Self::DeleteCapabilitiesOk => "Capabilities deleted successfully",
            Self::ErrorCreatingCapacity => "An error occurred while creating the capacity",
        }
    }

    /// Name of the offending parameter, when the message is about one.
    pub fn param(&self) -> &'static str {
        match self {
            Self::CapacityNameTooLong => "name",
            Self::CapacityDescriptionTooLong => "description",
            Self::ListTechnologiesIsTooShort | Self::ListTechnologiesIsTooLong => "technologies",
            _ => "",
        }
    }
}

impl std::fmt::Display for TechnicalMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Error)]
pub enum CapacityError {
    #[error("missing required param: {0}")]
    ParamRequiredMissing(TechnicalMessage),

    #[error("invalid param: {0}")]
    InvalidFormatParam(TechnicalMessage),

    #[error("already exists: {0}")]
    EntityAlreadyExists(TechnicalMessage),

    #[error("not found: {0}")]
    EntityNotFound(TechnicalMessage),

    #[error("technical: {message}")]
    Technical {
        message: TechnicalMessage,
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl CapacityError {
    pub fn technical(message: TechnicalMessage) -> Self {
        Self::Technical {
            message,
            source: None,
        }
    }

    pub fn technical_from(message: TechnicalMessage, source: impl Into<anyhow::Error>) -> Self {
        Self::Technical {
            message,
            source: Some(source.into()),
        }
    }

    /// The catalog entry backing this error.
    pub fn technical_message(&self) -> TechnicalMessage {
        match self {
            Self::ParamRequiredMissing(m)
            | Self::InvalidFormatParam(m)
            | Self::EntityAlreadyExists(m)
            | Self::EntityNotFound(m) => *m,
            Self::Technical { message, .. } => *message,
        }
    }

    /// Client-fault errors. Everything else is a downstream or internal fault.
    pub fn is_business(&self) -> bool {
        !matches!(self, Self::Technical { .. })
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::ParamRequiredMissing(_) => 400,
            Self::InvalidFormatParam(_) => 400,
            Self::EntityAlreadyExists(_) => 409,
            Self::EntityNotFound(_) => 404,
            Self::Technical { .. } => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_per_kind() {
        let missing = CapacityError::ParamRequiredMissing(TechnicalMessage::MissingRequiredParam);
        let invalid = CapacityError::InvalidFormatParam(TechnicalMessage::CapacityNameTooLong);
        let exists = CapacityError::EntityAlreadyExists(TechnicalMessage::CapacityAlreadyExists);
        let not_found = CapacityError::EntityNotFound(TechnicalMessage::SomeCapabilitiesNotFound);
        let technical = CapacityError::technical(TechnicalMessage::InternalError);

        assert_eq!(missing.http_status(), 400);
        assert_eq!(invalid.http_status(), 400);
        assert_eq!(exists.http_status(), 409);
        assert_eq!(not_found.http_status(), 404);
        assert_eq!(technical.http_status(), 500);
    }

    #[test]
    fn business_vs_technical() {
        assert!(CapacityError::EntityNotFound(TechnicalMessage::TechnologiesNotFound).is_business());
        assert!(!CapacityError::technical_from(
            TechnicalMessage::ErrorTechnologyAdapter,
            anyhow::anyhow!("connection reset")
        )
        .is_business());
    }

    #[test]
    fn technical_message_is_resolved_from_variant() {
        let e = CapacityError::InvalidFormatParam(TechnicalMessage::ListTechnologiesIsTooLong);
        assert_eq!(
            e.technical_message(),
            TechnicalMessage::ListTechnologiesIsTooLong
        );
        assert_eq!(e.technical_message().code(), "404");
        assert_eq!(e.technical_message().param(), "technologies");
    }

    #[test]
    fn display_uses_catalog_message() {
        let e = CapacityError::EntityAlreadyExists(TechnicalMessage::CapacityAlreadyExists);
        assert_eq!(e.to_string(), "already exists: The capacity already exists");

        let e = CapacityError::technical(TechnicalMessage::InternalError);
        assert_eq!(
            e.to_string(),
            "technical: Something went wrong, please try again"
        );
    }
}
