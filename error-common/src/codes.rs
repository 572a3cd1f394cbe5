// Stable error codes for MedGate responses

pub mod validation {
    pub const MISSING_REQUIRED_FIELD: &str = "VALIDATION_1001";
    pub const INVALID_INPUT: &str = "VALIDATION_1002";
    pub const DUPLICATE_EMAIL: &str = "VALIDATION_1003";
    pub const MALFORMED_BODY: &str = "VALIDATION_1004";
}

pub mod authentication {
    pub const INVALID_CREDENTIALS: &str = "AUTH_2001";
    pub const TOKEN_EXPIRED: &str = "AUTH_2002";
    pub const TOKEN_INVALID: &str = "AUTH_2003";
    pub const UNAUTHENTICATED: &str = "AUTH_2004";
}

pub mod resource {
    pub const NOT_FOUND: &str = "RESOURCE_3001";
}

pub mod internal {
    pub const INTERNAL_FAULT: &str = "INTERNAL_5001";
    pub const STORAGE_FAULT: &str = "INTERNAL_5002";
    pub const ROLLBACK_FAILED: &str = "INTERNAL_5003";
    pub const CONFIGURATION: &str = "INTERNAL_5004";
}
