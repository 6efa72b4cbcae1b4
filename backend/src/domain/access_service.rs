use log::{info, warn};
use shared::{AccessLevel, Capability, Role};
use std::collections::BTreeMap;

use crate::config::Credential;
use super::errors::AccessError;

/// Service for checking sign-in credentials against the configured table.
///
/// The student manager never consults this; presentation layers use the
/// resulting [`Session`] to decide which controls to offer.
#[derive(Clone, Default)]
pub struct AccessService {
    credentials: BTreeMap<Role, Credential>,
}

/// An authenticated user and the access level they were granted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub role: Role,
    pub access_level: AccessLevel,
}

impl Session {
    pub fn can(&self, capability: Capability) -> bool {
        self.access_level.allows(capability)
    }

    /// Fail with `Forbidden` unless this session allows `capability`
    pub fn require(&self, capability: Capability, action: &str) -> Result<(), AccessError> {
        if self.can(capability) {
            Ok(())
        } else {
            warn!("{} ({}) attempted to {}", self.username, self.role, action);
            Err(AccessError::Forbidden {
                role: self.role,
                action: action.to_string(),
            })
        }
    }
}

impl AccessService {
    pub fn new(credentials: BTreeMap<Role, Credential>) -> Self {
        if credentials.is_empty() {
            warn!("No credentials configured; every sign-in will be rejected");
        }
        Self { credentials }
    }

    /// Validate a username/secret pair for the selected role
    pub fn login(
        &self,
        username: &str,
        secret: &str,
        selected: Role,
    ) -> Result<Session, AccessError> {
        let username = username.trim();
        info!("Sign-in attempt for {} as {}", username, selected);

        let (role, _) = self
            .credentials
            .iter()
            .find(|(_, credential)| credential.username == username && credential.secret == secret)
            .ok_or_else(|| {
                warn!("Rejected sign-in for {}", username);
                AccessError::InvalidCredentials
            })?;

        if *role != selected {
            warn!("{} selected role {} which does not match their account", username, selected);
            return Err(AccessError::RoleMismatch { selected });
        }

        info!("{} signed in as {}", username, role);
        Ok(Session {
            username: username.to_string(),
            role: *role,
            access_level: role.access_level(),
        })
    }
}
