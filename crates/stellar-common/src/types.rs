//! Core enums for the generation pipeline.

use serde::{Deserialize, Serialize};

/// Kind of media artifact a resource represents.
///
/// The set is closed on purpose: the dispatcher matches exhaustively over
/// it, so an unhandled kind is a compile error rather than a silent default
/// branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    AvatarImage,
    PlanetImage,
    PlanetVideo,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AvatarImage => write!(f, "avatar_image"),
            Self::PlanetImage => write!(f, "planet_image"),
            Self::PlanetVideo => write!(f, "planet_video"),
        }
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "avatar_image" => Ok(Self::AvatarImage),
            "planet_image" => Ok(Self::PlanetImage),
            "planet_video" => Ok(Self::PlanetVideo),
            _ => Err(format!("Invalid resource kind: {}", s)),
        }
    }
}

/// Lifecycle status of a resource.
///
/// `pending` resources await (re-)dispatch, `generating` resources are owned
/// by exactly one in-flight generation attempt, and `approved` resources
/// carry a finished artifact. Failed attempts revert to `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    Pending,
    Generating,
    Approved,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Generating => write!(f, "generating"),
            Self::Approved => write!(f, "approved"),
        }
    }
}

impl std::str::FromStr for ResourceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "generating" => Ok(Self::Generating),
            "approved" => Ok(Self::Approved),
            _ => Err(format!("Invalid resource status: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            ResourceKind::AvatarImage,
            ResourceKind::PlanetImage,
            ResourceKind::PlanetVideo,
        ] {
            let parsed: ResourceKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            ResourceStatus::Pending,
            ResourceStatus::Generating,
            ResourceStatus::Approved,
        ] {
            let parsed: ResourceStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_invalid_strings_rejected() {
        assert!("hologram".parse::<ResourceKind>().is_err());
        assert!("failed".parse::<ResourceStatus>().is_err());
    }
}
