//! Minimal AWS error classification
//!
//! Destroy calls race against other deleters and against AWS's own cascades
//! (terminating an instance detaches its ENIs, deleting a role can take its
//! profile along). A "not found" response therefore means the work is done,
//! not that it failed.

use anyhow::Result;
use tracing::debug;

/// Error codes AWS services use for missing resources. Matched as
/// substrings of the debug representation, which covers the per-service
/// variants (`InvalidVpcID.NotFound`, `NoSuchEntity`, ...) without
/// enumerating every operation error type.
const NOT_FOUND_MARKERS: &[&str] = &[
    "NotFound",
    "NoSuchEntity",
    "NoSuchHostedZone",
    "FileSystemNotFound",
    "MountTargetNotFound",
];

pub(crate) fn is_not_found(error: &anyhow::Error) -> bool {
    let debug_str = format!("{error:?}");
    NOT_FOUND_MARKERS.iter().any(|m| debug_str.contains(m))
}

/// Treat a "not found" destroy failure as success.
pub(crate) fn ignore_not_found(
    result: Result<()>,
    resource_type: &str,
    id: &str,
) -> Result<()> {
    match result {
        Err(e) if is_not_found(&e) => {
            debug!(resource_type, id, "Already deleted");
            Ok(())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn not_found_variants_are_recognized() {
        for message in [
            "InvalidVpcID.NotFound: vpc-123 does not exist",
            "NoSuchEntity: role gone",
            "NoSuchHostedZone: Z123",
            "FileSystemNotFound: fs-1",
        ] {
            assert!(is_not_found(&anyhow!("{message}")), "missed: {message}");
        }
        assert!(!is_not_found(&anyhow!("DependencyViolation: in use")));
    }

    #[test]
    fn ignore_not_found_passes_other_errors_through() {
        assert!(ignore_not_found(Ok(()), "aws_vpc", "vpc-1").is_ok());
        assert!(
            ignore_not_found(Err(anyhow!("NoSuchEntity")), "aws_iam_role", "r").is_ok()
        );
        assert!(
            ignore_not_found(Err(anyhow!("AccessDenied")), "aws_vpc", "vpc-1").is_err()
        );
    }
}
